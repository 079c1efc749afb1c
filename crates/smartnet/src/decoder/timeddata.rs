/// Data stamped with the time it was last seen
#[derive(Clone, Debug, PartialEq)]
pub struct TimedData<D> {
    /// Data
    pub data: D,

    /// Time of last sighting, in decoder seconds
    pub time: f64,
}

impl<D> TimedData<D>
where
    D: Clone + PartialEq,
{
    /// Store `data` seen at `time`
    pub fn seen_at(data: D, time: f64) -> Self {
        TimedData { data, time }
    }

    /// Check for expiration
    ///
    /// Data expires once more than `ttl` seconds have elapsed
    /// since it was last seen.
    pub fn is_expired_at(&self, now: f64, ttl: f64) -> bool {
        now > self.time + ttl
    }
}

impl<D> AsRef<D> for TimedData<D>
where
    D: Clone + PartialEq,
{
    fn as_ref(&self) -> &D {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let td = TimedData::seen_at(7u8, 10.0);
        assert!(!td.is_expired_at(10.0, 5.0));
        assert!(!td.is_expired_at(15.0, 5.0));
        assert!(td.is_expired_at(15.001, 5.0));
        assert_eq!(&7, td.as_ref());
    }
}
