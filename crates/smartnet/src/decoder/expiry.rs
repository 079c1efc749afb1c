//! Periodic expiry of stale entries

/// Default interval between expiry sweeps (s)
pub const EXPIRY_INTERVAL: f64 = 1.0;

/// Default patch lifetime without renewal (s)
pub const PATCH_TTL: f64 = 5.0;

/// Default adjacent site lifetime without renewal (s)
pub const ADJACENT_SITE_TTL: f64 = 60.0;

/// Default alternate control channel lifetime without renewal (s)
pub const ALTERNATE_CC_TTL: f64 = 60.0;

/// Entry lifetimes, in seconds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpiryPolicy {
    /// Patch lifetime (s)
    pub patch_ttl: f64,

    /// Adjacent site lifetime (s)
    pub adjacent_site_ttl: f64,

    /// Alternate control channel lifetime (s)
    pub alternate_cc_ttl: f64,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            patch_ttl: PATCH_TTL,
            adjacent_site_ttl: ADJACENT_SITE_TTL,
            alternate_cc_ttl: ALTERNATE_CC_TTL,
        }
    }
}

/// Number of entries removed by one sweep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Patch secondaries removed
    pub patches: usize,

    /// Adjacent sites removed
    pub adjacent_sites: usize,

    /// Alternate control channels removed
    pub alternate_cc_freqs: usize,

    /// Talkgroups removed
    pub talkgroups: usize,
}

impl SweepReport {
    /// Total entries removed
    pub fn total(&self) -> usize {
        self.patches + self.adjacent_sites + self.alternate_cc_freqs + self.talkgroups
    }
}

/// Rate limiter for expiry sweeps
///
/// The scheduler keeps no clock of its own. The caller supplies
/// the current time, and a sweep is due once at least
/// `interval` seconds have passed since the last one.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpiryScheduler {
    interval: f64,
    last_check: Option<f64>,
}

impl ExpiryScheduler {
    /// New scheduler which runs at most once per `interval` seconds
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            last_check: None,
        }
    }

    /// Sweep interval (s)
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Check if a sweep is due at time `now`
    ///
    /// Returns true, and records `now` as the time of the last
    /// sweep, if a sweep should run. The first call arms the
    /// scheduler and returns false.
    pub fn is_due(&mut self, now: f64) -> bool {
        match self.last_check {
            None => {
                self.last_check = Some(now);
                false
            }
            Some(last) if now - last >= self.interval => {
                self.last_check = Some(now);
                true
            }
            Some(_) => false,
        }
    }

    /// Forget the time of the last sweep
    pub fn reset(&mut self) {
        self.last_check = None;
    }
}

impl Default for ExpiryScheduler {
    fn default() -> Self {
        Self::new(EXPIRY_INTERVAL)
    }
}
