//! Adjacent sites and alternate control channels

use std::collections::BTreeMap;

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use super::timeddata::TimedData;
use crate::bandplan::freq_key;

/// Control channel frequencies of a site
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlChannel {
    /// Receive frequency (MHz)
    pub rx_freq: f64,

    /// Transmit frequency (MHz), or `0.0` if unknown
    pub tx_freq: f64,
}

/// Neighboring sites and alternate control channels
///
/// Multi-site systems periodically announce the control
/// channels of their neighbors and the alternate control
/// channels of the current site. Entries which are not
/// re-announced expire.
#[derive(Clone, Debug, Default)]
pub struct SiteTables {
    adjacent: BTreeMap<u16, TimedData<ControlChannel>>,
    alternate: BTreeMap<u64, TimedData<ControlChannel>>,
}

impl SiteTables {
    /// New, empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an adjacent site announced at time `ts`
    pub fn add_adjacent_site(&mut self, ts: f64, site: u16, cc: ControlChannel) {
        if !self.adjacent.contains_key(&site) {
            debug!("sites: adjacent site {} at {:.5} MHz", site, cc.rx_freq);
        }
        self.adjacent.insert(site, TimedData::seen_at(cc, ts));
    }

    /// Record an alternate control channel announced at time `ts`
    pub fn add_alternate_cc_freq(&mut self, ts: f64, cc: ControlChannel) {
        let key = freq_key(cc.rx_freq);
        if !self.alternate.contains_key(&key) {
            debug!("sites: alternate control channel {:.5} MHz", cc.rx_freq);
        }
        self.alternate.insert(key, TimedData::seen_at(cc, ts));
    }

    /// Remove adjacent sites not seen for more than `ttl` seconds
    ///
    /// Returns the number of entries removed.
    pub fn expire_adjacent_sites(&mut self, now: f64, ttl: f64) -> usize {
        let before = self.adjacent.len();
        self.adjacent.retain(|_, entry| !entry.is_expired_at(now, ttl));
        before - self.adjacent.len()
    }

    /// Remove alternate control channels not seen for more than `ttl` seconds
    ///
    /// Returns the number of entries removed.
    pub fn expire_alternate_cc_freqs(&mut self, now: f64, ttl: f64) -> usize {
        let before = self.alternate.len();
        self.alternate.retain(|_, entry| !entry.is_expired_at(now, ttl));
        before - self.alternate.len()
    }

    /// Adjacent sites, by site ID
    pub fn adjacent_sites(&self) -> impl Iterator<Item = (u16, &TimedData<ControlChannel>)> {
        self.adjacent.iter().map(|(site, entry)| (*site, entry))
    }

    /// Alternate control channels, by receive frequency (Hz)
    pub fn alternate_cc_freqs(&self) -> impl Iterator<Item = (u64, &TimedData<ControlChannel>)> {
        self.alternate.iter().map(|(hz, entry)| (*hz, entry))
    }

    pub(crate) fn clear(&mut self) {
        self.adjacent.clear();
        self.alternate.clear();
    }
}
