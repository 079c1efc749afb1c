//! System and site identity

#[cfg(not(test))]
use log::info;

#[cfg(test)]
use std::println as info;

use crate::bandplan::freq_key;

/// What we know about the system we are listening to
///
/// The control channel announces its system ID, site ID, and
/// frequency only occasionally, interleaved with voice grants.
/// These values start out as zero and are filled in as the
/// announcements are decoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    system_id: u16,
    site_id: u16,
    control_channel_hz: u64,
    osw_count: u64,
    last_osw: f64,
}

impl Session {
    /// New, empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// System ID, or zero if not yet known
    pub fn system_id(&self) -> u16 {
        self.system_id
    }

    /// Site ID, or zero if not yet known
    pub fn site_id(&self) -> u16 {
        self.site_id
    }

    /// Control channel receive frequency (Hz), or zero if not yet known
    pub fn control_channel_hz(&self) -> u64 {
        self.control_channel_hz
    }

    /// Lifetime count of OSWs received
    pub fn osw_count(&self) -> u64 {
        self.osw_count
    }

    /// Time of the most recent OSW (s)
    pub fn last_osw(&self) -> f64 {
        self.last_osw
    }

    /// Count an OSW received at time `ts`
    pub(crate) fn record_osw(&mut self, ts: f64) {
        self.osw_count = self.osw_count.wrapping_add(1);
        self.last_osw = ts;
    }

    pub(crate) fn set_system_id(&mut self, system_id: u16) {
        if system_id != self.system_id {
            info!("session: system id {:#06x}", system_id);
        }
        self.system_id = system_id;
    }

    pub(crate) fn set_site_id(&mut self, site_id: u16) {
        if site_id != self.site_id {
            info!("session: site id {}", site_id);
        }
        self.site_id = site_id;
    }

    /// Set the control channel frequency, given in MHz
    pub(crate) fn set_control_channel(&mut self, mhz: f64) {
        let hz = freq_key(mhz);
        if hz != self.control_channel_hz {
            info!("session: control channel {:.5} MHz", mhz);
        }
        self.control_channel_hz = hz;
    }

    /// Status summary line
    ///
    /// ```txt
    /// Smartnet System ID 9876 Site 3 OSW count 1234
    /// ```
    ///
    /// The site is omitted until it is known. The system ID is
    /// printed in decimal.
    pub fn top_line(&self) -> String {
        let mut out = format!("Smartnet System ID {}", self.system_id);
        if self.site_id != 0 {
            out.push_str(&format!(" Site {}", self.site_id));
        }
        out.push_str(&format!(" OSW count {}", self.osw_count));
        out
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
