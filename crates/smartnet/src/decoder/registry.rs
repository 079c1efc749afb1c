//! Talkgroup, voice frequency, and patch state
//!
//! The decoder tracks which talkgroup is active on each voice
//! frequency, the last known status of every talkgroup, and the
//! set of active patches. Patches link a *primary* talkgroup to
//! one or more *secondary* talkgroups. While a patch is active,
//! every update to the primary is mirrored onto its secondaries.
//!
//! Talkgroups and patches are shared with outside readers through
//! a [`RegistryHandle`]. Each map has its own lock. The voice
//! frequency map has a single owner, the decoder, and is not
//! locked.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[cfg(not(test))]
use log::{debug, info};

#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as info;

use super::timeddata::TimedData;
use crate::bandplan::freq_key;
use crate::osw::{base_tgid, tgid_status};

/// Default talkgroup priority
pub const TGID_DEFAULT_PRIO: u8 = 3;

/// Voice channel mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Not yet known
    #[default]
    Unknown,

    /// Analog FM voice
    Analog,

    /// Digital voice
    Digital,
}

impl Mode {
    /// Integer code: `-1` unknown, `0` analog, `1` digital
    pub fn as_code(&self) -> i8 {
        match self {
            Mode::Unknown => -1,
            Mode::Analog => 0,
            Mode::Digital => 1,
        }
    }
}

/// Last known state of a talkgroup
#[derive(Clone, Debug, PartialEq)]
pub struct TalkgroupInfo {
    /// Base talkgroup ID, status bits masked off
    pub tgid: u16,

    /// Priority
    pub priority: u8,

    /// Most recent source radio ID
    pub srcaddr: u32,

    /// Time of last update (s)
    pub time: f64,

    /// Updates older than this time are rejected (s)
    pub release_time: f64,

    /// Voice mode
    pub mode: Mode,

    /// Status bits from the most recent update
    pub status: u8,

    /// Most recent voice frequency (Hz)
    pub frequency: u64,
}

impl TalkgroupInfo {
    fn new(tgid: u16) -> Self {
        Self {
            tgid,
            priority: TGID_DEFAULT_PRIO,
            srcaddr: 0,
            time: 0.0,
            release_time: 0.0,
            mode: Mode::Unknown,
            status: 0,
            frequency: 0,
        }
    }
}

/// State of one voice frequency
#[derive(Clone, Debug, PartialEq)]
pub struct VoiceFrequency {
    /// Frequency (Hz)
    pub frequency: u64,

    /// Base talkgroup ID last granted or updated here
    pub tgid: u16,

    /// Voice mode
    pub mode: Mode,

    /// Number of grants and updates
    pub counter: u64,

    /// Time of last grant or update (s)
    pub time: f64,

    /// Status bits of the last grant or update
    pub flags: u8,
}

/// One secondary talkgroup of a patch
///
/// The patch mode is the low nibble of the announcing OSW.
pub type PatchEntry = TimedData<u8>;

type TalkgroupMap = BTreeMap<u16, TalkgroupInfo>;
type PatchMap = BTreeMap<u16, BTreeMap<u16, PatchEntry>>;

/// Shared handle to the talkgroup and patch tables
///
/// Handles are cheap to clone and may be sent to other threads
/// for reporting. Writes made through any handle are visible to
/// all of them.
#[derive(Clone, Debug, Default)]
pub struct RegistryHandle {
    talkgroups: Arc<Mutex<TalkgroupMap>>,
    patches: Arc<Mutex<PatchMap>>,
}

impl RegistryHandle {
    /// Snapshot of one talkgroup, by any talkgroup address
    pub fn talkgroup(&self, tgid: u16) -> Option<TalkgroupInfo> {
        self.lock_talkgroups().get(&base_tgid(tgid)).cloned()
    }

    /// Snapshot of every known talkgroup
    pub fn talkgroups(&self) -> Vec<TalkgroupInfo> {
        self.lock_talkgroups().values().cloned().collect()
    }

    /// Suppress updates to a talkgroup until `release_time`
    ///
    /// Updates timestamped before `release_time` are rejected.
    /// The next accepted update clears the release time.
    pub fn set_release_time(&self, tgid: u16, release_time: f64) {
        let base = base_tgid(tgid);
        self.lock_talkgroups()
            .entry(base)
            .or_insert_with(|| TalkgroupInfo::new(base))
            .release_time = release_time;
    }

    /// Update one talkgroup
    ///
    /// Splits `tgid` into its base ID and status bits and applies
    /// the update. Unknown talkgroups are created with default
    /// values. The source address and mode are only changed if
    /// provided.
    ///
    /// Returns `false` without changing anything if `ts` is before
    /// the talkgroup's release time.
    pub fn update_talkgroup(
        &self,
        ts: f64,
        frequency: u64,
        tgid: u16,
        srcaddr: Option<u32>,
        mode: Option<Mode>,
    ) -> bool {
        let base = base_tgid(tgid);
        let mut talkgroups = self.lock_talkgroups();
        let info = talkgroups
            .entry(base)
            .or_insert_with(|| TalkgroupInfo::new(base));

        if ts < info.release_time {
            debug!(
                "registry: tgid {:#06x} held until {:.3}; update at {:.3} rejected",
                base, info.release_time, ts
            );
            return false;
        }

        info.time = ts;
        info.release_time = 0.0;
        info.frequency = frequency;
        info.status = tgid_status(tgid);
        if let Some(srcaddr) = srcaddr {
            info.srcaddr = srcaddr;
        }
        if let Some(mode) = mode {
            info.mode = mode;
        }
        true
    }

    /// Patch `sub_tgid` onto `tgid`
    ///
    /// Both IDs are reduced to their base IDs. Re-announcing an
    /// existing patch renews it.
    pub fn add_patch(&self, ts: f64, tgid: u16, sub_tgid: u16, mode: u8) {
        let (tgid, sub_tgid) = (base_tgid(tgid), base_tgid(sub_tgid));
        let mut patches = self.lock_patches();
        let subs = patches.entry(tgid).or_default();
        if !subs.contains_key(&sub_tgid) {
            info!(
                "registry: patch {:#06x} → {:#06x} (mode {})",
                tgid, sub_tgid, mode
            );
        }
        subs.insert(sub_tgid, TimedData::seen_at(mode, ts));
    }

    /// Remove every patch with primary `tgid`
    pub fn delete_patches(&self, tgid: u16) {
        self.lock_patches().remove(&base_tgid(tgid));
    }

    /// Secondary talkgroups currently patched to `tgid`
    pub fn patched_to(&self, tgid: u16) -> Vec<u16> {
        self.lock_patches()
            .get(&base_tgid(tgid))
            .map(|subs| subs.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Snapshot of every patch, as (primary, secondary, entry)
    pub fn patches(&self) -> Vec<(u16, u16, PatchEntry)> {
        self.lock_patches()
            .iter()
            .flat_map(|(tgid, subs)| {
                subs.iter()
                    .map(move |(sub, entry)| (*tgid, *sub, entry.clone()))
            })
            .collect()
    }

    /// Remove patch entries not renewed for more than `ttl` seconds
    ///
    /// Primaries with no remaining secondaries are removed.
    /// Returns the number of secondary entries removed.
    pub fn expire_patches(&self, now: f64, ttl: f64) -> usize {
        let mut removed = 0;
        self.lock_patches().retain(|tgid, subs| {
            let before = subs.len();
            subs.retain(|_, entry| !entry.is_expired_at(now, ttl));
            removed += before - subs.len();
            if subs.is_empty() {
                debug!("registry: patch {:#06x} expired", tgid);
            }
            !subs.is_empty()
        });
        removed
    }

    /// Talkgroup expiry sweep
    ///
    /// Talkgroup entries are retained for the life of the decoder.
    /// This sweep removes nothing and returns zero.
    pub fn expire_talkgroups(&self, _now: f64) -> usize {
        let _talkgroups = self.lock_talkgroups();
        0
    }

    pub(crate) fn clear(&self) {
        self.lock_talkgroups().clear();
        self.lock_patches().clear();
    }

    fn lock_talkgroups(&self) -> MutexGuard<'_, TalkgroupMap> {
        self.talkgroups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_patches(&self) -> MutexGuard<'_, PatchMap> {
        self.patches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Voice frequencies plus the shared talkgroup tables
///
/// Cloning a `Registry` copies every table. The clone gets a new
/// [`RegistryHandle`] and shares nothing with the original.
#[derive(Debug, Default)]
pub struct Registry {
    voice: BTreeMap<u64, VoiceFrequency>,
    shared: RegistryHandle,
}

impl Clone for Registry {
    fn clone(&self) -> Self {
        let talkgroups = self.shared.lock_talkgroups().clone();
        let patches = self.shared.lock_patches().clone();
        Self {
            voice: self.voice.clone(),
            shared: RegistryHandle {
                talkgroups: Arc::new(Mutex::new(talkgroups)),
                patches: Arc::new(Mutex::new(patches)),
            },
        }
    }
}

impl Registry {
    /// New, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the talkgroup and patch tables
    pub fn handle(&self) -> &RegistryHandle {
        &self.shared
    }

    /// Record a grant or update on a voice frequency
    ///
    /// `freq` is in MHz. A `freq` of zero is an unresolved channel
    /// and is ignored. Otherwise, the voice frequency entry is
    /// created or updated and the talkgroup (plus any patched
    /// talkgroups) is updated.
    pub fn update_voice_frequency(
        &mut self,
        ts: f64,
        freq: f64,
        tgid: u16,
        srcaddr: Option<u32>,
        mode: Option<Mode>,
    ) {
        if freq == 0.0 {
            return;
        }

        let frequency = freq_key(freq);
        self.update_talkgroups(ts, frequency, tgid, srcaddr, mode);

        let vf = self
            .voice
            .entry(frequency)
            .or_insert_with(|| VoiceFrequency {
                frequency,
                tgid: 0,
                mode: Mode::Unknown,
                counter: 0,
                time: 0.0,
                flags: 0,
            });
        if let Some(mode) = mode {
            vf.mode = mode;
        }
        vf.tgid = base_tgid(tgid);
        vf.flags = tgid_status(tgid);
        vf.counter += 1;
        vf.time = ts;
    }

    /// Update a talkgroup and every talkgroup patched to it
    pub fn update_talkgroups(
        &self,
        ts: f64,
        frequency: u64,
        tgid: u16,
        srcaddr: Option<u32>,
        mode: Option<Mode>,
    ) {
        self.shared
            .update_talkgroup(ts, frequency, tgid, srcaddr, mode);

        for sub_tgid in self.shared.patched_to(tgid) {
            self.shared
                .update_talkgroup(ts, frequency, sub_tgid, srcaddr, mode);
        }
    }

    /// State of one voice frequency (Hz)
    pub fn voice_frequency(&self, hz: u64) -> Option<&VoiceFrequency> {
        self.voice.get(&hz)
    }

    /// Every voice frequency, in ascending order
    pub fn voice_frequencies(&self) -> impl Iterator<Item = &VoiceFrequency> {
        self.voice.values()
    }

    pub(crate) fn clear(&mut self) {
        self.voice.clear();
        self.shared.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_talkgroup_partial_update() {
        let reg = RegistryHandle::default();
        assert!(reg.talkgroup(0x2460).is_none());

        assert!(reg.update_talkgroup(1.0, 851_012_500, 0x2462, Some(1234), Some(Mode::Analog)));
        let tg = reg.talkgroup(0x2460).expect("talkgroup created");
        assert_eq!(0x2460, tg.tgid);
        assert_eq!(TGID_DEFAULT_PRIO, tg.priority);
        assert_eq!(2, tg.status);
        assert_eq!(1234, tg.srcaddr);
        assert_eq!(Mode::Analog, tg.mode);

        // absent source and mode are left alone
        assert!(reg.update_talkgroup(2.0, 852_000_000, 0x2460, None, None));
        let tg = reg.talkgroup(0x246f).expect("same base id");
        assert_eq!(1234, tg.srcaddr);
        assert_eq!(Mode::Analog, tg.mode);
        assert_eq!(0, tg.status);
        assert_eq!(852_000_000, tg.frequency);
        assert_eq!(2.0, tg.time);
    }

    #[test]
    fn test_release_time_rejects() {
        let reg = RegistryHandle::default();
        assert!(reg.update_talkgroup(1.0, 851_012_500, 0x2460, Some(10), Some(Mode::Digital)));
        reg.set_release_time(0x2460, 5.0);
        let before = reg.talkgroup(0x2460).unwrap();

        assert!(!reg.update_talkgroup(4.9, 866_000_000, 0x2468, Some(99), Some(Mode::Analog)));
        assert_eq!(before, reg.talkgroup(0x2460).unwrap());

        // at or after the release time, accepted and cleared
        assert!(reg.update_talkgroup(5.0, 866_000_000, 0x2468, Some(99), None));
        let tg = reg.talkgroup(0x2460).unwrap();
        assert_eq!(0.0, tg.release_time);
        assert_eq!(866_000_000, tg.frequency);
        assert_eq!(99, tg.srcaddr);
        assert_eq!(Mode::Digital, tg.mode);
    }

    #[test]
    fn test_voice_frequency_counter() {
        let mut reg = Registry::new();
        reg.update_voice_frequency(1.0, 0.0, 0x2460, None, None);
        assert_eq!(0, reg.voice_frequencies().count());

        reg.update_voice_frequency(1.0, 857.4125, 0x2468, Some(7), Some(Mode::Digital));
        reg.update_voice_frequency(2.0, 857.4125, 0x2460, None, None);
        let vf = reg.voice_frequency(857_412_500).expect("created");
        assert_eq!(2, vf.counter);
        assert_eq!(2.0, vf.time);
        assert_eq!(0x2460, vf.tgid);
        assert_eq!(0, vf.flags);
        assert_eq!(Mode::Digital, vf.mode);
    }

    #[test]
    fn test_patch_fan_out_and_expiry() {
        let mut reg = Registry::new();
        reg.handle().add_patch(0.0, 0x0640, 0x0740, 4);
        reg.handle().add_patch(0.0, 0x0640, 0x0750, 4);
        assert_eq!(vec![0x0740, 0x0750], reg.handle().patched_to(0x0643));

        reg.update_voice_frequency(1.0, 851.5125, 0x0643, Some(55), Some(Mode::Analog));
        for tgid in [0x0640u16, 0x0740, 0x0750] {
            let tg = reg.handle().talkgroup(tgid).expect("updated");
            assert_eq!(851_512_500, tg.frequency);
            assert_eq!(1.0, tg.time);
            assert_eq!(55, tg.srcaddr);
        }

        // renew only one secondary
        reg.handle().add_patch(4.0, 0x0640, 0x0740, 4);
        assert_eq!(1, reg.handle().expire_patches(5.5, 5.0));
        assert_eq!(vec![0x0740], reg.handle().patched_to(0x0640));
        assert_eq!(1, reg.handle().patches().len());

        assert_eq!(1, reg.handle().expire_patches(9.5, 5.0));
        assert!(reg.handle().patched_to(0x0640).is_empty());
        assert!(reg.handle().patches().is_empty());

        // without a patch, no fan-out
        reg.update_voice_frequency(10.0, 852.0, 0x0640, None, None);
        assert_eq!(1.0, reg.handle().talkgroup(0x0740).unwrap().time);
    }

    #[test]
    fn test_delete_patches_and_sweep() {
        let reg = RegistryHandle::default();
        reg.add_patch(0.0, 0x0640, 0x0740, 0);
        reg.delete_patches(0x0641);
        assert!(reg.patches().is_empty());

        reg.update_talkgroup(0.0, 1, 0x0640, None, None);
        assert_eq!(0, reg.expire_talkgroups(1.0e9));
        assert_eq!(1, reg.talkgroups().len());
    }

    #[test]
    fn test_handles_share_state() {
        let reg = Registry::new();
        let handle = reg.handle().clone();
        let writer = std::thread::spawn(move || {
            handle.update_talkgroup(3.0, 1, 0x1230, None, None);
        });
        writer.join().expect("thread panicked");
        assert_eq!(3.0, reg.handle().talkgroup(0x1230).unwrap().time);
    }
}
