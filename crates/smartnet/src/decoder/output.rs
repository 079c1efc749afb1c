//! Decoder output: trunking events and status snapshots

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use super::registry::{Mode, Registry, TGID_DEFAULT_PRIO};
use super::session::Session;
use super::sites::SiteTables;
use crate::bandplan::freq_key;
use crate::osw::CallOptions;

/// Type of trunking event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrunkEventKind {
    /// A call in progress was re-announced
    ///
    /// Updates are sent periodically for the whole duration of
    /// a call. They carry no source radio ID.
    Update,

    /// A new call was granted a voice channel
    Grant,
}

/// A voice channel assignment
///
/// Emitted for every grant and every update decoded from the
/// control channel. A recorder would use the `frequency_hz`
/// and `talkgroup_id` to decide what to record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrunkEvent {
    /// Grant or update
    pub kind: TrunkEventKind,

    /// Voice channel frequency (Hz)
    pub frequency_hz: f64,

    /// Talkgroup number, with the status bits shifted out
    pub talkgroup_id: u32,

    /// Calling radio, or zero if unknown
    pub source_radio_id: u32,

    /// Encrypted call
    pub encrypted: bool,

    /// Emergency call
    pub emergency: bool,

    /// Owning system index
    pub system_number: u32,

    /// System ID, or zero if not yet known
    pub system_id: u16,

    /// Site ID, or zero if not yet known
    pub site_id: u16,

    /// TDMA slot; always zero
    pub tdma_slot: u8,

    /// Phase 2 TDMA; always false
    pub phase2_tdma: bool,

    /// Full duplex; always false
    pub duplex: bool,

    /// Call priority
    pub priority: u8,
}

impl TrunkEvent {
    /// Build an event for talkgroup address `tgid` on `freq` MHz
    pub(crate) fn new(
        kind: TrunkEventKind,
        freq: f64,
        tgid: u16,
        srcaddr: u16,
        system_number: u32,
        session: &Session,
    ) -> Self {
        let opts = CallOptions::from_tgid(tgid);
        Self {
            kind,
            frequency_hz: freq_key(freq) as f64,
            talkgroup_id: (tgid >> 4) as u32,
            source_radio_id: srcaddr as u32,
            encrypted: opts.encrypted(),
            emergency: opts.emergency(),
            system_number,
            system_id: session.system_id(),
            site_id: session.site_id(),
            tdma_slot: 0,
            phase2_tdma: false,
            duplex: false,
            priority: TGID_DEFAULT_PRIO,
        }
    }
}

impl fmt::Display for TrunkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            TrunkEventKind::Update => "update",
            TrunkEventKind::Grant => "grant",
        };
        write!(
            f,
            "{} tg {} on {:.5} MHz",
            kind,
            self.talkgroup_id,
            self.frequency_hz / 1.0e6
        )?;
        if self.source_radio_id != 0 {
            write!(f, " from {}", self.source_radio_id)?;
        }
        if self.encrypted {
            write!(f, " [enc]")?;
        }
        if self.emergency {
            write!(f, " [emergency]")?;
        }
        Ok(())
    }
}

impl Serialize for Mode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i8(self.as_code())
    }
}

/// Voice frequency entry of a [`StatusSnapshot`]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrequencyStatus {
    /// Talkgroup address, status bits masked off
    pub tgid: u16,

    /// Voice mode: -1 unknown, 0 analog, 1 digital
    pub mode: Mode,

    /// Number of grants and updates
    pub count: u64,

    /// Time of last grant or update (s)
    pub time: f64,
}

/// Adjacent site entry of a [`StatusSnapshot`]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SiteStatus {
    /// Site ID
    pub site: u16,

    /// Control channel receive frequency (MHz)
    pub rx_freq: f64,

    /// Control channel transmit frequency (MHz)
    pub tx_freq: f64,

    /// Time last seen (s)
    pub time: f64,
}

/// Alternate control channel entry of a [`StatusSnapshot`]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ControlChannelStatus {
    /// Receive frequency (MHz)
    pub rx_freq: f64,

    /// Transmit frequency (MHz)
    pub tx_freq: f64,

    /// Time last seen (s)
    pub time: f64,
}

/// Point-in-time decoder status
///
/// Serializes to JSON of the form
///
/// ```txt
/// {"type":"smartnet","system":0,"top_line":"Smartnet System ID 0 OSW count 5",
///  "frequencies":{"857412500":{"tgid":9312,"mode":0,"count":1,"time":1.0}},
///  "adjacent_sites":[],"alternate_cc_freqs":[]}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Always `smartnet`
    #[serde(rename = "type")]
    pub kind: &'static str,

    /// Owning system index
    pub system: u32,

    /// Human-readable summary
    pub top_line: String,

    /// Voice frequencies, keyed by frequency in Hz
    pub frequencies: BTreeMap<String, FrequencyStatus>,

    /// Adjacent sites, by site ID
    pub adjacent_sites: Vec<SiteStatus>,

    /// Alternate control channels, by frequency
    pub alternate_cc_freqs: Vec<ControlChannelStatus>,
}

impl StatusSnapshot {
    pub(crate) fn new(
        system_number: u32,
        session: &Session,
        registry: &Registry,
        sites: &SiteTables,
    ) -> Self {
        let frequencies = registry
            .voice_frequencies()
            .map(|vf| {
                (
                    vf.frequency.to_string(),
                    FrequencyStatus {
                        tgid: vf.tgid,
                        mode: vf.mode,
                        count: vf.counter,
                        time: vf.time,
                    },
                )
            })
            .collect();

        let adjacent_sites = sites
            .adjacent_sites()
            .map(|(site, entry)| SiteStatus {
                site,
                rx_freq: entry.data.rx_freq,
                tx_freq: entry.data.tx_freq,
                time: entry.time,
            })
            .collect();

        let alternate_cc_freqs = sites
            .alternate_cc_freqs()
            .map(|(_, entry)| ControlChannelStatus {
                rx_freq: entry.data.rx_freq,
                tx_freq: entry.data.tx_freq,
                time: entry.time,
            })
            .collect();

        Self {
            kind: "smartnet",
            system: system_number,
            top_line: session.top_line(),
            frequencies,
            adjacent_sites,
            alternate_cc_freqs,
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
