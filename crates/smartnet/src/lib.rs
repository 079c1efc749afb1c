//! # smartnet: SmartNet/SmartZone control channel decoding
//!
//! This crate decodes the control channel of Motorola SmartNet and
//! SmartZone trunked radio systems. It turns a stream of decoded
//! *outbound signaling words* (OSWs) into trunking events: voice
//! channel grants and updates, which a call recorder can use to
//! follow conversations from one voice channel to the next.
//!
//! ## Disclaimer
//!
//! This crate is dual-licensed MIT and Apache 2.0. Read these licenses
//! carefully as they may affect your rights.
//!
//! The SmartNet protocol was never publicly documented. Everything
//! here is the product of long-running community observation and
//! may be wrong for your system.
//!
//! ## Example
//!
//! You will first need a demodulator which recovers OSWs from the
//! 3600 baud control channel. Demodulation is beyond the scope of
//! this crate. Each OSW carries a 16-bit address, a group flag,
//! and a 10-bit command.
//!
//! ```
//! use smartnet::{BandPlan, DecoderMessage, SmartnetDecoderBuilder, TrunkEventKind};
//!
//! let mut decoder = SmartnetDecoderBuilder::new(BandPlan::Domestic800)
//!     .with_system_number(0)
//!     .build();
//!
//! // a digital group grant: talkgroup 0x2460 on channel 0x100,
//! // followed by some idle words
//! let words = [
//!     (0x04d2, true, 0x321),
//!     (0x2460, true, 0x100),
//!     (0x0000, true, 0x2f8),
//!     (0x0000, true, 0x2f8),
//!     (0x0000, true, 0x2f8),
//! ];
//! let input = words.iter().enumerate().map(|(i, (addr, group, cmd))| {
//!     DecoderMessage::Osw { ts: i as f64, addr: *addr, group: *group, cmd: *cmd }
//! });
//!
//! for evt in decoder.iter(input) {
//!     assert_eq!(TrunkEventKind::Grant, evt.kind);
//!     assert_eq!(857_412_500.0, evt.frequency_hz);
//!     assert_eq!(0x246, evt.talkgroup_id);
//!     assert_eq!(1234, evt.source_radio_id);
//! }
//! ```
//!
//! The decoder is created via a
//! [builder](struct.SmartnetDecoderBuilder.html). The only thing
//! you must supply is the [`BandPlan`], which maps channel numbers
//! to frequencies.
//!
//! The [`SmartnetDecoder`](struct.SmartnetDecoder.html) binds by
//! iterator to any source of [`DecoderMessage`]. Raw messages
//! tagged with a protocol and type may instead be fed to
//! [`process_raw()`](SmartnetDecoder::process_raw).
//!
//! ## Background
//!
//! A trunked radio system shares a small pool of voice channels
//! among many talkgroups. One channel, the *control channel*,
//! continuously announces which talkgroup has been granted which
//! voice channel. Messages on the control channel are one to three
//! OSWs long, and nothing marks message boundaries. The decoder
//! keeps a short window of recent OSWs and matches known message
//! shapes against its front.
//!
//! Along the way, the decoder learns the system ID, site ID, and
//! control channel frequency, tracks active talkgroup patches, and
//! records the control channels of neighboring sites. A
//! [`StatusSnapshot`] summarizes this state as JSON.

mod bandplan;
mod builder;
mod decoder;
mod message;
mod osw;

pub use bandplan::{freq_key, BandPlan, ObtParams, UnrecognizedBandPlan};
pub use builder::SmartnetDecoderBuilder;
pub use decoder::{
    decode, Action, ControlChannel, ControlChannelStatus, Cursor, Decoded, EventIter,
    ExpiryPolicy, ExpiryScheduler, FrequencyStatus, Mode, OswWindow, PatchEntry, Registry,
    RegistryHandle, Session, SiteStatus, SiteTables, SmartnetDecoder, StatusSnapshot,
    SweepReport, TalkgroupInfo, TimedData, TrunkEvent, TrunkEventKind, VoiceFrequency,
    ADJACENT_SITE_TTL, ALTERNATE_CC_TTL, EXPIRY_INTERVAL, OSW_QUEUE_SIZE, PATCH_TTL,
    TGID_DEFAULT_PRIO,
};
pub use message::{
    DecoderMessage, MessageDecodeErr, M_SMARTNET_BAD_OSW, M_SMARTNET_OSW, M_SMARTNET_TIMEOUT,
    OSW_PAYLOAD_LEN, PROTOCOL_SMARTNET,
};
pub use osw::{
    base_tgid, command_name, group_str, tgid_status, CallOptions, Osw, OSW_QUEUE_RESET_CMD,
};
