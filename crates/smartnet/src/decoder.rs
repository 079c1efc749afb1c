//! Full decoder chain

#[cfg(not(test))]
use log::{debug, info, trace, warn};

#[cfg(test)]
use std::println as trace;
#[cfg(test)]
use std::println as debug;
#[cfg(test)]
use std::println as info;
#[cfg(test)]
use std::println as warn;

use std::convert::{From, TryFrom};
use std::iter::{IntoIterator, Iterator};

mod expiry;
mod matcher;
mod output;
mod registry;
mod session;
mod sites;
mod timeddata;
mod window;

pub use expiry::{
    ExpiryPolicy, ExpiryScheduler, SweepReport, ADJACENT_SITE_TTL, ALTERNATE_CC_TTL,
    EXPIRY_INTERVAL, PATCH_TTL,
};
pub use matcher::{decode, Action, Decoded};
pub use output::{
    ControlChannelStatus, FrequencyStatus, SiteStatus, StatusSnapshot, TrunkEvent,
    TrunkEventKind,
};
pub use registry::{
    Mode, PatchEntry, Registry, RegistryHandle, TalkgroupInfo, VoiceFrequency, TGID_DEFAULT_PRIO,
};
pub use session::Session;
pub use sites::{ControlChannel, SiteTables};
pub use timeddata::TimedData;
pub use window::{Cursor, OswWindow, OSW_QUEUE_SIZE};

use crate::bandplan::BandPlan;
use crate::builder::SmartnetDecoderBuilder;
use crate::message::DecoderMessage;
use crate::osw::{command_name, group_str, Osw};

/// A complete SmartNet control channel decoder
///
/// The decoder accepts [`DecoderMessage`]s from a demodulator
/// and performs the following operations:
///
/// 1. OSW intake: each OSW is resolved against the band plan
///    and pushed onto a short sliding window.
/// 2. Pattern matching: once the window is full, one message
///    is decoded from its front.
/// 3. State tracking: grants and updates are recorded in the
///    talkgroup [`Registry`]. System, site, and control channel
///    announcements update the [`Session`] and [`SiteTables`].
/// 4. Expiry: stale patches, adjacent sites, and alternate
///    control channels are swept about once per second.
///
/// Voice grants and updates are emitted as [`TrunkEvent`]s.
///
/// To create the decoder, first create its Builder:
///
/// ```
/// use smartnet::{BandPlan, SmartnetDecoderBuilder};
///
/// let decoder = SmartnetDecoderBuilder::new(BandPlan::Domestic800)
///     .with_system_number(2)
///     .build();
/// assert_eq!(decoder.system_number(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct SmartnetDecoder {
    band_plan: BandPlan,
    system_number: u32,
    window: OswWindow,
    session: Session,
    registry: Registry,
    sites: SiteTables,
    policy: ExpiryPolicy,
    expiry: ExpiryScheduler,
}

impl SmartnetDecoder {
    /// Decode trunking events from a source of messages
    ///
    /// Bind an iterator which will consume the `input` and
    /// produce [`TrunkEvent`]s. The iterator consumes as many
    /// messages as required to produce the next event. It
    /// returns `None` once the input is exhausted.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn iter<'dec, I, T>(&'dec mut self, input: I) -> EventIter<'dec, T>
    where
        I: IntoIterator<Item = DecoderMessage> + IntoIterator<IntoIter = T>,
        T: Iterator<Item = DecoderMessage>,
    {
        EventIter {
            source: input.into_iter(),
            decoder: self,
            pending: Vec::new().into_iter(),
        }
    }

    /// Process one demodulator message
    ///
    /// Performs OSW intake, at most one pattern matching cycle,
    /// and, if due, an expiry sweep. The message timestamp is
    /// used as the current time. Returns any trunking events
    /// which were decoded.
    pub fn process(&mut self, msg: DecoderMessage) -> Vec<TrunkEvent> {
        match msg {
            DecoderMessage::Osw {
                ts,
                addr,
                group,
                cmd,
            } => self.push_word(addr, group, cmd, ts),
            DecoderMessage::BadFrame { ts } => self.push_reset(ts),
            DecoderMessage::Timeout { ts } => {
                debug!("decoder: control channel timeout at {:.3}", ts);
            }
        }

        let out = self.process_osws();
        self.tick(msg.ts());
        out
    }

    /// Process one raw tagged message
    ///
    /// Decodes a raw message type, timestamp, and payload into a
    /// [`DecoderMessage`] and [processes](SmartnetDecoder::process)
    /// it. Messages which fail to decode are logged and dropped
    /// without changing any decoder state.
    pub fn process_raw(&mut self, raw_type: u32, ts: f64, payload: &[u8]) -> Vec<TrunkEvent> {
        match DecoderMessage::try_from((raw_type, ts, payload)) {
            Ok(msg) => self.process(msg),
            Err(err) => {
                warn!("decoder: dropped message at {:.3}: {}", ts, err);
                Vec::new()
            }
        }
    }

    /// Push one OSW onto the window
    ///
    /// The OSW is resolved against the band plan. If the window
    /// is full, the oldest OSW is dropped.
    pub fn push_word(&mut self, addr: u16, group: bool, cmd: u16, ts: f64) {
        let osw = Osw::new(addr, group, cmd, ts, &self.band_plan);
        trace!(
            "decoder: osw {:#06x} {} {:#05x} at {:.3}",
            addr,
            group_str(group),
            cmd,
            ts
        );
        self.window.push(osw);
        self.session.record_osw(ts);
    }

    /// Flush the window after a loss of synchronization
    ///
    /// Every buffered OSW is discarded and replaced by a single
    /// resynchronization sentinel.
    pub fn push_reset(&mut self, ts: f64) {
        debug!("decoder: bad frame at {:.3}; flushing window", ts);
        self.window.clear();
        self.window.push(Osw::reset(ts));
    }

    /// Run one pattern matching cycle
    ///
    /// Does nothing unless the window is full. Otherwise, decodes
    /// at most one message from the front of the window, applies
    /// it, and returns the resulting trunking events.
    pub fn process_osws(&mut self) -> Vec<TrunkEvent> {
        if !self.window.is_full() {
            return Vec::new();
        }

        match decode(&self.window, &self.band_plan) {
            Decoded::Wait => Vec::new(),
            Decoded::Matched { consumed, action } => {
                self.window.commit(consumed);
                self.apply(action).into_iter().collect()
            }
            Decoded::Unknown { consumed, lead } => {
                debug!(
                    "decoder: unknown osw {:#06x} {} cmd={:#05x} ({})",
                    lead.addr(),
                    lead.group_str(),
                    lead.cmd(),
                    command_name(lead.cmd()).unwrap_or("channel or unrecognized")
                );
                self.window.commit(consumed);
                Vec::new()
            }
        }
    }

    /// Run an expiry sweep if one is due at time `now`
    ///
    /// Returns the sweep results if a sweep ran.
    pub fn tick(&mut self, now: f64) -> Option<SweepReport> {
        if self.expiry.is_due(now) {
            Some(self.expire(now))
        } else {
            None
        }
    }

    /// Sweep stale entries now
    ///
    /// Removes patches, adjacent sites, and alternate control
    /// channels which have not been renewed within their
    /// lifetimes. Talkgroups are never removed.
    pub fn expire(&mut self, now: f64) -> SweepReport {
        let shared = self.registry.handle();
        let report = SweepReport {
            patches: shared.expire_patches(now, self.policy.patch_ttl),
            adjacent_sites: self
                .sites
                .expire_adjacent_sites(now, self.policy.adjacent_site_ttl),
            alternate_cc_freqs: self
                .sites
                .expire_alternate_cc_freqs(now, self.policy.alternate_cc_ttl),
            talkgroups: shared.expire_talkgroups(now),
        };
        if report.total() > 0 {
            trace!("decoder: expired at {:.3}: {:?}", now, report);
        }
        report
    }

    /// Point-in-time status report
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot::new(self.system_number, &self.session, &self.registry, &self.sites)
    }

    /// Band plan
    pub fn band_plan(&self) -> &BandPlan {
        &self.band_plan
    }

    /// Owning system index
    pub fn system_number(&self) -> u32 {
        self.system_number
    }

    /// Expiry lifetimes
    pub fn expiry_policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    /// System and site identity
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Talkgroup and voice frequency state
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Shared handle to the talkgroup and patch tables
    ///
    /// The handle may be sent to another thread for reporting.
    pub fn registry_handle(&self) -> RegistryHandle {
        self.registry.handle().clone()
    }

    /// Adjacent sites and alternate control channels
    pub fn sites(&self) -> &SiteTables {
        &self.sites
    }

    /// OSWs waiting in the window, oldest first
    pub fn window(&self) -> &OswWindow {
        &self.window
    }

    /// Clear all state
    ///
    /// The window, session, registry, and site tables are
    /// emptied. Existing [`RegistryHandle`]s remain valid and
    /// observe the empty tables.
    pub fn reset(&mut self) {
        self.window.clear();
        self.session.reset();
        self.registry.clear();
        self.sites.clear();
        self.expiry.reset();
    }

    // Apply a decoded message to the decoder state
    fn apply(&mut self, action: Action) -> Option<TrunkEvent> {
        match action {
            Action::Grant {
                ts,
                freq,
                tgid,
                srcaddr,
                mode,
            } => {
                self.registry.update_voice_frequency(
                    ts,
                    freq,
                    tgid,
                    Some(srcaddr as u32),
                    Some(mode),
                );
                Some(self.event(TrunkEventKind::Grant, freq, tgid, srcaddr))
            }
            Action::Update { ts, freq, tgid } => {
                self.registry
                    .update_voice_frequency(ts, freq, tgid, None, None);
                Some(self.event(TrunkEventKind::Update, freq, tgid, 0))
            }
            Action::PrivateCall { freq, dst, src } => {
                debug!(
                    "decoder: private call {} → {} on {:.5} MHz",
                    src, dst, freq
                );
                None
            }
            Action::ControlChannel(freq) => {
                self.session.set_control_channel(freq);
                None
            }
            Action::SystemControlChannel { system_id, freq } => {
                self.session.set_system_id(system_id);
                self.session.set_control_channel(freq);
                None
            }
            Action::AdjacentSite {
                ts,
                system_id,
                site,
                cc,
            } => {
                self.session.set_system_id(system_id);
                self.sites.add_adjacent_site(ts, site, cc);
                None
            }
            Action::AlternateControlChannel {
                ts,
                system_id,
                site,
                cc,
            } => {
                self.session.set_system_id(system_id);
                self.session.set_site_id(site);
                self.sites.add_alternate_cc_freq(ts, cc);
                None
            }
            Action::Patch {
                ts,
                tgid,
                sub_tgid,
                mode,
            } => {
                self.registry.handle().add_patch(ts, tgid, sub_tgid, mode);
                None
            }
            Action::DynamicRegroup { addr } => {
                debug!("decoder: dynamic regroup for radio {}", addr);
                None
            }
            Action::Idle | Action::Busy => None,
        }
    }

    fn event(&self, kind: TrunkEventKind, freq: f64, tgid: u16, srcaddr: u16) -> TrunkEvent {
        let evt = TrunkEvent::new(
            kind,
            freq,
            tgid,
            srcaddr,
            self.system_number,
            &self.session,
        );
        info!("decoder: {}", evt);
        evt
    }
}

impl From<&SmartnetDecoderBuilder> for SmartnetDecoder {
    /// Create the decoder from its Builder
    fn from(cfg: &SmartnetDecoderBuilder) -> Self {
        Self {
            band_plan: cfg.band_plan(),
            system_number: cfg.system_number(),
            window: OswWindow::new(),
            session: Session::new(),
            registry: Registry::new(),
            sites: SiteTables::new(),
            policy: cfg.expiry_policy(),
            expiry: ExpiryScheduler::new(cfg.expiry_interval()),
        }
    }
}

/// Message source iterator
///
/// This iterator is bound to a source of
/// [`DecoderMessage`]s. Calling the `next()` method will
/// return the next [`TrunkEvent`] from the decoder or `None`
/// if the available messages have been consumed without any
/// new events.
#[derive(Debug)]
pub struct EventIter<'dec, I>
where
    I: Iterator<Item = DecoderMessage>,
{
    source: I,
    decoder: &'dec mut SmartnetDecoder,
    pending: std::vec::IntoIter<TrunkEvent>,
}

impl<'dec, I> Iterator for EventIter<'dec, I>
where
    I: Iterator<Item = DecoderMessage>,
{
    type Item = TrunkEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(evt) = self.pending.next() {
                return Some(evt);
            }
            let msg = self.source.next()?;
            self.pending = self.decoder.process(msg).into_iter();
        }
    }
}
