//! OSW pattern matcher
//!
//! SmartNet messages are one, two, or three OSWs long, and
//! nothing on the air marks where one message ends and the next
//! begins. The matcher examines the front of the
//! [window](super::window::OswWindow) and tries each known message
//! shape in priority order. The first shape to match wins.
//!
//! The matcher is a pure function of the window. It never
//! modifies the window or any decoder state. It reports which
//! [`Action`] to take and how many OSWs the message used, and
//! the caller commits both. A shape which fails part-way through
//! simply never advances the window past the words it peeked at.

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use super::registry::Mode;
use super::sites::ControlChannel;
use super::window::{Cursor, OswWindow};
use crate::bandplan::BandPlan;
use crate::osw::Osw;

const CMD_IDLE: u16 = 0x2f8;
const CMD_GROUP_BUSY: u16 = 0x300;
const CMD_EXTENDED: u16 = 0x308;
const CMD_DYNAMIC_REGROUP: u16 = 0x30a;
const CMD_SYSTEM_INFO: u16 = 0x30b;
const CMD_OBT_SITE_INFO: u16 = 0x320;
const CMD_DIGITAL_GRANT: u16 = 0x321;
const CMD_PATCH: u16 = 0x340;

/// What a decoded message asks the decoder to do
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// A call was granted a voice channel
    Grant {
        /// Time of the channel OSW (s)
        ts: f64,
        /// Voice channel receive frequency (MHz)
        freq: f64,
        /// Talkgroup address, with status bits
        tgid: u16,
        /// Calling radio
        srcaddr: u16,
        /// Voice mode
        mode: Mode,
    },

    /// A call in progress was re-announced
    Update {
        /// Time of the OSW (s)
        ts: f64,
        /// Voice channel receive frequency (MHz)
        freq: f64,
        /// Talkgroup address, with status bits
        tgid: u16,
    },

    /// Radio-to-radio call
    PrivateCall {
        /// Voice channel receive frequency (MHz)
        freq: f64,
        /// Called radio
        dst: u16,
        /// Calling radio
        src: u16,
    },

    /// Control channel frequency broadcast (MHz)
    ControlChannel(f64),

    /// System ID and control channel frequency
    SystemControlChannel {
        /// System ID
        system_id: u16,
        /// Control channel receive frequency (MHz)
        freq: f64,
    },

    /// Control channel of a neighboring site
    AdjacentSite {
        /// Time of the announcement (s)
        ts: f64,
        /// System ID
        system_id: u16,
        /// Neighbor's site ID
        site: u16,
        /// Neighbor's control channel
        cc: ControlChannel,
    },

    /// Alternate control channel of the current site
    AlternateControlChannel {
        /// Time of the announcement (s)
        ts: f64,
        /// System ID
        system_id: u16,
        /// Current site ID
        site: u16,
        /// Alternate control channel
        cc: ControlChannel,
    },

    /// Talkgroup patch announcement
    Patch {
        /// Time of the announcement (s)
        ts: f64,
        /// Primary talkgroup
        tgid: u16,
        /// Secondary talkgroup
        sub_tgid: u16,
        /// Patch mode
        mode: u8,
    },

    /// Dynamic regroup
    DynamicRegroup {
        /// Target radio
        addr: u16,
    },

    /// Idle
    Idle,

    /// Group busy, queued
    Busy,
}

/// Result of one matcher cycle
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    /// Not enough OSWs yet; nothing may be consumed
    Wait,

    /// A message was recognized
    Matched {
        /// Position after the last OSW of the message
        consumed: Cursor,
        /// What to do about it
        action: Action,
    },

    /// The front OSW did not start any known message
    ///
    /// The `consumed` OSWs should be discarded.
    Unknown {
        /// Position after the discarded OSWs
        consumed: Cursor,
        /// The OSW which failed to match
        lead: Osw,
    },
}

/// Decode one message from the front of the `window`
///
/// If the window starts with a resynchronization sentinel, the
/// sentinel is skipped. Decoding proceeds only if exactly one
/// sentinel precedes the next real OSW.
pub fn decode(window: &OswWindow, band_plan: &BandPlan) -> Decoded {
    let mut cur = window.cursor();
    let mut osw2 = match window.next(&mut cur) {
        Some(osw) => osw,
        None => return Decoded::Wait,
    };

    if osw2.is_reset() {
        while osw2.is_reset() {
            osw2 = match window.next(&mut cur) {
                Some(osw) => osw,
                None => return Decoded::Wait,
            };
        }
        if cur.consumed() != 2 {
            return Decoded::Wait;
        }
        debug!("matcher: queue reset");
    }

    if band_plan.is_obt() && osw2.is_tx_channel() {
        decode_obt(window, cur, osw2, band_plan)
    } else if osw2.is_rx_channel() && osw2.group() {
        matched(
            cur,
            Action::Update {
                ts: osw2.ts(),
                freq: osw2.rx_freq(),
                tgid: osw2.addr(),
            },
        )
    } else if osw2.is_rx_channel() && !osw2.group() && is_control_channel_addr(osw2.addr()) {
        matched(cur, Action::ControlChannel(osw2.rx_freq()))
    } else if osw2.cmd() == CMD_GROUP_BUSY && osw2.group() {
        matched(cur, Action::Busy)
    } else if osw2.cmd() == CMD_EXTENDED {
        decode_extended(window, cur, osw2)
    } else if osw2.cmd() == CMD_DIGITAL_GRANT {
        decode_digital_grant(window, cur, osw2)
    } else if osw2.cmd() == CMD_PATCH && osw2.group() {
        decode_patch(window, cur, osw2)
    } else {
        Decoded::Unknown {
            consumed: cur,
            lead: osw2,
        }
    }
}

// Transmit channel followed by site info, idle, or a voice grant
fn decode_obt(window: &OswWindow, lead: Cursor, osw2: Osw, band_plan: &BandPlan) -> Decoded {
    let mut cur = lead;
    let osw1 = match window.next(&mut cur) {
        Some(osw) => osw,
        None => return Decoded::Wait,
    };

    if osw1.cmd() == CMD_OBT_SITE_INFO && osw2.group() && osw1.group() {
        let two = cur;
        let osw0 = match window.next(&mut cur) {
            Some(osw) => osw,
            None => return Decoded::Wait,
        };
        if osw0.cmd() != CMD_SYSTEM_INFO || (osw0.addr() & 0xfc00) != 0x6000 {
            return Decoded::Unknown {
                consumed: two,
                lead: osw2,
            };
        }

        let system_id = osw2.addr();
        let site = ((osw1.addr() & 0xfc00) >> 10) + 1;
        let cc = ControlChannel {
            rx_freq: band_plan.resolve_frequency(osw0.addr() & 0x3ff, false),
            tx_freq: osw2.tx_freq(),
        };
        let action = if osw0.group() {
            Action::AdjacentSite {
                ts: osw1.ts(),
                system_id,
                site,
                cc,
            }
        } else {
            Action::AlternateControlChannel {
                ts: osw1.ts(),
                system_id,
                site,
                cc,
            }
        };
        matched(cur, action)
    } else if osw1.cmd() == CMD_IDLE {
        matched(cur, Action::Idle)
    } else if osw1.is_rx_channel() && osw1.addr() != 0 && osw2.addr() != 0 {
        if osw1.group() {
            matched(
                cur,
                Action::Grant {
                    ts: osw1.ts(),
                    freq: osw1.rx_freq(),
                    tgid: osw1.addr(),
                    srcaddr: osw2.addr(),
                    mode: if osw2.group() {
                        Mode::Analog
                    } else {
                        Mode::Digital
                    },
                },
            )
        } else {
            matched(
                cur,
                Action::PrivateCall {
                    freq: osw1.rx_freq(),
                    dst: osw1.addr(),
                    src: osw2.addr(),
                },
            )
        }
    } else {
        Decoded::Unknown {
            consumed: lead,
            lead: osw2,
        }
    }
}

// Command 0x308: the first word of many two- and three-word messages
fn decode_extended(window: &OswWindow, lead: Cursor, osw2: Osw) -> Decoded {
    let mut cur = lead;
    let osw1 = match window.next(&mut cur) {
        Some(osw) => osw,
        None => return Decoded::Wait,
    };

    if osw1.is_rx_channel() && !osw1.group() && is_control_channel_addr(osw1.addr()) {
        matched(
            cur,
            Action::SystemControlChannel {
                system_id: osw2.addr(),
                freq: osw1.rx_freq(),
            },
        )
    } else if osw1.is_rx_channel() && osw1.group() && osw1.addr() != 0 && osw2.addr() != 0 {
        matched(
            cur,
            Action::Grant {
                ts: osw1.ts(),
                freq: osw1.rx_freq(),
                tgid: osw1.addr(),
                srcaddr: osw2.addr(),
                mode: Mode::Analog,
            },
        )
    } else if osw1.is_rx_channel() && !osw1.group() && osw1.addr() != 0 && osw2.addr() != 0 {
        matched(
            cur,
            Action::PrivateCall {
                freq: osw1.rx_freq(),
                dst: osw1.addr(),
                src: osw2.addr(),
            },
        )
    } else if osw1.cmd() == CMD_IDLE {
        matched(cur, Action::Idle)
    } else if osw1.cmd() == CMD_DYNAMIC_REGROUP {
        matched(
            cur,
            Action::DynamicRegroup {
                addr: osw2.addr(),
            },
        )
    } else if osw1.cmd() == CMD_SYSTEM_INFO {
        let two = cur;
        let osw0 = match window.next(&mut cur) {
            Some(osw) => osw,
            None => return Decoded::Wait,
        };
        if osw1.group()
            && !osw0.group()
            && osw0.is_rx_channel()
            && is_control_channel_addr(osw0.addr())
            && (osw1.addr() & 0xfc00) == 0x2800
            && (osw1.addr() & 0x3ff) == osw0.cmd()
        {
            matched(
                cur,
                Action::SystemControlChannel {
                    system_id: osw2.addr(),
                    freq: osw0.rx_freq(),
                },
            )
        } else {
            Decoded::Unknown {
                consumed: two,
                lead: osw2,
            }
        }
    } else {
        Decoded::Unknown {
            consumed: lead,
            lead: osw2,
        }
    }
}

fn decode_digital_grant(window: &OswWindow, lead: Cursor, osw2: Osw) -> Decoded {
    let mut cur = lead;
    let osw1 = match window.next(&mut cur) {
        Some(osw) => osw,
        None => return Decoded::Wait,
    };

    if osw1.is_rx_channel() && osw2.group() && osw1.group() && osw1.addr() != 0 {
        matched(
            cur,
            Action::Grant {
                ts: osw1.ts(),
                freq: osw1.rx_freq(),
                tgid: osw1.addr(),
                srcaddr: osw2.addr(),
                mode: Mode::Digital,
            },
        )
    } else {
        Decoded::Unknown {
            consumed: lead,
            lead: osw2,
        }
    }
}

fn decode_patch(window: &OswWindow, lead: Cursor, osw2: Osw) -> Decoded {
    let mut cur = lead;
    let osw1 = match window.next(&mut cur) {
        Some(osw) => osw,
        None => return Decoded::Wait,
    };

    if osw1.group() {
        matched(
            cur,
            Action::Patch {
                ts: osw1.ts(),
                tgid: (osw1.addr() & 0xfff) << 4,
                sub_tgid: osw2.addr() & 0xfff0,
                mode: (osw2.addr() & 0xf) as u8,
            },
        )
    } else {
        Decoded::Unknown {
            consumed: lead,
            lead: osw2,
        }
    }
}

fn matched(consumed: Cursor, action: Action) -> Decoded {
    Decoded::Matched { consumed, action }
}

// Control channel announcements carry 0x1fXX addresses
fn is_control_channel_addr(addr: u16) -> bool {
    (addr & 0xff00) == 0x1f00
}
