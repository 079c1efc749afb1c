//! Outbound signaling words

use phf::phf_map;

use crate::bandplan::BandPlan;

/// Reserved command code for the resynchronization sentinel
///
/// SmartNet commands are ten bits wide, so this code can never
/// be received over the air.
pub const OSW_QUEUE_RESET_CMD: u16 = 0xffe;

/// One decoded outbound signaling word (OSW)
///
/// The control channel continuously broadcasts OSWs, each of which
/// contains a 16-bit address, a group/individual flag, and a
/// 10-bit command. Many commands are channel numbers. The channel
/// validity and frequencies are resolved once, when the OSW is
/// created, using the system's [`BandPlan`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Osw {
    addr: u16,
    group: bool,
    cmd: u16,
    ts: f64,
    is_rx_channel: bool,
    is_tx_channel: bool,
    rx_freq: f64,
    tx_freq: f64,
}

impl Osw {
    /// Decode an OSW
    ///
    /// Resolves the `cmd` as a receive and transmit channel using
    /// the given `band_plan`. `ts` is the time of reception, in
    /// seconds.
    pub fn new(addr: u16, group: bool, cmd: u16, ts: f64, band_plan: &BandPlan) -> Self {
        let is_rx_channel = band_plan.is_channel(cmd, false);
        let is_tx_channel = band_plan.is_channel(cmd, true);
        Self {
            addr,
            group,
            cmd,
            ts,
            is_rx_channel,
            is_tx_channel,
            rx_freq: if is_rx_channel {
                band_plan.resolve_frequency(cmd, false)
            } else {
                0.0
            },
            tx_freq: if is_tx_channel {
                band_plan.resolve_frequency(cmd, true)
            } else {
                0.0
            },
        }
    }

    /// Resynchronization sentinel
    ///
    /// Inserted after a bad frame to mark where the stream
    /// lost sync.
    pub fn reset(ts: f64) -> Self {
        Self {
            addr: 0xffff,
            group: true,
            cmd: OSW_QUEUE_RESET_CMD,
            ts,
            is_rx_channel: false,
            is_tx_channel: false,
            rx_freq: 0.0,
            tx_freq: 0.0,
        }
    }

    /// True if this is a resynchronization sentinel
    pub fn is_reset(&self) -> bool {
        self.cmd == OSW_QUEUE_RESET_CMD
    }

    /// Address field
    ///
    /// Depending on the command, this is a talkgroup (with status
    /// bits), a radio ID, a system ID, or packed site data.
    pub fn addr(&self) -> u16 {
        self.addr
    }

    /// Group flag
    pub fn group(&self) -> bool {
        self.group
    }

    /// Command field
    pub fn cmd(&self) -> u16 {
        self.cmd
    }

    /// Time of reception (s)
    pub fn ts(&self) -> f64 {
        self.ts
    }

    /// True if the command is a receive channel number
    pub fn is_rx_channel(&self) -> bool {
        self.is_rx_channel
    }

    /// True if the command is a transmit channel number
    pub fn is_tx_channel(&self) -> bool {
        self.is_tx_channel
    }

    /// Receive frequency (MHz), or `0.0` if not a channel
    pub fn rx_freq(&self) -> f64 {
        self.rx_freq
    }

    /// Transmit frequency (MHz), or `0.0` if not resolvable
    pub fn tx_freq(&self) -> f64 {
        self.tx_freq
    }

    /// `G` for group, `I` for individual
    pub fn group_str(&self) -> &'static str {
        group_str(self.group)
    }
}

/// `G` for group, `I` for individual
pub fn group_str(is_group: bool) -> &'static str {
    if is_group {
        "G"
    } else {
        "I"
    }
}

/// Base talkgroup ID, with the status bits masked off
pub fn base_tgid(tgid: u16) -> u16 {
    tgid & 0xfff0
}

/// Status bits of a talkgroup address
pub fn tgid_status(tgid: u16) -> u8 {
    (tgid & 0x000f) as u8
}

/// Talkgroup call options
///
/// The low four bits of every talkgroup address are status
/// bits. Bit 3 marks an encrypted call, and the low three bits
/// form an "options" code.
///
/// ```
/// use smartnet::CallOptions;
///
/// let opts = CallOptions::from_tgid(0x206a);
/// assert!(opts.encrypted());
/// assert!(opts.emergency());
/// assert_eq!(2, opts.options());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallOptions(u8);

impl CallOptions {
    /// Extract call options from a talkgroup address
    pub fn from_tgid(tgid: u16) -> Self {
        Self(tgid_status(tgid))
    }

    /// Encrypted (digital) call
    pub fn encrypted(&self) -> bool {
        self.0 & 0x8 != 0
    }

    /// Options code (low three bits)
    pub fn options(&self) -> u8 {
        self.0 & 0x7
    }

    /// Emergency call
    pub fn emergency(&self) -> bool {
        matches!(self.options(), 2 | 4 | 5)
    }

    /// Talkgroup is the target of a patch
    pub fn patch_group(&self) -> bool {
        matches!(self.options(), 3 | 4)
    }

    /// Talkgroup is the target of a multiselect
    pub fn multiselect(&self) -> bool {
        matches!(self.options(), 5 | 7)
    }
}

/// Human-readable name for a known command code
///
/// Channel numbers are not named. Returns `None` for
/// unknown commands.
pub fn command_name(cmd: u16) -> Option<&'static str> {
    COMMAND_NAMES.get(&cmd).copied()
}

static COMMAND_NAMES: phf::Map<u16, &'static str> = phf_map! {
    0x2f8u16 => "idle",
    0x300u16 => "group busy queued",
    0x308u16 => "system id / analog grant",
    0x30au16 => "dynamic regroup",
    0x30bu16 => "system / site information",
    0x320u16 => "OBT site information",
    0x321u16 => "digital group grant",
    0x340u16 => "patch",
    0xffeu16 => "queue reset",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osw_resolves_channels() {
        let plan = BandPlan::Domestic800;

        let osw = Osw::new(0x2460, true, 0x100, 10.0, &plan);
        assert!(osw.is_rx_channel());
        assert!(osw.is_tx_channel());
        assert_eq!(857.4125, osw.rx_freq());
        assert_eq!(812.4125, osw.tx_freq());
        assert_eq!("G", osw.group_str());
        assert!(!osw.is_reset());

        let osw = Osw::new(0x1234, false, 0x308, 10.0, &plan);
        assert!(!osw.is_rx_channel());
        assert!(!osw.is_tx_channel());
        assert_eq!(0.0, osw.rx_freq());
        assert_eq!(0.0, osw.tx_freq());
        assert_eq!("I", osw.group_str());
    }

    #[test]
    fn test_reset() {
        let osw = Osw::reset(5.0);
        assert!(osw.is_reset());
        assert_eq!(0xffff, osw.addr());
        assert!(osw.group());
        assert!(!osw.is_rx_channel());
        assert_eq!(Some("queue reset"), command_name(osw.cmd()));
    }

    #[test]
    fn test_call_options() {
        for (tgid, encrypted, emergency, patch, multi) in [
            (0x2460u16, false, false, false, false),
            (0x2468, true, false, false, false),
            (0x2462, false, true, false, false),
            (0x2463, false, false, true, false),
            (0x2464, false, true, true, false),
            (0x246d, true, true, false, true),
            (0x2467, false, false, false, true),
        ] {
            let opts = CallOptions::from_tgid(tgid);
            assert_eq!(encrypted, opts.encrypted(), "{:#x}", tgid);
            assert_eq!(emergency, opts.emergency(), "{:#x}", tgid);
            assert_eq!(patch, opts.patch_group(), "{:#x}", tgid);
            assert_eq!(multi, opts.multiselect(), "{:#x}", tgid);
        }
    }

    #[test]
    fn test_tgid_split() {
        assert_eq!(0x2460, base_tgid(0x246a));
        assert_eq!(0xa, tgid_status(0x246a));
        assert_eq!(Some("patch"), command_name(0x340));
        assert_eq!(None, command_name(0x100));
    }
}
