//! Channel number to RF frequency mapping
//!
//! SmartNet control channels never transmit frequencies. They
//! transmit *channel numbers*, which every receiver must map back
//! to an RF frequency using the band plan of the system. The band
//! plans are piecewise-linear and were never formally published, so
//! the breakpoints below reproduce the historical values exactly.
//!
//! All frequencies are in MHz and are rounded to five decimal
//! places. Use [`freq_key()`] to turn one into a stable integer
//! number of Hz.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// SmartNet band plan
///
/// The band plan determines which command codes are channel
/// numbers and how they map to frequencies. Band plans may be
/// parsed from their configuration names:
///
/// ```
/// use smartnet::BandPlan;
///
/// assert_eq!(BandPlan::Domestic800, BandPlan::from_name("800_standard").unwrap());
/// assert_eq!(BandPlan::Rebanded800, BandPlan::from_name("800_reband").unwrap());
/// assert_eq!("800_rebanded", BandPlan::Rebanded800.as_str());
/// assert!(BandPlan::from_name("700_nope").is_err());
/// ```
///
/// The `OBT` plan parses with default [`ObtParams`], which
/// resolve nothing and have no valid channels. Supply real parameters with
/// [`BandPlan::Obt`] directly.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    strum_macros::EnumString,
    strum_macros::IntoStaticStr,
)]
pub enum BandPlan {
    /// 800 MHz domestic (US) plan
    #[default]
    #[strum(to_string = "800_domestic", serialize = "800_standard")]
    Domestic800,

    /// 800 MHz domestic plan with splinter channels
    #[strum(to_string = "800_domestic_splinter", serialize = "800_splinter")]
    Splinter800,

    /// 800 MHz plan after the NPSPAC rebanding
    #[strum(to_string = "800_rebanded", serialize = "800_reband")]
    Rebanded800,

    /// 900 MHz plan
    #[strum(to_string = "900")]
    Band900,

    /// Custom narrowband "OBT" plan, usually VHF or UHF
    #[strum(to_string = "OBT", serialize = "400")]
    Obt(ObtParams),
}

/// Parameters for the custom "OBT" band plan
///
/// Receive channel `n` maps to
/// `base_mhz + spacing_mhz * (n - offset)` for every `n ≥ offset`.
/// The transmit channels occupy the `380` channel numbers below
/// the receive channels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ObtParams {
    /// Frequency of the first receive channel (MHz)
    pub base_mhz: f64,

    /// Channel spacing (MHz)
    pub spacing_mhz: f64,

    /// Channel number of the first receive channel
    pub offset: u16,
}

/// Error parsing a band plan name
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
#[error("unrecognized band plan \"{0}\"")]
pub struct UnrecognizedBandPlan(pub String);

impl BandPlan {
    /// Configuration name of the band plan
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Parse a band plan from its configuration name
    pub fn from_name(name: &str) -> Result<Self, UnrecognizedBandPlan> {
        BandPlan::from_str(name).map_err(|_| UnrecognizedBandPlan(name.to_owned()))
    }

    /// True if this is the custom narrowband "OBT" plan
    pub fn is_obt(&self) -> bool {
        matches!(self, BandPlan::Obt(_))
    }

    /// Is the command code a channel number?
    ///
    /// Returns true if `chan` is a valid receive channel (or,
    /// when `is_tx` is set, a valid transmit channel) in this
    /// band plan. Every valid channel resolves to a nonzero
    /// [frequency](BandPlan::resolve_frequency), except OBT
    /// transmit channels.
    pub fn is_channel(&self, chan: u16, is_tx: bool) -> bool {
        match self {
            BandPlan::Domestic800 | BandPlan::Splinter800 => {
                is_upper_800(chan) || chan <= 0x2cf
            }
            BandPlan::Rebanded800 => is_upper_800(chan) || chan <= 0x22f,
            BandPlan::Band900 => chan <= 0x1de,
            BandPlan::Obt(params) => {
                let chan = chan as i32;
                let rx_base = params.offset as i32;
                let tx_base = rx_base - OBT_TX_CHANNELS;
                if is_tx {
                    chan >= tx_base && chan < OBT_TX_CHANNELS
                } else {
                    params.base_mhz > 0.0
                        && params.spacing_mhz > 0.0
                        && chan >= rx_base
                        && chan < 2 * OBT_TX_CHANNELS
                }
            }
        }
    }

    /// Resolve channel number to frequency (MHz)
    ///
    /// Returns the receive frequency of `chan` or, when `is_tx` is
    /// set, the transmit frequency. Returns `0.0` if the channel
    /// cannot be resolved. OBT transmit frequencies are never
    /// resolved.
    ///
    /// ```
    /// use smartnet::BandPlan;
    ///
    /// assert_eq!(857.4125, BandPlan::Domestic800.resolve_frequency(0x100, false));
    /// assert_eq!(812.4125, BandPlan::Domestic800.resolve_frequency(0x100, true));
    /// ```
    pub fn resolve_frequency(&self, chan: u16, is_tx: bool) -> f64 {
        let freq = match self {
            BandPlan::Domestic800 | BandPlan::Splinter800 | BandPlan::Rebanded800 => {
                let freq = self.resolve_800(chan);
                if is_tx && freq != 0.0 {
                    freq - TX_OFFSET_800
                } else {
                    freq
                }
            }
            BandPlan::Band900 => {
                let freq = 935.0125 + 0.0125 * chan as f64;
                if is_tx {
                    freq - TX_OFFSET_900
                } else {
                    freq
                }
            }
            BandPlan::Obt(params) => {
                if !is_tx && chan >= params.offset {
                    params.base_mhz + params.spacing_mhz * (chan - params.offset) as f64
                } else {
                    0.0
                }
            }
        };

        round_mhz(freq)
    }

    // receive frequency for the 800 MHz family
    fn resolve_800(&self, chan: u16) -> f64 {
        let c = chan as f64;
        let low = match self {
            BandPlan::Rebanded800 if chan <= 0x1b7 => 851.0125 + 0.025 * c,
            BandPlan::Rebanded800 if (0x1b8..=0x22f).contains(&chan) => {
                851.0250 + 0.025 * (chan - 0x1b8) as f64
            }
            BandPlan::Splinter800 if chan <= 0x257 => 851.0000 + 0.025 * c,
            BandPlan::Splinter800 if (0x258..=0x2cf).contains(&chan) => {
                866.0125 + 0.025 * (chan - 0x258) as f64
            }
            BandPlan::Domestic800 if chan <= 0x2cf => 851.0125 + 0.025 * c,
            _ => 0.0,
        };

        if (0x2d0..=0x2f7).contains(&chan) {
            866.0000 + 0.025 * (chan - 0x2d0) as f64
        } else if (0x32f..=0x33f).contains(&chan) {
            867.0000 + 0.025 * (chan - 0x32f) as f64
        } else if (0x3c1..=0x3fe).contains(&chan) {
            867.4250 + 0.025 * (chan - 0x3c1) as f64
        } else if chan == 0x3be {
            868.9750
        } else {
            low
        }
    }
}


impl fmt::Display for BandPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandPlan::Obt(params) => write!(
                f,
                "OBT (base {:.5} MHz, spacing {:.5} MHz, offset {})",
                params.base_mhz, params.spacing_mhz, params.offset
            ),
            _ => f.write_str(self.as_str()),
        }
    }
}

/// Integer frequency key (Hz) for a frequency in MHz
///
/// Map keys are derived from the five-decimal-place MHz value
/// returned by the band plan, so equal channels always produce
/// equal keys.
pub fn freq_key(mhz: f64) -> u64 {
    (round_mhz(mhz) * 1_000_000.0).round() as u64
}

// Round to five decimal places (10 Hz)
fn round_mhz(freq: f64) -> f64 {
    (freq * 100000.0).round() / 100000.0
}

// 800 MHz channels shared by every 800 MHz plan
fn is_upper_800(chan: u16) -> bool {
    (0x2d0..=0x2f7).contains(&chan)
        || (0x32f..=0x33f).contains(&chan)
        || (0x3c1..=0x3fe).contains(&chan)
        || chan == 0x3be
}

const TX_OFFSET_800: f64 = 45.0;
const TX_OFFSET_900: f64 = 39.0;

// OBT transmit channels lie in [offset - 380, 380)
const OBT_TX_CHANNELS: i32 = 380;
