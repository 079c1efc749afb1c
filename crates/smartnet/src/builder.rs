use crate::bandplan::BandPlan;
use crate::decoder::{ExpiryPolicy, SmartnetDecoder, EXPIRY_INTERVAL};

/// Builds a SmartNet decoder
///
/// The builder comes with a sensible set of default options.
/// All you really need to provide is the [`BandPlan`] of the
/// system. The expiry lifetimes match long-standing decoder
/// practice and rarely need changing.
///
/// ```
/// use smartnet::{BandPlan, ObtParams, SmartnetDecoderBuilder};
///
/// let decoder = SmartnetDecoderBuilder::new(BandPlan::Obt(ObtParams {
///         base_mhz: 406.0125,
///         spacing_mhz: 0.0125,
///         offset: 380,
///     }))
///     .with_system_number(1)
///     .with_patch_ttl(10.0)
///     .build();
/// assert!(decoder.band_plan().is_obt());
/// assert_eq!(10.0, decoder.expiry_policy().patch_ttl);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmartnetDecoderBuilder {
    band_plan: BandPlan,
    system_number: u32,
    expiry_interval: f64,
    policy: ExpiryPolicy,
}

impl SmartnetDecoderBuilder {
    /// New decoder for the given band plan
    pub fn new(band_plan: BandPlan) -> Self {
        Self {
            band_plan,
            system_number: 0,
            expiry_interval: EXPIRY_INTERVAL,
            policy: ExpiryPolicy::default(),
        }
    }

    /// Build a decoder
    ///
    /// Once built, the decoder is immediately ready to
    /// process messages.
    pub fn build(&self) -> SmartnetDecoder {
        SmartnetDecoder::from(self)
    }

    /// Band plan
    ///
    /// Selects how channel numbers map to frequencies. This must
    /// match the system or every frequency will be wrong.
    pub fn with_band_plan(&mut self, band_plan: BandPlan) -> &mut Self {
        self.band_plan = band_plan;
        self
    }

    /// Owning system index
    ///
    /// Copied into every event and status report so that
    /// callers decoding several systems can tell them apart.
    pub fn with_system_number(&mut self, system_number: u32) -> &mut Self {
        self.system_number = system_number;
        self
    }

    /// Minimum time between expiry sweeps (s)
    pub fn with_expiry_interval(&mut self, interval: f64) -> &mut Self {
        self.expiry_interval = f64::max(interval, 0.0);
        self
    }

    /// Patch lifetime without renewal (s)
    pub fn with_patch_ttl(&mut self, ttl: f64) -> &mut Self {
        self.policy.patch_ttl = f64::max(ttl, 0.0);
        self
    }

    /// Adjacent site lifetime without renewal (s)
    pub fn with_adjacent_site_ttl(&mut self, ttl: f64) -> &mut Self {
        self.policy.adjacent_site_ttl = f64::max(ttl, 0.0);
        self
    }

    /// Alternate control channel lifetime without renewal (s)
    pub fn with_alternate_cc_ttl(&mut self, ttl: f64) -> &mut Self {
        self.policy.alternate_cc_ttl = f64::max(ttl, 0.0);
        self
    }

    /// Band plan
    pub fn band_plan(&self) -> BandPlan {
        self.band_plan
    }

    /// Owning system index
    pub fn system_number(&self) -> u32 {
        self.system_number
    }

    /// Minimum time between expiry sweeps (s)
    pub fn expiry_interval(&self) -> f64 {
        self.expiry_interval
    }

    /// Expiry lifetimes
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.policy
    }
}

impl Default for SmartnetDecoderBuilder {
    fn default() -> Self {
        Self::new(BandPlan::default())
    }
}
