//! Engine configuration

use serde::Deserialize;

/// Whether coupon redemption checks the promotion's rules.
///
/// Neither policy consults the combinability of promotions already on the order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponEligibility {
    /// Apply the coupon whatever its rules say.
    #[default]
    Bypass,

    /// Refuse the coupon unless all of its rules hold.
    Enforce,
}

/// Engine settings, fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Coupon eligibility policy
    pub coupon_eligibility: CouponEligibility,
}

impl EngineConfig {
    /// Parse configuration from YAML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or has unknown keys.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_norway::Error> {
        serde_norway::from_str(yaml)
    }
}
