//! Promotions

use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::{calculators::Calculator, rules::Rule};

pub mod registry;

new_key_type! {
    /// Promotion Key
    pub struct PromotionKey;
}

/// A promotion: rules that decide whether it applies, and a calculator that decides how much
/// it is worth.
#[derive(Debug, Clone)]
pub struct Promotion<'a> {
    name: String,
    code: Option<String>,
    automatic: bool,
    combinable: bool,
    calculator: Calculator<'a>,
    rules: SmallVec<[Rule<'a>; 2]>,
}

impl<'a> Promotion<'a> {
    /// Create an automatic, combinable promotion with no rules.
    pub fn new(name: impl Into<String>, calculator: Calculator<'a>) -> Self {
        Self {
            name: name.into(),
            code: None,
            automatic: true,
            combinable: true,
            calculator,
            rules: SmallVec::new(),
        }
    }

    /// Create a manual promotion, redeemed with a coupon code.
    pub fn coupon(
        name: impl Into<String>,
        code: impl Into<String>,
        calculator: Calculator<'a>,
    ) -> Self {
        Self {
            code: Some(code.into()),
            automatic: false,
            ..Self::new(name, calculator)
        }
    }

    /// Set whether the promotion may be combined with others.
    #[must_use]
    pub fn with_combinable(mut self, combinable: bool) -> Self {
        self.combinable = combinable;
        self
    }

    /// Set whether the promotion is applied automatically.
    #[must_use]
    pub fn with_automatic(mut self, automatic: bool) -> Self {
        self.automatic = automatic;
        self
    }

    /// Set the redemption code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Add a rule. All rules must hold for the promotion to be eligible.
    #[must_use]
    pub fn with_rule(mut self, rule: Rule<'a>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Promotion name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Redemption code, if any
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Whether reconciliation applies this promotion by itself
    pub fn is_automatic(&self) -> bool {
        self.automatic
    }

    /// Whether this promotion may sit alongside other promotions
    pub fn is_combinable(&self) -> bool {
        self.combinable
    }

    /// The amount calculator
    pub fn calculator(&self) -> &Calculator<'a> {
        &self.calculator
    }

    /// The eligibility rules
    pub fn rules(&self) -> &[Rule<'a>] {
        &self.rules
    }
}
