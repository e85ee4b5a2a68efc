//! Promotion Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::rules::{ItemTotalOperator, MatchPolicy};

/// Wrapper for promotions in YAML
#[derive(Debug, Deserialize)]
pub struct PromotionsFixture {
    /// Map of promotion key -> promotion fixture
    pub promotions: FxHashMap<String, PromotionFixture>,
}

const fn default_true() -> bool {
    true
}

/// Promotion fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromotionFixture {
    /// Promotion name
    pub name: String,

    /// Coupon code, if any
    #[serde(default)]
    pub code: Option<String>,

    /// Applied by reconciliation without a code
    #[serde(default = "default_true")]
    pub automatic: bool,

    /// May share an order with other promotions
    #[serde(default = "default_true")]
    pub combinable: bool,

    /// Discount calculator
    pub calculator: CalculatorFixture,

    /// Eligibility rules
    #[serde(default)]
    pub rules: Vec<RuleFixture>,
}

/// Calculator configuration from YAML fixtures
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalculatorFixture {
    /// Percentage of the item total (e.g., "10%" or "0.10")
    FlatPercentItemTotal {
        /// Percentage string
        percent: String,
    },

    /// Fixed amount (e.g., "5.00 GBP")
    FlatRate {
        /// Price string
        amount: String,
    },

    /// Tiered per-unit amounts
    FlexiRate {
        /// Price string for the first unit of each run
        first_item: String,

        /// Price string for the other units
        additional_item: String,

        /// Run length; zero for unlimited
        #[serde(default)]
        max_items: u32,
    },

    /// Fixed amount per unit
    PerItem {
        /// Price string
        amount: String,
    },

    /// The order's shipping total
    FreeShipping,
}

/// Item total comparison from YAML fixtures
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorFixture {
    /// Strictly greater than
    Gt,

    /// Greater than or equal
    #[default]
    Gte,
}

impl From<OperatorFixture> for ItemTotalOperator {
    fn from(operator: OperatorFixture) -> Self {
        match operator {
            OperatorFixture::Gt => ItemTotalOperator::GreaterThan,
            OperatorFixture::Gte => ItemTotalOperator::GreaterThanOrEqual,
        }
    }
}

/// Product match policy from YAML fixtures
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyFixture {
    /// Any listed product
    #[default]
    Any,

    /// Every listed product
    All,

    /// None of the listed products
    None,
}

impl From<PolicyFixture> for MatchPolicy {
    fn from(policy: PolicyFixture) -> Self {
        match policy {
            PolicyFixture::Any => MatchPolicy::Any,
            PolicyFixture::All => MatchPolicy::All,
            PolicyFixture::None => MatchPolicy::None,
        }
    }
}

/// Rule configuration from YAML fixtures
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleFixture {
    /// Item total threshold
    ItemTotal {
        /// Price string
        amount: String,

        /// Comparison operator
        #[serde(default)]
        operator: OperatorFixture,
    },

    /// Explicit product set
    Product {
        /// Product fixture keys
        products: Vec<String>,

        /// Match policy
        #[serde(default)]
        policy: PolicyFixture,
    },

    /// Catalog product group
    ProductGroup {
        /// Group fixture key
        group: String,

        /// Match policy
        #[serde(default)]
        policy: PolicyFixture,
    },

    /// Listed customers
    User {
        /// Customer ids
        customers: Vec<u64>,
    },

    /// Customers with no completed orders
    FirstOrder,
}
