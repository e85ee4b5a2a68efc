//! Order Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::orders::payments::PaymentState;

/// Wrapper for orders in YAML
#[derive(Debug, Deserialize)]
pub struct OrdersFixture {
    /// Map of order key -> order fixture
    pub orders: FxHashMap<String, OrderFixture>,
}

/// Order fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderFixture {
    /// Line items, priced from their products
    pub line_items: Vec<LineItemFixture>,

    /// Payments
    #[serde(default)]
    pub payments: Vec<PaymentFixture>,

    /// Non-promotion adjustments
    #[serde(default)]
    pub charges: Vec<ChargeFixture>,

    /// Customer, absent for guest orders
    #[serde(default)]
    pub customer: Option<CustomerFixture>,

    /// Shipping total (e.g., "4.99 GBP")
    #[serde(default)]
    pub ship_total: Option<String>,

    /// Coupon code entered at checkout
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Line item fixture
#[derive(Debug, Deserialize)]
pub struct LineItemFixture {
    /// Product fixture key
    pub product: String,

    /// Quantity
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Payment fixture
#[derive(Debug, Deserialize)]
pub struct PaymentFixture {
    /// Price string
    pub amount: String,

    /// Payment state
    pub state: PaymentStateFixture,
}

/// Payment state from YAML fixtures
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStateFixture {
    /// Checkout
    Checkout,

    /// Processing
    Processing,

    /// Pending
    Pending,

    /// Completed
    Completed,

    /// Failed
    Failed,

    /// Void
    Void,
}

impl From<PaymentStateFixture> for PaymentState {
    fn from(state: PaymentStateFixture) -> Self {
        match state {
            PaymentStateFixture::Checkout => PaymentState::Checkout,
            PaymentStateFixture::Processing => PaymentState::Processing,
            PaymentStateFixture::Pending => PaymentState::Pending,
            PaymentStateFixture::Completed => PaymentState::Completed,
            PaymentStateFixture::Failed => PaymentState::Failed,
            PaymentStateFixture::Void => PaymentState::Void,
        }
    }
}

/// Charge fixture
#[derive(Debug, Deserialize)]
pub struct ChargeFixture {
    /// Label
    pub label: String,

    /// Price string
    pub amount: String,

    /// Whether the charge still applies
    #[serde(default = "default_applicable")]
    pub applicable: bool,
}

const fn default_applicable() -> bool {
    true
}

/// Customer fixture
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CustomerFixture {
    /// Customer id
    pub id: u64,

    /// Completed orders so far
    #[serde(default)]
    pub completed_orders: u32,
}
