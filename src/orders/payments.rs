//! Payments

use rusty_money::{Money, iso::Currency};

/// Payment lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    /// Entered during checkout, not yet processed.
    Checkout,

    /// Being processed by the gateway.
    Processing,

    /// Authorised but not captured.
    Pending,

    /// Captured.
    Completed,

    /// Declined or errored.
    Failed,

    /// Cancelled.
    Void,
}

/// A payment recorded against an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment<'a> {
    amount: Money<'a, Currency>,
    state: PaymentState,
}

impl<'a> Payment<'a> {
    /// Create a payment in the given state.
    pub fn new(amount: Money<'a, Currency>, state: PaymentState) -> Self {
        Self { amount, state }
    }

    /// Payment amount
    pub fn amount(&self) -> &Money<'a, Currency> {
        &self.amount
    }

    /// Payment state
    pub fn state(&self) -> PaymentState {
        self.state
    }

    /// Move the payment to a new state.
    pub fn set_state(&mut self, state: PaymentState) {
        self.state = state;
    }

    /// Whether the payment counts towards the order's payment total.
    pub fn is_completed(&self) -> bool {
        self.state == PaymentState::Completed
    }
}
