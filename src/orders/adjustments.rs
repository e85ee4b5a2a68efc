//! Adjustments
//!
//! Everything that moves an order's total away from its item total: promotion credits
//! (always zero or negative) and charges entered by other parts of the system.

use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;

use crate::promotions::PromotionKey;

new_key_type! {
    /// Adjustment Key
    pub struct AdjustmentKey;
}

/// How a credit came to be on the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOrigin {
    /// Created and maintained by reconciliation.
    Automatic,

    /// Created by redeeming a coupon code. Reconciliation leaves it alone.
    Coupon,
}

/// A discount line item owned by an order.
#[derive(Debug, Clone, PartialEq)]
pub struct Credit<'a> {
    promotion: PromotionKey,
    origin: CreditOrigin,
    amount: Money<'a, Currency>,
    label: String,
}

impl<'a> Credit<'a> {
    /// Create a credit worth `magnitude` minor units off.
    pub(crate) fn from_magnitude(
        promotion: PromotionKey,
        origin: CreditOrigin,
        magnitude: i64,
        currency: &'a Currency,
        label: impl Into<String>,
    ) -> Self {
        Self {
            promotion,
            origin,
            amount: Money::from_minor(-magnitude, currency),
            label: label.into(),
        }
    }

    /// The promotion this credit came from.
    pub fn promotion(&self) -> PromotionKey {
        self.promotion
    }

    /// Whether the credit is automatic or came from a coupon.
    pub fn origin(&self) -> CreditOrigin {
        self.origin
    }

    /// The credit amount. Never positive.
    pub fn amount(&self) -> &Money<'a, Currency> {
        &self.amount
    }

    /// Display label, the promotion name at the time the credit was created.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether reconciliation owns this credit.
    pub fn is_automatic(&self) -> bool {
        self.origin == CreditOrigin::Automatic
    }

    /// Overwrite the amount with `magnitude` minor units off, returning whether it changed.
    pub(crate) fn set_magnitude(&mut self, magnitude: i64) -> bool {
        let amount = -magnitude;

        if self.amount.to_minor_units() == amount {
            return false;
        }

        self.amount = Money::from_minor(amount, self.amount.currency());

        true
    }
}

/// A non-promotion adjustment, such as a shipping or tax line.
#[derive(Debug, Clone, PartialEq)]
pub struct Charge<'a> {
    label: String,
    amount: Money<'a, Currency>,
    applicable: bool,
}

impl<'a> Charge<'a> {
    /// Create an applicable charge.
    pub fn new(label: impl Into<String>, amount: Money<'a, Currency>) -> Self {
        Self {
            label: label.into(),
            amount,
            applicable: true,
        }
    }

    /// Charge label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Charge amount
    pub fn amount(&self) -> &Money<'a, Currency> {
        &self.amount
    }

    /// Whether the charge still applies to the order.
    pub fn is_applicable(&self) -> bool {
        self.applicable
    }

    /// Mark the charge as applicable or not. Non-applicable charges are dropped the next
    /// time totals are recalculated with forced adjustment recalculation.
    pub fn set_applicable(&mut self, applicable: bool) {
        self.applicable = applicable;
    }
}

/// An order adjustment.
#[derive(Debug, Clone, PartialEq)]
pub enum Adjustment<'a> {
    /// Promotion credit
    Credit(Credit<'a>),

    /// Any other charge
    Charge(Charge<'a>),
}

impl<'a> Adjustment<'a> {
    /// Adjustment amount
    pub fn amount(&self) -> &Money<'a, Currency> {
        match self {
            Adjustment::Credit(credit) => credit.amount(),
            Adjustment::Charge(charge) => charge.amount(),
        }
    }

    /// Adjustment label
    pub fn label(&self) -> &str {
        match self {
            Adjustment::Credit(credit) => credit.label(),
            Adjustment::Charge(charge) => charge.label(),
        }
    }

    /// Credits are always applicable; reconciliation decides whether they stay.
    pub fn is_applicable(&self) -> bool {
        match self {
            Adjustment::Credit(_) => true,
            Adjustment::Charge(charge) => charge.is_applicable(),
        }
    }

    /// Return the credit, if this adjustment is one.
    pub fn as_credit(&self) -> Option<&Credit<'a>> {
        match self {
            Adjustment::Credit(credit) => Some(credit),
            Adjustment::Charge(_) => None,
        }
    }

    pub(crate) fn as_credit_mut(&mut self) -> Option<&mut Credit<'a>> {
        match self {
            Adjustment::Credit(credit) => Some(credit),
            Adjustment::Charge(_) => None,
        }
    }
}
