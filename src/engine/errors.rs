//! Engine errors

use thiserror::Error;

use crate::{
    calculators::CalculatorError, pricing::TotalPriceError, promotions::PromotionKey,
    rules::RuleError,
};

/// A reconciliation pass failed. The order is left exactly as it was before the pass.
#[derive(Debug, Error, PartialEq)]
pub enum CalculationError {
    /// A promotion's calculator failed.
    #[error("Promotion {name} failed to calculate its discount: {source}")]
    Calculator {
        /// Offending promotion
        promotion: PromotionKey,

        /// Promotion name
        name: String,

        /// Underlying failure
        source: CalculatorError,
    },

    /// A promotion's calculator produced a negative magnitude.
    #[error("Promotion {name} calculated a negative discount of {amount} minor units")]
    NegativeAmount {
        /// Offending promotion
        promotion: PromotionKey,

        /// Promotion name
        name: String,

        /// The magnitude that was returned
        amount: i64,
    },

    /// One of a promotion's rules failed to evaluate.
    #[error("Promotion {name} has a rule that failed to evaluate: {source}")]
    Rule {
        /// Offending promotion
        promotion: PromotionKey,

        /// Promotion name
        name: String,

        /// Underlying failure
        source: RuleError,
    },

    /// Order totals could not be computed.
    #[error(transparent)]
    Totals(#[from] TotalPriceError),
}

/// A coupon could not be redeemed. The order is left unmodified.
#[derive(Debug, Error, PartialEq)]
pub enum RedemptionError {
    /// No promotion has this code.
    #[error("Coupon code {0} not found")]
    CodeNotFound(String),

    /// The coupon's promotion already has a credit on the order.
    #[error("Coupon code {0} has already been applied")]
    AlreadyApplied(String),

    /// The coupon's rules do not hold, and the engine is configured to check them.
    #[error("Order is not eligible for coupon code {0}")]
    Ineligible(String),

    /// The coupon is worth nothing on this order.
    #[error("Coupon code {0} gives no discount on this order")]
    NothingToDiscount(String),

    /// Calculating the coupon's discount failed.
    #[error(transparent)]
    Calculation(#[from] CalculationError),
}

/// Saving an order failed. The order is left unmodified.
#[derive(Debug, Error, PartialEq)]
pub enum SaveError {
    /// The pending coupon code could not be redeemed.
    #[error(transparent)]
    Redemption(#[from] RedemptionError),

    /// Reconciliation failed.
    #[error(transparent)]
    Calculation(#[from] CalculationError),
}
