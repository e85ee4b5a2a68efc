//! Discount utilities
//!
//! Percentage and clamping helpers shared by the calculators and the reconciler.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

/// Errors specific to discount arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Minor unit arithmetic overflowed.
    #[error("discount arithmetic overflowed")]
    Overflow,
}

/// Calculate the amount in minor units that `percent` represents of `minor`.
///
/// Rounds half away from zero, so 12.5p becomes 13p.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows or cannot be
/// represented as an `i64`.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Cap a discount magnitude so it never exceeds the order's item total.
///
/// A negative ceiling (an order whose line items sum below zero) caps at zero.
pub fn cap_to_item_total(magnitude: i64, item_total: i64) -> i64 {
    magnitude.min(item_total.max(0))
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percent_of_minor_rounds_half_away_from_zero() -> TestResult {
        let percent = Percentage::from(0.125);

        assert_eq!(percent_of_minor(&percent, 100)?, 13);
        assert_eq!(percent_of_minor(&percent, -100)?, -13);

        Ok(())
    }

    #[test]
    fn percent_of_minor_ten_percent_of_one_hundred_pounds() -> TestResult {
        let percent = Percentage::from(0.10);

        assert_eq!(percent_of_minor(&percent, 100_00)?, 10_00);

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let percent = Percentage::from(2.0);
        let result = percent_of_minor(&percent, i64::MAX);

        assert_eq!(result, Err(DiscountError::PercentConversion));
    }

    #[test]
    fn cap_to_item_total_limits_large_discounts() {
        assert_eq!(cap_to_item_total(500, 300), 300);
        assert_eq!(cap_to_item_total(200, 300), 200);
        assert_eq!(cap_to_item_total(200, -50), 0);
    }
}
