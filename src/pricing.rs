//! Pricing

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors that can occur while summing order amounts.
#[derive(Debug, Error, PartialEq)]
pub enum TotalPriceError {
    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Minor unit arithmetic overflowed.
    #[error("amount overflowed")]
    Overflow,
}

/// Sum a sequence of amounts in the given currency.
///
/// An empty sequence sums to zero, so the currency has to be supplied rather than inferred.
///
/// # Errors
///
/// - [`TotalPriceError::Money`]: an amount was in another currency, or the sum overflowed.
pub fn total_amount<'a, I>(
    amounts: I,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, TotalPriceError>
where
    I: IntoIterator<Item = Money<'a, Currency>>,
{
    let total = amounts
        .into_iter()
        .try_fold(Money::from_minor(0, currency), |acc, amount| acc.add(amount))?;

    Ok(total)
}
