//! Calculators
//!
//! Strategies that turn an order into a discount magnitude. Every calculator is a pure
//! function of the order: it never reads or writes the order's credits.

use decimal_percentage::Percentage;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    discounts::{DiscountError, percent_of_minor},
    orders::Order,
    pricing::TotalPriceError,
};

/// Errors raised while computing a discount amount.
#[derive(Debug, Error, PartialEq)]
pub enum CalculatorError {
    /// A configured amount is in a different currency from the order (configured, order).
    #[error("Calculator amount has currency {0}, but order has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// Percentage or minor unit arithmetic failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// The order's totals could not be computed.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),
}

/// Discount calculators.
#[derive(Debug, Clone)]
pub enum Calculator<'a> {
    /// A percentage of the order's item total, e.g. "10% off your order".
    FlatPercentItemTotal(Percentage),

    /// A fixed amount off the order, e.g. "£5 off".
    FlatRate(Money<'a, Currency>),

    /// Tiered per-unit pricing: `first_item` for the first unit of every run of `max_items`
    /// units and `additional_item` for the rest. A `max_items` of zero means one run covering
    /// the whole order.
    FlexiRate {
        /// Amount for the first unit of each run
        first_item: Money<'a, Currency>,

        /// Amount for each subsequent unit
        additional_item: Money<'a, Currency>,

        /// Run length; zero for unlimited
        max_items: u32,
    },

    /// A fixed amount for every unit on the order.
    PerItem(Money<'a, Currency>),

    /// The order's shipping total.
    FreeShipping,
}

impl<'a> Calculator<'a> {
    /// Compute the discount magnitude for an order.
    ///
    /// The result is a magnitude: callers negate it when turning it into a credit. A
    /// calculator configured with a negative amount yields a negative magnitude, which the
    /// engine rejects.
    ///
    /// # Errors
    ///
    /// Returns a `CalculatorError` if a configured amount is in another currency from the
    /// order, or if the arithmetic overflows.
    pub fn compute(&self, order: &Order<'a>) -> Result<Money<'a, Currency>, CalculatorError> {
        let currency = order.currency();

        let minor = match self {
            Calculator::FlatPercentItemTotal(percent) => {
                percent_of_minor(percent, order.item_total()?.to_minor_units())?
            }
            Calculator::FlatRate(amount) => minor_in(amount, currency)?,
            Calculator::FlexiRate {
                first_item,
                additional_item,
                max_items,
            } => flexi_rate(
                order.total_quantity(),
                minor_in(first_item, currency)?,
                minor_in(additional_item, currency)?,
                *max_items,
            )?,
            Calculator::PerItem(amount) => {
                let units = i64::try_from(order.total_quantity())
                    .map_err(|_err| DiscountError::Overflow)?;

                minor_in(amount, currency)?
                    .checked_mul(units)
                    .ok_or(DiscountError::Overflow)?
            }
            Calculator::FreeShipping => order.ship_total().to_minor_units(),
        };

        Ok(Money::from_minor(minor, currency))
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Calculator::FlatPercentItemTotal(_) => "flat_percent_item_total",
            Calculator::FlatRate(_) => "flat_rate",
            Calculator::FlexiRate { .. } => "flexi_rate",
            Calculator::PerItem(_) => "per_item",
            Calculator::FreeShipping => "free_shipping",
        }
    }
}

/// Return the amount in minor units, after checking it is in the order's currency.
fn minor_in(amount: &Money<'_, Currency>, currency: &Currency) -> Result<i64, CalculatorError> {
    if amount.currency() == currency {
        Ok(amount.to_minor_units())
    } else {
        Err(CalculatorError::CurrencyMismatch(
            amount.currency().iso_alpha_code,
            currency.iso_alpha_code,
        ))
    }
}

/// Sum the flexi rate over `units` units without walking them one by one.
///
/// Unit `i` (zero-based) is charged at the first-item rate when it starts a run, that is when
/// `max_items == 0 && i == 0` or `max_items > 0 && i % max_items == 0`.
fn flexi_rate(
    units: u64,
    first_item: i64,
    additional_item: i64,
    max_items: u32,
) -> Result<i64, DiscountError> {
    if units == 0 {
        return Ok(0);
    }

    let runs = match u64::from(max_items) {
        0 => 1,
        max => units.div_ceil(max),
    };

    let firsts = i64::try_from(runs).map_err(|_err| DiscountError::Overflow)?;
    let additionals =
        i64::try_from(units.saturating_sub(runs)).map_err(|_err| DiscountError::Overflow)?;

    first_item
        .checked_mul(firsts)
        .zip(additional_item.checked_mul(additionals))
        .and_then(|(firsts, additionals)| firsts.checked_add(additionals))
        .ok_or(DiscountError::Overflow)
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use crate::{
        orders::{OrderError, line_items::LineItem},
        products::ProductKey,
    };

    use super::*;

    fn order(lines: &[(i64, u32)]) -> Result<Order<'static>, OrderError> {
        Order::with_line_items(
            lines.iter().map(|&(minor, quantity)| {
                LineItem::new(ProductKey::default(), Money::from_minor(minor, GBP), quantity)
            }),
            GBP,
        )
    }

    /// The unit-by-unit definition, for comparison with the closed form.
    fn flexi_rate_by_unit(units: u64, first: i64, additional: i64, max: u32) -> i64 {
        let max = u64::from(max);

        (0..units)
            .map(|i| {
                if (max == 0 && i == 0) || (max > 0 && i % max == 0) {
                    first
                } else {
                    additional
                }
            })
            .sum()
    }

    #[test]
    fn flat_percent_item_total() -> TestResult {
        let order = order(&[(60_00, 1), (40_00, 1)])?;
        let calculator = Calculator::FlatPercentItemTotal(Percentage::from(0.10));

        assert_eq!(calculator.compute(&order)?, Money::from_minor(10_00, GBP));

        Ok(())
    }

    #[test]
    fn flat_rate_ignores_order_contents() -> TestResult {
        let order = order(&[(1_00, 1)])?;
        let calculator = Calculator::FlatRate(Money::from_minor(5_00, GBP));

        assert_eq!(calculator.compute(&order)?, Money::from_minor(5_00, GBP));

        Ok(())
    }

    #[test]
    fn per_item_counts_units() -> TestResult {
        let order = order(&[(10_00, 3), (5_00, 2)])?;
        let calculator = Calculator::PerItem(Money::from_minor(50, GBP));

        assert_eq!(calculator.compute(&order)?, Money::from_minor(2_50, GBP));

        Ok(())
    }

    #[test]
    fn flexi_rate_charges_first_item_per_run() -> TestResult {
        let order = order(&[(10_00, 3), (5_00, 2)])?;
        let calculator = Calculator::FlexiRate {
            first_item: Money::from_minor(1_00, GBP),
            additional_item: Money::from_minor(50, GBP),
            max_items: 2,
        };

        // Units 0, 2 and 4 start runs: 3 × £1.00 + 2 × £0.50
        assert_eq!(calculator.compute(&order)?, Money::from_minor(4_00, GBP));

        Ok(())
    }

    #[test]
    fn flexi_rate_matches_unit_by_unit_definition() -> TestResult {
        for units in 0..12 {
            for max in 0..5 {
                assert_eq!(
                    flexi_rate(units, 100, 30, max)?,
                    flexi_rate_by_unit(units, 100, 30, max),
                    "units={units} max={max}"
                );
            }
        }

        Ok(())
    }

    #[test]
    fn free_shipping_returns_ship_total() -> TestResult {
        let mut order = order(&[(10_00, 1)])?;
        order.set_ship_total(Money::from_minor(4_99, GBP))?;

        assert_eq!(
            Calculator::FreeShipping.compute(&order)?,
            Money::from_minor(4_99, GBP)
        );

        Ok(())
    }

    #[test]
    fn currency_mismatch_is_an_error() -> TestResult {
        let order = order(&[(10_00, 1)])?;
        let calculator = Calculator::FlatRate(Money::from_minor(5_00, USD));

        assert_eq!(
            calculator.compute(&order),
            Err(CalculatorError::CurrencyMismatch(
                USD.iso_alpha_code,
                GBP.iso_alpha_code
            ))
        );

        Ok(())
    }

    #[test]
    fn per_item_overflow_is_an_error() -> TestResult {
        let order = order(&[(1, 3)])?;
        let calculator = Calculator::PerItem(Money::from_minor(i64::MAX, GBP));

        assert_eq!(
            calculator.compute(&order),
            Err(CalculatorError::Discount(DiscountError::Overflow))
        );

        Ok(())
    }

    #[test]
    fn kind_names_each_calculator() {
        let kinds = [
            Calculator::FlatPercentItemTotal(Percentage::from(0.10)),
            Calculator::FlatRate(Money::from_minor(1_00, GBP)),
            Calculator::FlexiRate {
                first_item: Money::from_minor(1_00, GBP),
                additional_item: Money::from_minor(50, GBP),
                max_items: 0,
            },
            Calculator::PerItem(Money::from_minor(25, GBP)),
            Calculator::FreeShipping,
        ]
        .iter()
        .map(Calculator::kind)
        .collect::<Vec<_>>();

        assert_eq!(
            kinds,
            [
                "flat_percent_item_total",
                "flat_rate",
                "flexi_rate",
                "per_item",
                "free_shipping"
            ]
        );
    }
}
