//! Line Items

use rusty_money::{Money, iso::Currency};

use crate::{pricing::TotalPriceError, products::ProductKey};

/// A product variant on an order, with its unit price and quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct LineItem<'a> {
    product: ProductKey,
    price: Money<'a, Currency>,
    quantity: u32,
}

impl<'a> LineItem<'a> {
    /// Creates a new line item.
    pub fn new(product: ProductKey, price: Money<'a, Currency>, quantity: u32) -> Self {
        Self {
            product,
            price,
            quantity,
        }
    }

    /// Returns the product of the line item
    pub fn product(&self) -> ProductKey {
        self.product
    }

    /// Returns the unit price of the line item
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// Returns the quantity ordered
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    /// Returns the line amount, price × quantity.
    ///
    /// # Errors
    ///
    /// Returns [`TotalPriceError::Overflow`] if the amount does not fit in minor units.
    pub fn amount(&self) -> Result<Money<'a, Currency>, TotalPriceError> {
        let minor = self
            .price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(TotalPriceError::Overflow)?;

        Ok(Money::from_minor(minor, self.price.currency()))
    }
}
