//! Orders

use rusty_money::{Money, iso::Currency};
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
    orders::{
        adjustments::{Adjustment, AdjustmentKey, Charge, Credit},
        line_items::LineItem,
        payments::Payment,
    },
    pricing::{TotalPriceError, total_amount},
    products::ProductKey,
};

pub mod adjustments;
pub mod line_items;
pub mod payments;

/// Errors related to order construction and mutation.
#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    /// An amount's currency differs from the order currency (amount currency, order currency).
    #[error("Amount has currency {0}, but order has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// A line item index was out of range.
    #[error("Line item {0} not found")]
    LineItemNotFound(usize),

    /// A payment index was out of range.
    #[error("Payment {0} not found")]
    PaymentNotFound(usize),

    /// Line items must have at least one unit.
    #[error("Line item quantity must be at least one")]
    ZeroQuantity,
}

/// Customer identifier, as assigned by the surrounding store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomerId(pub u64);

/// The customer an order belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Customer {
    /// Customer identifier
    pub id: CustomerId,

    /// Number of orders this customer has already completed
    pub completed_orders: u32,
}

/// Derived order totals, as of the last recalculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals<'a> {
    /// Sum of line item amounts
    pub item_total: Money<'a, Currency>,

    /// Sum of completed payment amounts
    pub payment_total: Money<'a, Currency>,

    /// Sum of all adjustment amounts, credits included
    pub adjustment_total: Money<'a, Currency>,

    /// `item_total + adjustment_total`
    pub total: Money<'a, Currency>,
}

impl<'a> OrderTotals<'a> {
    fn zero(currency: &'a Currency) -> Self {
        let zero = Money::from_minor(0, currency);

        Self {
            item_total: zero,
            payment_total: zero,
            adjustment_total: zero,
            total: zero,
        }
    }
}

/// A shopping order.
#[derive(Debug, Clone)]
pub struct Order<'a> {
    currency: &'static Currency,
    line_items: Vec<LineItem<'a>>,
    payments: Vec<Payment<'a>>,
    adjustments: SlotMap<AdjustmentKey, Adjustment<'a>>,
    customer: Option<Customer>,
    ship_total: Money<'a, Currency>,
    coupon_code: Option<String>,
    totals: OrderTotals<'a>,
}

impl<'a> Order<'a> {
    /// Create an empty order in the given currency.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Order {
            currency,
            line_items: Vec::new(),
            payments: Vec::new(),
            adjustments: SlotMap::with_key(),
            customer: None,
            ship_total: Money::from_minor(0, currency),
            coupon_code: None,
            totals: OrderTotals::zero(currency),
        }
    }

    /// Create an order with the given line items.
    ///
    /// # Errors
    ///
    /// Returns an `OrderError` if a line item is in another currency or has no units.
    pub fn with_line_items(
        line_items: impl IntoIterator<Item = LineItem<'a>>,
        currency: &'static Currency,
    ) -> Result<Self, OrderError> {
        let mut order = Order::new(currency);

        for line_item in line_items {
            order.add_line_item(line_item)?;
        }

        Ok(order)
    }

    /// Get the currency of the order.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn ensure_currency(&self, amount: &Money<'_, Currency>) -> Result<(), OrderError> {
        if amount.currency() == self.currency {
            Ok(())
        } else {
            Err(OrderError::CurrencyMismatch(
                amount.currency().iso_alpha_code,
                self.currency.iso_alpha_code,
            ))
        }
    }

    /// Add a line item.
    ///
    /// # Errors
    ///
    /// Returns an `OrderError` if the line item is in another currency or has no units.
    pub fn add_line_item(&mut self, line_item: LineItem<'a>) -> Result<(), OrderError> {
        self.ensure_currency(line_item.price())?;

        if line_item.quantity() == 0 {
            return Err(OrderError::ZeroQuantity);
        }

        self.line_items.push(line_item);

        Ok(())
    }

    /// Remove a line item by index.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::LineItemNotFound` if the index is out of range.
    pub fn remove_line_item(&mut self, index: usize) -> Result<LineItem<'a>, OrderError> {
        if index >= self.line_items.len() {
            return Err(OrderError::LineItemNotFound(index));
        }

        Ok(self.line_items.remove(index))
    }

    /// Change the quantity of a line item.
    ///
    /// # Errors
    ///
    /// Returns an `OrderError` if the index is out of range or the quantity is zero.
    pub fn set_quantity(&mut self, index: usize, quantity: u32) -> Result<(), OrderError> {
        if quantity == 0 {
            return Err(OrderError::ZeroQuantity);
        }

        self.line_items
            .get_mut(index)
            .ok_or(OrderError::LineItemNotFound(index))?
            .set_quantity(quantity);

        Ok(())
    }

    /// Line items, in the order they were added.
    pub fn line_items(&self) -> &[LineItem<'a>] {
        &self.line_items
    }

    /// Products on the order, one entry per line item.
    pub fn products(&self) -> impl Iterator<Item = ProductKey> + '_ {
        self.line_items.iter().map(LineItem::product)
    }

    /// Total number of units across all line items.
    pub fn total_quantity(&self) -> u64 {
        self.line_items
            .iter()
            .map(|line_item| u64::from(line_item.quantity()))
            .sum()
    }

    /// Record a payment.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::CurrencyMismatch` if the payment is in another currency.
    pub fn add_payment(&mut self, payment: Payment<'a>) -> Result<(), OrderError> {
        self.ensure_currency(payment.amount())?;
        self.payments.push(payment);

        Ok(())
    }

    /// Payments, in the order they were recorded.
    pub fn payments(&self) -> &[Payment<'a>] {
        &self.payments
    }

    /// Get a payment for a state change.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::PaymentNotFound` if the index is out of range.
    pub fn payment_mut(&mut self, index: usize) -> Result<&mut Payment<'a>, OrderError> {
        self.payments
            .get_mut(index)
            .ok_or(OrderError::PaymentNotFound(index))
    }

    /// Add a non-promotion charge.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::CurrencyMismatch` if the charge is in another currency.
    pub fn add_charge(&mut self, charge: Charge<'a>) -> Result<AdjustmentKey, OrderError> {
        self.ensure_currency(charge.amount())?;

        Ok(self.adjustments.insert(Adjustment::Charge(charge)))
    }

    /// Look up an adjustment.
    pub fn adjustment(&self, key: AdjustmentKey) -> Option<&Adjustment<'a>> {
        self.adjustments.get(key)
    }

    /// Get a charge for modification.
    pub fn charge_mut(&mut self, key: AdjustmentKey) -> Option<&mut Charge<'a>> {
        match self.adjustments.get_mut(key) {
            Some(Adjustment::Charge(charge)) => Some(charge),
            _ => None,
        }
    }

    /// Remove an adjustment. This is how coupon credits are taken off an order.
    pub fn remove_adjustment(&mut self, key: AdjustmentKey) -> Option<Adjustment<'a>> {
        self.adjustments.remove(key)
    }

    /// Iterate over all adjustments.
    pub fn adjustments(&self) -> impl Iterator<Item = (AdjustmentKey, &Adjustment<'a>)> {
        self.adjustments.iter()
    }

    /// Iterate over promotion credits, automatic and coupon alike.
    pub fn credits(&self) -> impl Iterator<Item = (AdjustmentKey, &Credit<'a>)> {
        self.adjustments
            .iter()
            .filter_map(|(key, adjustment)| adjustment.as_credit().map(|credit| (key, credit)))
    }

    pub(crate) fn insert_credit(&mut self, credit: Credit<'a>) -> AdjustmentKey {
        self.adjustments.insert(Adjustment::Credit(credit))
    }

    pub(crate) fn credit_mut(&mut self, key: AdjustmentKey) -> Option<&mut Credit<'a>> {
        self.adjustments
            .get_mut(key)
            .and_then(Adjustment::as_credit_mut)
    }

    /// The customer the order belongs to, if any. Guest orders have none.
    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    /// Set or clear the order's customer.
    pub fn set_customer(&mut self, customer: Option<Customer>) {
        self.customer = customer;
    }

    /// Shipping total, as quoted by the shipping collaborator.
    pub fn ship_total(&self) -> &Money<'a, Currency> {
        &self.ship_total
    }

    /// Set the shipping total.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::CurrencyMismatch` if the amount is in another currency.
    pub fn set_ship_total(&mut self, ship_total: Money<'a, Currency>) -> Result<(), OrderError> {
        self.ensure_currency(&ship_total)?;
        self.ship_total = ship_total;

        Ok(())
    }

    /// Coupon code waiting to be redeemed on the next save.
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    /// Set a coupon code to redeem on the next save.
    pub fn set_coupon_code(&mut self, code: Option<String>) {
        self.coupon_code = code;
    }

    pub(crate) fn take_coupon_code(&mut self) -> Option<String> {
        self.coupon_code.take()
    }

    /// Sum of line item amounts, computed from the current line items.
    ///
    /// # Errors
    ///
    /// Returns a `TotalPriceError` if the sum overflows.
    pub fn item_total(&self) -> Result<Money<'a, Currency>, TotalPriceError> {
        let amounts = self
            .line_items
            .iter()
            .map(LineItem::amount)
            .collect::<Result<Vec<_>, _>>()?;

        total_amount(amounts, self.currency)
    }

    /// Totals as of the last recalculation.
    pub fn totals(&self) -> &OrderTotals<'a> {
        &self.totals
    }

    /// Recompute derived totals from line items, payments and adjustments.
    ///
    /// With `force_adjustment_recalculation`, adjustments that are no longer applicable are
    /// removed first.
    ///
    /// # Errors
    ///
    /// Returns a `TotalPriceError` if any sum overflows.
    pub fn update_totals(
        &mut self,
        force_adjustment_recalculation: bool,
    ) -> Result<&OrderTotals<'a>, TotalPriceError> {
        let payment_total = total_amount(
            self.payments
                .iter()
                .filter(|payment| payment.is_completed())
                .map(|payment| *payment.amount()),
            self.currency,
        )?;

        let item_total = self.item_total()?;

        if force_adjustment_recalculation {
            self.adjustments
                .retain(|_, adjustment| adjustment.is_applicable());
        }

        let adjustment_total = total_amount(
            self.adjustments.values().map(|adjustment| *adjustment.amount()),
            self.currency,
        )?;

        let total = item_total.add(adjustment_total)?;

        self.totals = OrderTotals {
            item_total,
            payment_total,
            adjustment_total,
            total,
        };

        Ok(&self.totals)
    }
}
