//! Receipt
//!
//! Console rendering of an order after reconciliation: line items, adjustments and totals.

use std::{fmt::Write, io, ops::Range};

use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    orders::{
        Order, OrderTotals,
        adjustments::{Adjustment, CreditOrigin},
    },
    pricing::{TotalPriceError, total_amount},
    products::{Catalog, ProductKey},
};

/// Errors that can occur when building a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Error calculating a line item amount.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),

    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Error finding a product in the catalog.
    #[error("Missing product")]
    MissingProduct(ProductKey),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Where an adjustment row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentSource {
    /// Automatic promotion credit
    Promotion,

    /// Coupon credit
    Coupon,

    /// Any other adjustment
    Charge,
}

impl AdjustmentSource {
    fn label(self) -> &'static str {
        match self {
            AdjustmentSource::Promotion => "Promotion",
            AdjustmentSource::Coupon => "Coupon",
            AdjustmentSource::Charge => "Charge",
        }
    }
}

/// A line item row.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRow<'a> {
    /// Product name
    pub name: String,

    /// Quantity
    pub quantity: u32,

    /// Unit price
    pub price: Money<'a, Currency>,

    /// Line amount
    pub amount: Money<'a, Currency>,
}

/// An adjustment row.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentRow<'a> {
    /// Adjustment label
    pub label: String,

    /// Adjustment source
    pub source: AdjustmentSource,

    /// Signed amount
    pub amount: Money<'a, Currency>,

    /// Whether the adjustment still applies
    pub applicable: bool,
}

/// Snapshot of an order for display.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    lines: SmallVec<[LineRow<'a>; 8]>,
    adjustments: SmallVec<[AdjustmentRow<'a>; 4]>,
    totals: OrderTotals<'a>,
    currency: &'static Currency,
}

impl<'a> Receipt<'a> {
    /// Build a receipt from an order's line items, adjustments and last computed totals.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if a product is missing from the catalog or a line amount
    /// overflows.
    pub fn from_order(order: &Order<'a>, catalog: &Catalog<'_>) -> Result<Self, ReceiptError> {
        let lines = order
            .line_items()
            .iter()
            .map(|line_item| -> Result<LineRow<'a>, ReceiptError> {
                let product = catalog
                    .product(line_item.product())
                    .ok_or(ReceiptError::MissingProduct(line_item.product()))?;

                Ok(LineRow {
                    name: product.name.clone(),
                    quantity: line_item.quantity(),
                    price: *line_item.price(),
                    amount: line_item.amount()?,
                })
            })
            .collect::<Result<SmallVec<_>, _>>()?;

        let mut adjustments: SmallVec<[AdjustmentRow<'a>; 4]> = order
            .adjustments()
            .map(|(_, adjustment)| AdjustmentRow {
                label: adjustment.label().to_string(),
                source: match adjustment {
                    Adjustment::Credit(credit) if credit.origin() == CreditOrigin::Coupon => {
                        AdjustmentSource::Coupon
                    }
                    Adjustment::Credit(_) => AdjustmentSource::Promotion,
                    Adjustment::Charge(_) => AdjustmentSource::Charge,
                },
                amount: *adjustment.amount(),
                applicable: adjustment.is_applicable(),
            })
            .collect();

        adjustments.sort_by(|a, b| a.label.cmp(&b.label));

        Ok(Self {
            lines,
            adjustments,
            totals: *order.totals(),
            currency: order.currency(),
        })
    }

    /// Line item rows
    pub fn lines(&self) -> &[LineRow<'a>] {
        &self.lines
    }

    /// Adjustment rows, sorted by label
    pub fn adjustments(&self) -> &[AdjustmentRow<'a>] {
        &self.adjustments
    }

    /// Order totals
    pub fn totals(&self) -> &OrderTotals<'a> {
        &self.totals
    }

    /// Currency used for all monetary values
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Total value of promotion and coupon credits, as a positive amount.
    ///
    /// # Errors
    ///
    /// Returns a [`TotalPriceError`] if the sum overflows.
    pub fn savings(&self) -> Result<Money<'a, Currency>, TotalPriceError> {
        let credits = total_amount(
            self.adjustments
                .iter()
                .filter(|row| row.source != AdjustmentSource::Charge)
                .map(|row| row.amount),
            self.currency,
        )?;

        Ok(Money::from_minor(-credits.to_minor_units(), self.currency))
    }

    /// Prints the receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Qty", "Unit Price", "Amount"]);

        for (idx, line) in self.lines.iter().enumerate() {
            builder.push_record([
                format!("#{}", idx + 1),
                line.name.clone(),
                line.quantity.to_string(),
                format!("{}", line.price),
                format!("{}", line.amount),
            ]);
        }

        write_table(&mut out, builder, 2..5, &[])?;

        if !self.adjustments.is_empty() {
            let mut builder = Builder::default();
            let mut inapplicable_rows: SmallVec<[usize; 4]> = SmallVec::new();

            builder.push_record(["", "Adjustment", "Source", "Amount"]);

            for (idx, row) in self.adjustments.iter().enumerate() {
                if !row.applicable {
                    inapplicable_rows.push(idx + 1);
                }

                builder.push_record([
                    format!("#{}", idx + 1),
                    row.label.clone(),
                    row.source.label().to_string(),
                    format!("{}", row.amount),
                ]);
            }

            write_table(&mut out, builder, 3..4, &inapplicable_rows)?;
        }

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let savings = self.savings()?;

        let rows = [
            (" Subtotal:".to_string(), format!("{}  ", self.totals.item_total)),
            (
                " Adjustments:".to_string(),
                format!("{}  ", self.totals.adjustment_total),
            ),
            (
                " \x1b[1mTotal:\x1b[0m".to_string(),
                format!("\x1b[1m{}  \x1b[0m", self.totals.total),
            ),
            (" Paid:".to_string(), format!("{}  ", self.totals.payment_total)),
            (" Savings:".to_string(), format!("{savings}  ")),
        ];

        let label_width = rows
            .iter()
            .map(|(label, _)| visible_width(label))
            .max()
            .unwrap_or_default();

        let value_width = rows
            .iter()
            .map(|(_, value)| visible_width(value))
            .max()
            .unwrap_or_default();

        for (label, value) in &rows {
            write_summary_line(out, label, value, label_width, value_width)?;
        }

        writeln!(out).map_err(|_err| ReceiptError::IO)
    }
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    amount_columns: Range<usize>,
    grey_rows: &[usize],
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(amount_columns), Alignment::right());

    let columns = table.count_columns();

    for &row in grey_rows {
        for col in 0..columns {
            table.modify((row, col), color_dark_grey());
        }
    }

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes.
///
/// Box-drawing characters occupy the Unicode range U+2500..U+257F.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

/// ANSI dark grey foreground.
fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}
