//! Credit Reconciler
//!
//! Brings an order's automatic credits back in line with the promotions it qualifies for.
//!
//! A pass runs in two phases over a draft copy of the order:
//!
//! 1. Every automatic credit is re-checked. Credits whose promotion is no longer eligible
//!    (or no longer exists) are removed; the rest are recalculated, and written back only
//!    when the amount actually changed.
//! 2. Newly eligible automatic promotions are added, subject to combinability, in ascending
//!    promotion key order.
//!
//! Totals are then recomputed. The draft replaces the caller's order only if the whole pass
//! succeeds.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{Span, debug, trace, warn};

use crate::{
    discounts::cap_to_item_total,
    engine::{errors::CalculationError, selector::PromotionSelector},
    orders::{
        Order,
        adjustments::{AdjustmentKey, Credit, CreditOrigin},
    },
    promotions::{Promotion, PromotionKey, registry::PromotionRegistry},
};

/// Credit writes made by a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Credits whose amount was rewritten
    pub updated: SmallVec<[AdjustmentKey; 4]>,

    /// Credits removed from the order
    pub removed: SmallVec<[AdjustmentKey; 4]>,

    /// Credits added to the order
    pub created: SmallVec<[AdjustmentKey; 4]>,
}

impl ReconciliationReport {
    /// Whether the pass left every credit untouched.
    pub fn is_unchanged(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty() && self.created.is_empty()
    }
}

/// Compute a promotion's discount magnitude in minor units, capped at the item total.
///
/// # Errors
///
/// Returns a `CalculationError` naming the promotion if the calculator fails or returns a
/// negative magnitude.
pub(crate) fn capped_magnitude<'a>(
    key: PromotionKey,
    promotion: &Promotion<'a>,
    order: &Order<'a>,
    item_total: i64,
) -> Result<i64, CalculationError> {
    let calculator = promotion.calculator();

    let amount = calculator
        .compute(order)
        .map_err(|source| {
            warn!(
                promotion = promotion.name(),
                calculator = calculator.kind(),
                error = %source,
                "calculator failed"
            );

            CalculationError::Calculator {
                promotion: key,
                name: promotion.name().to_string(),
                source,
            }
        })?
        .to_minor_units();

    trace!(
        promotion = promotion.name(),
        calculator = calculator.kind(),
        amount,
        "computed discount"
    );

    if amount < 0 {
        warn!(
            promotion = promotion.name(),
            calculator = calculator.kind(),
            amount,
            "calculator produced a negative amount"
        );

        return Err(CalculationError::NegativeAmount {
            promotion: key,
            name: promotion.name().to_string(),
            amount,
        });
    }

    Ok(cap_to_item_total(amount, item_total))
}

/// Runs reconciliation passes.
#[derive(Debug, Clone, Copy)]
pub struct CreditReconciler<'e, 'a> {
    registry: &'e PromotionRegistry<'a>,
    selector: PromotionSelector<'e, 'a>,
}

impl<'e, 'a> CreditReconciler<'e, 'a> {
    /// Create a reconciler.
    pub fn new(registry: &'e PromotionRegistry<'a>, selector: PromotionSelector<'e, 'a>) -> Self {
        Self { registry, selector }
    }

    /// Reconcile the order's credits and recompute its totals.
    ///
    /// With `force_adjustment_recalculation`, adjustments that report themselves as no longer
    /// applicable are dropped before totals are summed.
    ///
    /// # Errors
    ///
    /// Returns a `CalculationError` if any calculator or rule fails. The order is untouched.
    #[tracing::instrument(
        name = "engine.reconcile",
        skip(self, order),
        fields(
            line_items = order.line_items().len(),
            credits_updated = tracing::field::Empty,
            credits_removed = tracing::field::Empty,
            credits_created = tracing::field::Empty
        ),
        err
    )]
    pub fn reconcile(
        &self,
        order: &mut Order<'a>,
        force_adjustment_recalculation: bool,
    ) -> Result<ReconciliationReport, CalculationError> {
        let mut draft = order.clone();
        let report = self.reconcile_in_place(&mut draft, force_adjustment_recalculation)?;

        *order = draft;

        let span = Span::current();

        span.record("credits_updated", report.updated.len());
        span.record("credits_removed", report.removed.len());
        span.record("credits_created", report.created.len());

        Ok(report)
    }

    /// Reconcile directly on `order`. On error the order may be half-reconciled, so callers
    /// must be working on a draft.
    pub(crate) fn reconcile_in_place(
        &self,
        order: &mut Order<'a>,
        force_adjustment_recalculation: bool,
    ) -> Result<ReconciliationReport, CalculationError> {
        let mut report = ReconciliationReport::default();

        let item_total = order.item_total()?.to_minor_units();
        let eligible = self.selector.eligible_automatic(order)?;

        self.refresh_existing(order, &eligible, item_total, &mut report)?;
        self.apply_new(order, &eligible, item_total, &mut report)?;

        order.update_totals(force_adjustment_recalculation)?;

        Ok(report)
    }

    /// Phase 1: recompute or remove existing automatic credits.
    ///
    /// Recomputed amounts are capped at the item total, and a still-eligible credit that is
    /// now worth nothing is removed rather than kept at zero.
    fn refresh_existing(
        &self,
        order: &mut Order<'a>,
        eligible: &BTreeSet<PromotionKey>,
        item_total: i64,
        report: &mut ReconciliationReport,
    ) -> Result<(), CalculationError> {
        let mut credits: SmallVec<[(PromotionKey, AdjustmentKey); 4]> = order
            .credits()
            .filter(|(_, credit)| credit.is_automatic())
            .map(|(credit_key, credit)| (credit.promotion(), credit_key))
            .collect();

        credits.sort_unstable();

        let mut seen = FxHashSet::default();

        for (promotion_key, credit_key) in credits {
            let Some(promotion) = self.registry.get(promotion_key) else {
                warn!(?promotion_key, "removing credit for unknown promotion");
                order.remove_adjustment(credit_key);
                report.removed.push(credit_key);

                continue;
            };

            if !seen.insert(promotion_key) {
                warn!(promotion = promotion.name(), "removing duplicate credit");
                order.remove_adjustment(credit_key);
                report.removed.push(credit_key);

                continue;
            }

            if !eligible.contains(&promotion_key) {
                debug!(promotion = promotion.name(), "promotion no longer eligible");
                order.remove_adjustment(credit_key);
                report.removed.push(credit_key);

                continue;
            }

            let magnitude = capped_magnitude(promotion_key, promotion, order, item_total)?;

            if magnitude == 0 {
                debug!(promotion = promotion.name(), "promotion now worth nothing");
                order.remove_adjustment(credit_key);
                report.removed.push(credit_key);

                continue;
            }

            // Unchanged amounts are never written back.
            let changed = order
                .credit_mut(credit_key)
                .is_some_and(|credit| credit.set_magnitude(magnitude));

            if changed {
                debug!(promotion = promotion.name(), magnitude, "updated credit");
                report.updated.push(credit_key);
            } else {
                trace!(promotion = promotion.name(), "credit unchanged");
            }
        }

        Ok(())
    }

    /// Phase 2: add credits for newly eligible promotions.
    fn apply_new(
        &self,
        order: &mut Order<'a>,
        eligible: &BTreeSet<PromotionKey>,
        item_total: i64,
        report: &mut ReconciliationReport,
    ) -> Result<(), CalculationError> {
        let current_active: BTreeSet<PromotionKey> = order
            .credits()
            .map(|(_, credit)| credit.promotion())
            .filter(|key| self.registry.get(*key).is_some())
            .collect();

        for promotion_key in self.selector.select_to_apply(&current_active, eligible) {
            let Some(promotion) = self.registry.get(promotion_key) else {
                continue;
            };

            let magnitude = capped_magnitude(promotion_key, promotion, order, item_total)?;

            if magnitude == 0 {
                trace!(promotion = promotion.name(), "skipping zero credit");

                continue;
            }

            let credit = Credit::from_magnitude(
                promotion_key,
                CreditOrigin::Automatic,
                magnitude,
                order.currency(),
                promotion.name(),
            );

            let credit_key = order.insert_credit(credit);

            debug!(promotion = promotion.name(), magnitude, "created credit");
            report.created.push(credit_key);
        }

        Ok(())
    }
}
