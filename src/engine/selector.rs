//! Promotion Selector
//!
//! Picks which automatic promotions an order should gain, given the promotions it already
//! has. Promotions are not ranked against each other: every qualifying candidate is applied.

use std::collections::BTreeSet;

use tracing::trace;

use crate::{
    engine::{errors::CalculationError, evaluator::RuleEvaluator},
    orders::Order,
    promotions::{Promotion, PromotionKey, registry::PromotionRegistry},
};

/// Selects eligible automatic promotions and applies combinability constraints.
#[derive(Debug, Clone, Copy)]
pub struct PromotionSelector<'e, 'a> {
    registry: &'e PromotionRegistry<'a>,
    evaluator: RuleEvaluator<'e, 'a>,
}

impl<'e, 'a> PromotionSelector<'e, 'a> {
    /// Create a selector.
    pub fn new(registry: &'e PromotionRegistry<'a>, evaluator: RuleEvaluator<'e, 'a>) -> Self {
        Self {
            registry,
            evaluator,
        }
    }

    /// The automatic promotions whose rules hold for the order.
    ///
    /// Reconciliation computes this once per pass and reuses it, since creating credits
    /// changes the order mid-pass.
    ///
    /// # Errors
    ///
    /// Returns a `CalculationError` if any promotion's rules fail to evaluate.
    pub fn eligible_automatic(
        &self,
        order: &Order<'a>,
    ) -> Result<BTreeSet<PromotionKey>, CalculationError> {
        let mut eligible = BTreeSet::new();

        for (key, promotion) in self.registry.automatic() {
            if self.evaluator.eligible(key, promotion, order)? {
                eligible.insert(key);
            }
        }

        trace!(eligible = eligible.len(), "evaluated automatic promotions");

        Ok(eligible)
    }

    /// The promotions to add to an order already carrying `current_active`.
    ///
    /// - A non-combinable active promotion vetoes every addition.
    /// - Otherwise every eligible promotion not already active is added, except that
    ///   non-combinable candidates are only added to an order with no active promotions.
    pub fn select_to_apply(
        &self,
        current_active: &BTreeSet<PromotionKey>,
        eligible: &BTreeSet<PromotionKey>,
    ) -> BTreeSet<PromotionKey> {
        if current_active.iter().any(|key| !self.is_combinable(*key)) {
            trace!("non-combinable promotion active; nothing to add");

            return BTreeSet::new();
        }

        eligible
            .difference(current_active)
            .copied()
            .filter(|key| current_active.is_empty() || self.is_combinable(*key))
            .collect()
    }

    /// Unknown promotions count as combinable; they cannot veto anything.
    fn is_combinable(&self, key: PromotionKey) -> bool {
        self.registry
            .get(key)
            .is_none_or(Promotion::is_combinable)
    }
}
