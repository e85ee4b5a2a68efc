//! Rule Evaluator

use crate::{
    engine::errors::CalculationError,
    orders::Order,
    products::Catalog,
    promotions::{Promotion, PromotionKey},
};

/// Decides promotion eligibility by AND-ing the promotion's rules.
#[derive(Debug, Clone, Copy)]
pub struct RuleEvaluator<'e, 'a> {
    catalog: &'e Catalog<'a>,
}

impl<'e, 'a> RuleEvaluator<'e, 'a> {
    /// Create an evaluator over a catalog.
    pub fn new(catalog: &'e Catalog<'a>) -> Self {
        Self { catalog }
    }

    /// Whether every rule on the promotion holds for the order.
    ///
    /// A promotion without rules is always eligible. Every rule is evaluated, even once one
    /// has failed to match, so a rule that cannot be evaluated is reported no matter where it
    /// sits in the list.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::Rule`] naming the promotion if any rule fails to evaluate.
    pub fn eligible(
        &self,
        key: PromotionKey,
        promotion: &Promotion<'a>,
        order: &Order<'a>,
    ) -> Result<bool, CalculationError> {
        promotion.rules().iter().try_fold(true, |eligible, rule| {
            let matches = rule.matches(order, self.catalog).map_err(|source| {
                CalculationError::Rule {
                    promotion: key,
                    name: promotion.name().to_string(),
                    source,
                }
            })?;

            Ok(eligible && matches)
        })
    }
}
