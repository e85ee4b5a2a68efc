//! Coupon Redeemer

use tracing::{debug, info};

use crate::{
    engine::{
        config::CouponEligibility,
        errors::{CalculationError, RedemptionError},
        evaluator::RuleEvaluator,
        reconciler::capped_magnitude,
    },
    orders::{
        Order,
        adjustments::{Credit, CreditOrigin},
    },
    promotions::registry::PromotionRegistry,
};

/// Turns coupon codes into coupon credits.
#[derive(Debug, Clone, Copy)]
pub struct CouponRedeemer<'e, 'a> {
    registry: &'e PromotionRegistry<'a>,
    evaluator: RuleEvaluator<'e, 'a>,
    eligibility: CouponEligibility,
}

impl<'e, 'a> CouponRedeemer<'e, 'a> {
    /// Create a redeemer.
    pub fn new(
        registry: &'e PromotionRegistry<'a>,
        evaluator: RuleEvaluator<'e, 'a>,
        eligibility: CouponEligibility,
    ) -> Self {
        Self {
            registry,
            evaluator,
            eligibility,
        }
    }

    /// Redeem `code` against the order, attaching a coupon credit and refreshing totals.
    ///
    /// Codes match case-insensitively. Unless the engine enforces coupon eligibility, the
    /// promotion's rules and the combinability of promotions already on the order are not
    /// consulted. The discount is capped at the order's item total.
    ///
    /// # Errors
    ///
    /// Returns a `RedemptionError` if the code is unknown, its promotion already has a credit
    /// on the order, the order is ineligible under [`CouponEligibility::Enforce`], the
    /// discount would be zero, or the calculation fails. The order is untouched on error.
    #[tracing::instrument(name = "engine.redeem_coupon", skip(self, order), err)]
    pub fn redeem(
        &self,
        code: &str,
        order: &mut Order<'a>,
    ) -> Result<Credit<'a>, RedemptionError> {
        let mut draft = order.clone();
        let credit = self.redeem_in_place(code, &mut draft)?;

        *order = draft;

        Ok(credit)
    }

    pub(crate) fn redeem_in_place(
        &self,
        code: &str,
        order: &mut Order<'a>,
    ) -> Result<Credit<'a>, RedemptionError> {
        let (key, promotion) = self
            .registry
            .find_by_code(code)
            .ok_or_else(|| RedemptionError::CodeNotFound(code.to_string()))?;

        if order.credits().any(|(_, credit)| credit.promotion() == key) {
            return Err(RedemptionError::AlreadyApplied(code.to_string()));
        }

        if self.eligibility == CouponEligibility::Enforce
            && !self.evaluator.eligible(key, promotion, order)?
        {
            return Err(RedemptionError::Ineligible(code.to_string()));
        }

        let item_total = order
            .item_total()
            .map_err(CalculationError::from)?
            .to_minor_units();

        let magnitude = capped_magnitude(key, promotion, order, item_total)?;

        if magnitude == 0 {
            debug!(promotion = promotion.name(), "coupon worth nothing");

            return Err(RedemptionError::NothingToDiscount(code.to_string()));
        }

        let credit = Credit::from_magnitude(
            key,
            CreditOrigin::Coupon,
            magnitude,
            order.currency(),
            promotion.name(),
        );

        order.insert_credit(credit.clone());
        order
            .update_totals(false)
            .map_err(CalculationError::from)?;

        info!(promotion = promotion.name(), magnitude, "redeemed coupon");

        Ok(credit)
    }
}
