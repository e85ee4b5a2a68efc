//! Engine
//!
//! The entry point: an immutable bundle of catalog, promotions and configuration that
//! reconciles orders and redeems coupons. An engine holds no mutable state, so one instance
//! can serve many orders at once; passes over the *same* order are serialised by the
//! `&mut Order` they take.

use tracing::{debug, info};

use crate::{
    engine::{
        config::EngineConfig,
        coupons::CouponRedeemer,
        errors::{CalculationError, RedemptionError, SaveError},
        evaluator::RuleEvaluator,
        reconciler::{CreditReconciler, ReconciliationReport},
        selector::PromotionSelector,
    },
    orders::{Order, adjustments::Credit},
    products::{Catalog, ProductKey},
    promotions::{Promotion, PromotionKey, registry::PromotionRegistry},
};

pub mod config;
pub mod coupons;
pub mod errors;
pub mod evaluator;
pub mod reconciler;
pub mod selector;

/// What [`Engine::save`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome<'a> {
    /// The coupon credit created from the order's pending code, if there was one
    pub redeemed: Option<Credit<'a>>,

    /// The reconciliation that followed
    pub report: ReconciliationReport,
}

/// Promotion engine
#[derive(Debug)]
pub struct Engine<'a> {
    catalog: Catalog<'a>,
    registry: PromotionRegistry<'a>,
    config: EngineConfig,
}

impl<'a> Engine<'a> {
    /// Create an engine. The catalog and registry are read-only from here on.
    pub fn new(catalog: Catalog<'a>, registry: PromotionRegistry<'a>, config: EngineConfig) -> Self {
        info!(
            promotions = registry.len(),
            products = catalog.products().len(),
            "promotion engine ready"
        );

        Self {
            catalog,
            registry,
            config,
        }
    }

    /// Catalog
    pub fn catalog(&self) -> &Catalog<'a> {
        &self.catalog
    }

    /// Promotion registry
    pub fn registry(&self) -> &PromotionRegistry<'a> {
        &self.registry
    }

    /// Configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rule evaluator over this engine's catalog.
    pub fn evaluator(&self) -> RuleEvaluator<'_, 'a> {
        RuleEvaluator::new(&self.catalog)
    }

    /// Promotion selector over this engine's registry.
    pub fn selector(&self) -> PromotionSelector<'_, 'a> {
        PromotionSelector::new(&self.registry, self.evaluator())
    }

    /// Credit reconciler.
    pub fn reconciler(&self) -> CreditReconciler<'_, 'a> {
        CreditReconciler::new(&self.registry, self.selector())
    }

    /// Coupon redeemer.
    pub fn redeemer(&self) -> CouponRedeemer<'_, 'a> {
        CouponRedeemer::new(
            &self.registry,
            self.evaluator(),
            self.config.coupon_eligibility,
        )
    }

    /// Reconcile the order's automatic credits and recompute its totals.
    ///
    /// # Errors
    ///
    /// See [`CreditReconciler::reconcile`].
    pub fn reconcile(
        &self,
        order: &mut Order<'a>,
        force_adjustment_recalculation: bool,
    ) -> Result<ReconciliationReport, CalculationError> {
        self.reconciler()
            .reconcile(order, force_adjustment_recalculation)
    }

    /// Redeem a coupon code against the order.
    ///
    /// # Errors
    ///
    /// See [`CouponRedeemer::redeem`].
    pub fn redeem_coupon(
        &self,
        code: &str,
        order: &mut Order<'a>,
    ) -> Result<Credit<'a>, RedemptionError> {
        self.redeemer().redeem(code, order)
    }

    /// Save hook: redeem the order's pending coupon code, if it has a non-blank one, then
    /// reconcile.
    ///
    /// The code is consumed on success. A code whose promotion already has a credit on the
    /// order, or that is worth nothing, redeems nothing and is consumed all the same.
    /// Redemption and reconciliation succeed or fail together.
    ///
    /// # Errors
    ///
    /// Returns a `SaveError` if the code is unknown, the order is ineligible for it, or a
    /// calculation fails. The order, pending code included, is untouched.
    pub fn save(
        &self,
        order: &mut Order<'a>,
        force_adjustment_recalculation: bool,
    ) -> Result<SaveOutcome<'a>, SaveError> {
        let mut draft = order.clone();

        let redeemed = match draft.take_coupon_code() {
            Some(code) if !code.trim().is_empty() => {
                match self.redeemer().redeem_in_place(&code, &mut draft) {
                    Ok(credit) => Some(credit),
                    Err(
                        err @ (RedemptionError::AlreadyApplied(_)
                        | RedemptionError::NothingToDiscount(_)),
                    ) => {
                        debug!(error = %err, "pending coupon code redeemed nothing");

                        None
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            _ => None,
        };

        let report = self
            .reconciler()
            .reconcile_in_place(&mut draft, force_adjustment_recalculation)?;

        *order = draft;

        Ok(SaveOutcome { redeemed, report })
    }

    /// Automatic promotions with a product or product group rule that targets `product`.
    pub fn possible_promotions(&self, product: ProductKey) -> Vec<(PromotionKey, &Promotion<'a>)> {
        self.registry
            .automatic()
            .filter(|(_, promotion)| {
                promotion
                    .rules()
                    .iter()
                    .any(|rule| rule.references_product(product, &self.catalog))
            })
            .collect()
    }
}
