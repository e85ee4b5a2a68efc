//! Rebate prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    calculators::{Calculator, CalculatorError},
    discounts::DiscountError,
    engine::{
        Engine, SaveOutcome,
        config::{CouponEligibility, EngineConfig},
        coupons::CouponRedeemer,
        errors::{CalculationError, RedemptionError, SaveError},
        evaluator::RuleEvaluator,
        reconciler::{CreditReconciler, ReconciliationReport},
        selector::PromotionSelector,
    },
    fixtures::{Fixture, FixtureError},
    orders::{
        Customer, CustomerId, Order, OrderError, OrderTotals,
        adjustments::{Adjustment, AdjustmentKey, Charge, Credit, CreditOrigin},
        line_items::LineItem,
        payments::{Payment, PaymentState},
    },
    pricing::{TotalPriceError, total_amount},
    products::{Catalog, Product, ProductGroup, ProductGroupKey, ProductKey},
    promotions::{
        Promotion, PromotionKey,
        registry::{PromotionRegistry, RegistryError},
    },
    receipt::{Receipt, ReceiptError},
    rules::{ItemTotalOperator, MatchPolicy, Rule, RuleError},
};
