//! Integration tests for credit reconciliation.
//!
//! Covers the invariants every pass must keep (idempotence, exact automatic credit set, the
//! non-combinable veto, capping and the totals law) over a grid of small orders, plus the
//! worked scenarios for a single 10% promotion.

use std::{collections::BTreeSet, thread};

use decimal_percentage::Percentage;
use rustc_hash::FxHashSet;
use rusty_money::{
    Money,
    iso::{GBP, USD},
};
use testresult::TestResult;

use rebate::prelude::*;

struct Shop {
    engine: Engine<'static>,
    tee: ProductKey,
    mug: ProductKey,
    ten_percent: PromotionKey,
    exclusive: PromotionKey,
}

/// Tee £20.00, Mug £8.00.
///
/// - "Ten percent": 10% of item total when it reaches £50.00
/// - "Mug bonus": £10.00 per unit when a mug is on the order
/// - "Exclusive": £60.00 off, non-combinable, for orders over £100.00
/// - "Broken": never eligible
fn shop() -> Result<Shop, RegistryError> {
    let mut catalog = Catalog::new();

    let tee = catalog.insert_product(Product {
        name: "Tee".to_string(),
        price: Money::from_minor(20_00, GBP),
    });
    let mug = catalog.insert_product(Product {
        name: "Mug".to_string(),
        price: Money::from_minor(8_00, GBP),
    });

    let mut registry = PromotionRegistry::new();

    let ten_percent = registry.insert(
        Promotion::new(
            "Ten percent",
            Calculator::FlatPercentItemTotal(Percentage::from(0.10)),
        )
        .with_rule(Rule::ItemTotal {
            amount: Money::from_minor(50_00, GBP),
            operator: ItemTotalOperator::GreaterThanOrEqual,
        }),
    )?;

    registry.insert(
        Promotion::new("Mug bonus", Calculator::PerItem(Money::from_minor(10_00, GBP))).with_rule(
            Rule::Product {
                products: [mug].into_iter().collect(),
                policy: MatchPolicy::Any,
            },
        ),
    )?;

    let exclusive = registry.insert(
        Promotion::new(
            "Exclusive",
            Calculator::FlatRate(Money::from_minor(60_00, GBP)),
        )
        .with_combinable(false)
        .with_rule(Rule::ItemTotal {
            amount: Money::from_minor(100_00, GBP),
            operator: ItemTotalOperator::GreaterThan,
        }),
    )?;

    registry.insert(
        Promotion::new("Broken", Calculator::FlatRate(Money::from_minor(-1_00, GBP))).with_rule(
            Rule::User {
                customers: FxHashSet::default(),
            },
        ),
    )?;

    Ok(Shop {
        engine: Engine::new(catalog, registry, EngineConfig::default()),
        tee,
        mug,
        ten_percent,
        exclusive,
    })
}

fn order(shop: &Shop, tees: u32, mugs: u32) -> Result<Order<'static>, OrderError> {
    let mut order = Order::new(GBP);

    if tees > 0 {
        order.add_line_item(LineItem::new(shop.tee, Money::from_minor(20_00, GBP), tees))?;
    }

    if mugs > 0 {
        order.add_line_item(LineItem::new(shop.mug, Money::from_minor(8_00, GBP), mugs))?;
    }

    Ok(order)
}

fn automatic_promotions(order: &Order<'_>) -> BTreeSet<PromotionKey> {
    order
        .credits()
        .filter(|(_, credit)| credit.is_automatic())
        .map(|(_, credit)| credit.promotion())
        .collect()
}

fn grid() -> impl Iterator<Item = (u32, u32)> {
    (0..7).flat_map(|tees| (0..4).map(move |mugs| (tees, mugs)))
}

#[test]
fn reconcile_is_idempotent() -> TestResult {
    let shop = shop()?;

    for (tees, mugs) in grid() {
        let mut order = order(&shop, tees, mugs)?;

        shop.engine.reconcile(&mut order, false)?;
        let before = order.clone();

        let report = shop.engine.reconcile(&mut order, false)?;

        assert!(report.is_unchanged(), "{tees} tees, {mugs} mugs: {report:?}");
        assert_eq!(order.totals(), before.totals());
    }

    Ok(())
}

#[test]
fn automatic_credits_match_fresh_selection() -> TestResult {
    let shop = shop()?;
    let selector = shop.engine.selector();

    for (tees, mugs) in grid() {
        let mut order = order(&shop, tees, mugs)?;
        shop.engine.reconcile(&mut order, false)?;

        let eligible = selector.eligible_automatic(&order)?;
        let expected = selector.select_to_apply(&BTreeSet::new(), &eligible);

        assert_eq!(
            automatic_promotions(&order),
            expected,
            "{tees} tees, {mugs} mugs"
        );
    }

    Ok(())
}

#[test]
fn credits_follow_an_order_as_it_changes() -> TestResult {
    let shop = shop()?;
    let selector = shop.engine.selector();
    let mut order = order(&shop, 1, 1)?;

    for (tees, mugs) in [(1, 1), (4, 1), (6, 1), (6, 3), (1, 3), (2, 2)] {
        order.set_quantity(0, tees)?;
        order.set_quantity(1, mugs)?;

        shop.engine.reconcile(&mut order, false)?;

        let eligible = selector.eligible_automatic(&order)?;
        let item_total = order.totals().item_total.to_minor_units();

        for (_, credit) in order.credits() {
            let promotion = shop
                .engine
                .registry()
                .get(credit.promotion())
                .ok_or("credit for unknown promotion")?;
            let expected = promotion
                .calculator()
                .compute(&order)?
                .to_minor_units()
                .min(item_total);

            assert!(eligible.contains(&credit.promotion()), "{tees} tees, {mugs} mugs");
            assert_eq!(-credit.amount().to_minor_units(), expected, "{tees} tees, {mugs} mugs");
        }
    }

    Ok(())
}

#[test]
fn non_combinable_credit_vetoes_additions() -> TestResult {
    let shop = shop()?;

    // 6 tees: £120.00, eligible for "Ten percent" and "Exclusive".
    let mut order = order(&shop, 6, 0)?;
    shop.engine.reconcile(&mut order, false)?;

    assert_eq!(
        automatic_promotions(&order),
        [shop.ten_percent, shop.exclusive].into_iter().collect()
    );

    // A mug makes "Mug bonus" eligible, but "Exclusive" is already active.
    order.add_line_item(LineItem::new(shop.mug, Money::from_minor(8_00, GBP), 1))?;
    let report = shop.engine.reconcile(&mut order, false)?;

    assert!(report.created.is_empty());
    assert_eq!(
        automatic_promotions(&order),
        [shop.ten_percent, shop.exclusive].into_iter().collect()
    );

    Ok(())
}

#[test]
fn non_combinable_promotion_is_not_added_next_to_existing_credits() -> TestResult {
    let shop = shop()?;

    // 3 tees: £60.00, "Ten percent" only.
    let mut order = order(&shop, 3, 0)?;
    shop.engine.reconcile(&mut order, false)?;

    // 6 tees: "Exclusive" is now eligible but "Ten percent" is already active.
    order.set_quantity(0, 6)?;
    shop.engine.reconcile(&mut order, false)?;

    assert_eq!(
        automatic_promotions(&order),
        [shop.ten_percent].into_iter().collect()
    );

    Ok(())
}

#[test]
fn credits_never_exceed_item_total_and_totals_add_up() -> TestResult {
    let shop = shop()?;

    for (tees, mugs) in grid() {
        let mut order = order(&shop, tees, mugs)?;
        shop.engine.reconcile(&mut order, false)?;

        let totals = *order.totals();

        for (_, credit) in order.credits() {
            let magnitude = -credit.amount().to_minor_units();

            assert!(magnitude > 0, "{tees} tees, {mugs} mugs");
            assert!(
                magnitude <= totals.item_total.to_minor_units(),
                "{tees} tees, {mugs} mugs"
            );
        }

        assert_eq!(totals.total, totals.item_total.add(totals.adjustment_total)?);
    }

    Ok(())
}

#[test]
fn mug_bonus_is_capped_at_item_total() -> TestResult {
    let shop = shop()?;

    // 1 mug: £8.00 item total against a £10.00 bonus.
    let mut order = order(&shop, 0, 1)?;
    shop.engine.reconcile(&mut order, false)?;

    assert_eq!(order.totals().adjustment_total, Money::from_minor(-8_00, GBP));
    assert_eq!(order.totals().total, Money::from_minor(0, GBP));

    Ok(())
}

#[test]
fn ten_percent_of_one_hundred() -> TestResult {
    let shop = shop()?;

    // 5 tees: £100.00.
    let mut order = order(&shop, 5, 0)?;
    let report = shop.engine.reconcile(&mut order, false)?;

    assert_eq!(report.created.len(), 1);

    let credits: Vec<_> = order
        .credits()
        .map(|(_, credit)| (credit.promotion(), *credit.amount()))
        .collect();

    assert_eq!(
        credits,
        [(shop.ten_percent, Money::from_minor(-10_00, GBP))]
    );
    assert_eq!(order.totals().total, Money::from_minor(90_00, GBP));

    Ok(())
}

#[test]
fn ineligible_promotion_credit_is_removed() -> TestResult {
    let shop = shop()?;

    let mut order = order(&shop, 5, 0)?;
    shop.engine.reconcile(&mut order, false)?;

    // 2 tees: £40.00, below the £50.00 threshold.
    order.set_quantity(0, 2)?;
    let report = shop.engine.reconcile(&mut order, false)?;

    assert_eq!(report.removed.len(), 1);
    assert_eq!(order.credits().count(), 0);
    assert_eq!(order.totals().total, order.totals().item_total);

    Ok(())
}

#[test]
fn calculation_failure_aborts_the_whole_pass() -> TestResult {
    let shop = shop()?;
    let mut registry = PromotionRegistry::new();

    let good = registry.insert(Promotion::new(
        "Good",
        Calculator::FlatRate(Money::from_minor(1_00, GBP)),
    ))?;
    let bad = registry.insert(Promotion::new(
        "Bad",
        Calculator::FlatRate(Money::from_minor(-1_00, GBP)),
    ))?;

    let engine = Engine::new(
        shop.engine.catalog().clone(),
        registry,
        EngineConfig::default(),
    );

    let mut order = order(&shop, 1, 0)?;
    let result = engine.reconcile(&mut order, false);

    assert!(matches!(
        result,
        Err(CalculationError::NegativeAmount { promotion, .. }) if promotion == bad
    ));
    assert!(automatic_promotions(&order).is_empty());
    assert_ne!(good, bad);

    Ok(())
}

#[test]
fn rule_failure_is_not_treated_as_ineligible() -> TestResult {
    let shop = shop()?;
    let mut registry = PromotionRegistry::new();

    let dollars = registry.insert(
        Promotion::new("Dollars", Calculator::FreeShipping).with_rule(Rule::ItemTotal {
            amount: Money::from_minor(1_00, USD),
            operator: ItemTotalOperator::GreaterThan,
        }),
    )?;

    let engine = Engine::new(
        shop.engine.catalog().clone(),
        registry,
        EngineConfig::default(),
    );

    let mut order = order(&shop, 1, 0)?;
    let result = engine.reconcile(&mut order, false);

    assert!(matches!(
        result,
        Err(CalculationError::Rule { promotion, .. }) if promotion == dollars
    ));

    Ok(())
}

#[test]
fn orders_reconcile_in_parallel() -> TestResult {
    let shop = shop()?;

    let mut orders = grid()
        .map(|(tees, mugs)| order(&shop, tees, mugs))
        .collect::<Result<Vec<_>, _>>()?;

    let engine = &shop.engine;

    thread::scope(|scope| -> TestResult {
        let handles: Vec<_> = orders
            .iter_mut()
            .map(|order| scope.spawn(move || engine.reconcile(order, false)))
            .collect();

        for handle in handles {
            handle.join().map_err(|_err| "reconcile thread panicked")??;
        }

        Ok(())
    })?;

    for (order, (tees, mugs)) in orders.iter().zip(grid()) {
        let mut sequential = self::order(&shop, tees, mugs)?;
        shop.engine.reconcile(&mut sequential, false)?;

        assert_eq!(order.totals(), sequential.totals(), "{tees} tees, {mugs} mugs");
    }

    Ok(())
}
