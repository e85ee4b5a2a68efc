//! Promotion Rules
//!
//! Predicates over an order. A promotion is eligible when every one of its rules holds.

use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    orders::{CustomerId, Order},
    pricing::TotalPriceError,
    products::{Catalog, ProductGroupKey, ProductKey},
};

/// Errors raised while evaluating a rule.
#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    /// A threshold is in a different currency from the order (threshold, order).
    #[error("Rule threshold has currency {0}, but order has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// A rule refers to a product group missing from the catalog.
    #[error("Product group {0:?} not found")]
    UnknownProductGroup(ProductGroupKey),

    /// The order's item total could not be computed.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),
}

/// Comparison applied by [`Rule::ItemTotal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemTotalOperator {
    /// Item total must be strictly greater than the threshold.
    GreaterThan,

    /// Item total must be at least the threshold.
    GreaterThanOrEqual,
}

/// How the order's products are compared against a rule's product set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// At least one product on the order is in the set.
    #[default]
    Any,

    /// Every product in the set is on the order.
    All,

    /// No product on the order is in the set.
    None,
}

/// Promotion rules.
#[derive(Debug, Clone)]
pub enum Rule<'a> {
    /// The order's item total compared against a threshold.
    ItemTotal {
        /// Threshold amount
        amount: Money<'a, Currency>,

        /// Comparison operator
        operator: ItemTotalOperator,
    },

    /// The order's products compared against an explicit product set.
    Product {
        /// Products the rule targets
        products: FxHashSet<ProductKey>,

        /// Match policy
        policy: MatchPolicy,
    },

    /// The order's products compared against a catalog product group.
    ProductGroup {
        /// Group the rule targets
        group: ProductGroupKey,

        /// Match policy
        policy: MatchPolicy,
    },

    /// The order belongs to one of the listed customers. Guest orders never match.
    User {
        /// Customers the rule targets
        customers: FxHashSet<CustomerId>,
    },

    /// The order belongs to a customer with no completed orders.
    FirstOrder,
}

impl<'a> Rule<'a> {
    /// Evaluate the rule against an order.
    ///
    /// # Errors
    ///
    /// Returns a `RuleError` if a threshold is in another currency, a product group is
    /// missing from the catalog, or the item total overflows.
    pub fn matches(&self, order: &Order<'a>, catalog: &Catalog<'_>) -> Result<bool, RuleError> {
        match self {
            Rule::ItemTotal { amount, operator } => {
                if amount.currency() != order.currency() {
                    return Err(RuleError::CurrencyMismatch(
                        amount.currency().iso_alpha_code,
                        order.currency().iso_alpha_code,
                    ));
                }

                let item_total = order.item_total()?.to_minor_units();
                let threshold = amount.to_minor_units();

                Ok(match operator {
                    ItemTotalOperator::GreaterThan => item_total > threshold,
                    ItemTotalOperator::GreaterThanOrEqual => item_total >= threshold,
                })
            }
            Rule::Product { products, policy } => Ok(products_match(order, products, *policy)),
            Rule::ProductGroup { group, policy } => {
                let group = catalog
                    .group(*group)
                    .ok_or(RuleError::UnknownProductGroup(*group))?;

                Ok(products_match(order, &group.products, *policy))
            }
            Rule::User { customers } => Ok(order
                .customer()
                .is_some_and(|customer| customers.contains(&customer.id))),
            Rule::FirstOrder => Ok(order
                .customer()
                .is_some_and(|customer| customer.completed_orders == 0)),
        }
    }

    /// Whether the rule targets `product`, directly or through a product group.
    pub fn references_product(&self, product: ProductKey, catalog: &Catalog<'_>) -> bool {
        match self {
            Rule::Product { products, .. } => products.contains(&product),
            Rule::ProductGroup { group, .. } => catalog
                .group(*group)
                .is_some_and(|group| group.contains(product)),
            Rule::ItemTotal { .. } | Rule::User { .. } | Rule::FirstOrder => false,
        }
    }
}

fn products_match(order: &Order<'_>, targets: &FxHashSet<ProductKey>, policy: MatchPolicy) -> bool {
    match policy {
        MatchPolicy::Any => order.products().any(|product| targets.contains(&product)),
        MatchPolicy::All => {
            let ordered: FxHashSet<ProductKey> = order.products().collect();

            targets.iter().all(|product| ordered.contains(product))
        }
        MatchPolicy::None => !order.products().any(|product| targets.contains(&product)),
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use crate::{
        orders::{Customer, line_items::LineItem},
        products::{Product, ProductGroup},
    };

    use super::*;

    struct Setup {
        catalog: Catalog<'static>,
        apple: ProductKey,
        pear: ProductKey,
        plum: ProductKey,
        fruit: ProductGroupKey,
    }

    fn setup() -> Setup {
        let mut catalog = Catalog::new();

        let mut product = |name: &str, minor: i64| {
            catalog.insert_product(Product {
                name: name.to_string(),
                price: Money::from_minor(minor, GBP),
            })
        };

        let apple = product("Apple", 50);
        let pear = product("Pear", 60);
        let plum = product("Plum", 70);

        let fruit = catalog.insert_group(ProductGroup::new("Orchard", [apple, pear]));

        Setup {
            catalog,
            apple,
            pear,
            plum,
            fruit,
        }
    }

    fn order_of(products: &[ProductKey]) -> Result<Order<'static>, crate::orders::OrderError> {
        Order::with_line_items(
            products
                .iter()
                .map(|&product| LineItem::new(product, Money::from_minor(10_00, GBP), 1)),
            GBP,
        )
    }

    #[test]
    fn item_total_operators() -> TestResult {
        let Setup { catalog, apple, .. } = setup();
        let order = order_of(&[apple, apple])?;

        let gt = |minor| Rule::ItemTotal {
            amount: Money::from_minor(minor, GBP),
            operator: ItemTotalOperator::GreaterThan,
        };

        let gte = |minor| Rule::ItemTotal {
            amount: Money::from_minor(minor, GBP),
            operator: ItemTotalOperator::GreaterThanOrEqual,
        };

        assert!(gt(19_99).matches(&order, &catalog)?);
        assert!(!gt(20_00).matches(&order, &catalog)?);
        assert!(gte(20_00).matches(&order, &catalog)?);
        assert!(!gte(20_01).matches(&order, &catalog)?);

        Ok(())
    }

    #[test]
    fn item_total_currency_mismatch_is_an_error() -> TestResult {
        let Setup { catalog, apple, .. } = setup();
        let order = order_of(&[apple])?;

        let rule = Rule::ItemTotal {
            amount: Money::from_minor(10_00, USD),
            operator: ItemTotalOperator::GreaterThan,
        };

        assert_eq!(
            rule.matches(&order, &catalog),
            Err(RuleError::CurrencyMismatch(USD.iso_alpha_code, GBP.iso_alpha_code))
        );

        Ok(())
    }

    #[test]
    fn product_match_policies() -> TestResult {
        let Setup {
            catalog,
            apple,
            pear,
            plum,
            ..
        } = setup();

        let order = order_of(&[apple, plum])?;
        let targets: FxHashSet<ProductKey> = [apple, pear].into_iter().collect();

        let rule = |policy| Rule::Product {
            products: targets.clone(),
            policy,
        };

        assert!(rule(MatchPolicy::Any).matches(&order, &catalog)?);
        assert!(!rule(MatchPolicy::All).matches(&order, &catalog)?);
        assert!(!rule(MatchPolicy::None).matches(&order, &catalog)?);

        let order = order_of(&[apple, pear])?;
        assert!(rule(MatchPolicy::All).matches(&order, &catalog)?);

        let order = order_of(&[plum])?;
        assert!(rule(MatchPolicy::None).matches(&order, &catalog)?);

        Ok(())
    }

    #[test]
    fn product_group_membership() -> TestResult {
        let Setup {
            catalog,
            pear,
            plum,
            fruit,
            ..
        } = setup();

        let rule = Rule::ProductGroup {
            group: fruit,
            policy: MatchPolicy::Any,
        };

        assert!(rule.matches(&order_of(&[pear])?, &catalog)?);
        assert!(!rule.matches(&order_of(&[plum])?, &catalog)?);
        assert!(rule.references_product(pear, &catalog));
        assert!(!rule.references_product(plum, &catalog));

        Ok(())
    }

    #[test]
    fn unknown_product_group_is_an_error() -> TestResult {
        let Setup { apple, .. } = setup();
        let empty = Catalog::new();

        let rule = Rule::ProductGroup {
            group: ProductGroupKey::default(),
            policy: MatchPolicy::Any,
        };

        assert_eq!(
            rule.matches(&order_of(&[apple])?, &empty),
            Err(RuleError::UnknownProductGroup(ProductGroupKey::default()))
        );

        Ok(())
    }

    #[test]
    fn user_and_first_order_rules_need_a_customer() -> TestResult {
        let Setup { catalog, apple, .. } = setup();
        let mut order = order_of(&[apple])?;

        let user = Rule::User {
            customers: [CustomerId(7)].into_iter().collect(),
        };

        assert!(!user.matches(&order, &catalog)?);
        assert!(!Rule::FirstOrder.matches(&order, &catalog)?);

        order.set_customer(Some(Customer {
            id: CustomerId(7),
            completed_orders: 0,
        }));

        assert!(user.matches(&order, &catalog)?);
        assert!(Rule::FirstOrder.matches(&order, &catalog)?);

        order.set_customer(Some(Customer {
            id: CustomerId(8),
            completed_orders: 2,
        }));

        assert!(!user.matches(&order, &catalog)?);
        assert!(!Rule::FirstOrder.matches(&order, &catalog)?);

        Ok(())
    }
}
