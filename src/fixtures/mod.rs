//! Fixtures
//!
//! YAML fixture sets describing a catalog, its promotions, engine settings and sample orders.
//! A set named `name` lives in `fixtures/{products,promotions,orders,config}/name.yml`; the
//! config file is optional.

use std::{fs, path::PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    calculators::Calculator,
    engine::{Engine, config::EngineConfig},
    fixtures::{
        orders::{OrderFixture, OrdersFixture},
        products::{ProductsFixture, parse_percentage, parse_price},
        promotions::{CalculatorFixture, PromotionFixture, PromotionsFixture, RuleFixture},
    },
    orders::{
        Customer, CustomerId, Order, OrderError,
        adjustments::Charge,
        line_items::LineItem,
        payments::Payment,
    },
    products::{Catalog, Product, ProductGroup, ProductGroupKey, ProductKey},
    promotions::{
        Promotion, PromotionKey,
        registry::{PromotionRegistry, RegistryError},
    },
    rules::Rule,
};

pub mod orders;
pub mod products;
pub mod promotions;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product group not found
    #[error("Product group not found: {0}")]
    ProductGroupNotFound(String),

    /// Promotion not found
    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),

    /// Order not found
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Currency mismatch between fixture amounts
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// Promotion registration error
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Order construction error
    #[error(transparent)]
    Order(#[from] OrderError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    catalog: Catalog<'a>,
    registry: PromotionRegistry<'a>,
    config: EngineConfig,

    /// String key -> `SlotMap` key mappings for lookups
    product_keys: FxHashMap<String, ProductKey>,
    group_keys: FxHashMap<String, ProductGroupKey>,
    promotion_keys: FxHashMap<String, PromotionKey>,

    /// Pre-built orders
    orders: FxHashMap<String, Order<'a>>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: Catalog::new(),
            registry: PromotionRegistry::new(),
            config: EngineConfig::default(),
            product_keys: FxHashMap::default(),
            group_keys: FxHashMap::default(),
            promotion_keys: FxHashMap::default(),
            orders: FxHashMap::default(),
            currency: None,
        }
    }

    fn read(&self, category: &str, name: &str) -> Result<String, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));

        Ok(fs::read_to_string(file_path)?)
    }

    /// Parse a price string, checking it against the fixture set's currency. The first
    /// price parsed fixes the currency.
    fn money(&mut self, price: &str) -> Result<Money<'a, Currency>, FixtureError> {
        let (minor_units, currency) = parse_price(price)?;

        match self.currency {
            Some(existing) if existing != currency => {
                return Err(FixtureError::CurrencyMismatch(
                    existing.iso_alpha_code.to_string(),
                    currency.iso_alpha_code.to_string(),
                ));
            }
            Some(_) => {}
            None => self.currency = Some(currency),
        }

        Ok(Money::from_minor(minor_units, currency))
    }

    /// Load products and product groups from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, if there are currency mismatches
    /// or if a group names an unknown product.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("products", name)?;
        let fixture: ProductsFixture = serde_norway::from_str(&contents)?;

        let mut products: Vec<_> = fixture.products.into_iter().collect();
        products.sort_by(|(a, _), (b, _)| a.cmp(b));

        for (key, product_fixture) in products {
            let price = self.money(&product_fixture.price)?;
            let product_key = self.catalog.insert_product(Product {
                name: product_fixture.name,
                price,
            });

            self.product_keys.insert(key, product_key);
        }

        let mut groups: Vec<_> = fixture.groups.into_iter().collect();
        groups.sort_by(|(a, _), (b, _)| a.cmp(b));

        for (key, group_fixture) in groups {
            let members = group_fixture
                .products
                .iter()
                .map(|product| self.product_key(product))
                .collect::<Result<Vec<_>, _>>()?;

            let group_key = self
                .catalog
                .insert_group(ProductGroup::new(group_fixture.name, members));

            self.group_keys.insert(key, group_key);
        }

        Ok(self)
    }

    /// Load promotions from a YAML fixture file. Promotions are registered in key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if a rule names an unknown
    /// product or group, or if two promotions share a coupon code.
    pub fn load_promotions(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("promotions", name)?;
        let fixture: PromotionsFixture = serde_norway::from_str(&contents)?;

        let mut promotions: Vec<_> = fixture.promotions.into_iter().collect();
        promotions.sort_by(|(a, _), (b, _)| a.cmp(b));

        for (key, promotion_fixture) in promotions {
            let promotion = self.promotion_from(promotion_fixture)?;
            let promotion_key = self.registry.insert(promotion)?;

            self.promotion_keys.insert(key, promotion_key);
        }

        Ok(self)
    }

    /// Load orders from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if an order names an unknown
    /// product or if an amount is in the wrong currency.
    pub fn load_orders(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("orders", name)?;
        let fixture: OrdersFixture = serde_norway::from_str(&contents)?;

        for (key, order_fixture) in fixture.orders {
            let order = self.order_from(order_fixture)?;

            self.orders.insert(key, order);
        }

        Ok(self)
    }

    /// Load engine configuration from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_config(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("config", name)?;

        self.config = EngineConfig::from_yaml(&contents)?;

        Ok(self)
    }

    /// Load a complete fixture set (products, promotions, orders and, when present, config)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture
            .load_products(name)?
            .load_promotions(name)?
            .load_orders(name)?;

        if fixture
            .base_path
            .join("config")
            .join(format!("{name}.yml"))
            .exists()
        {
            fixture.load_config(name)?;
        }

        Ok(fixture)
    }

    fn promotion_from(&mut self, fixture: PromotionFixture) -> Result<Promotion<'a>, FixtureError> {
        let calculator = self.calculator_from(fixture.calculator)?;

        let mut promotion = Promotion::new(fixture.name, calculator)
            .with_automatic(fixture.automatic)
            .with_combinable(fixture.combinable);

        if let Some(code) = fixture.code {
            promotion = promotion.with_code(code);
        }

        for rule in fixture.rules {
            promotion = promotion.with_rule(self.rule_from(rule)?);
        }

        Ok(promotion)
    }

    fn calculator_from(
        &mut self,
        fixture: CalculatorFixture,
    ) -> Result<Calculator<'a>, FixtureError> {
        Ok(match fixture {
            CalculatorFixture::FlatPercentItemTotal { percent } => {
                Calculator::FlatPercentItemTotal(parse_percentage(&percent)?)
            }
            CalculatorFixture::FlatRate { amount } => Calculator::FlatRate(self.money(&amount)?),
            CalculatorFixture::FlexiRate {
                first_item,
                additional_item,
                max_items,
            } => Calculator::FlexiRate {
                first_item: self.money(&first_item)?,
                additional_item: self.money(&additional_item)?,
                max_items,
            },
            CalculatorFixture::PerItem { amount } => Calculator::PerItem(self.money(&amount)?),
            CalculatorFixture::FreeShipping => Calculator::FreeShipping,
        })
    }

    fn rule_from(&mut self, fixture: RuleFixture) -> Result<Rule<'a>, FixtureError> {
        Ok(match fixture {
            RuleFixture::ItemTotal { amount, operator } => Rule::ItemTotal {
                amount: self.money(&amount)?,
                operator: operator.into(),
            },
            RuleFixture::Product { products, policy } => Rule::Product {
                products: products
                    .iter()
                    .map(|product| self.product_key(product))
                    .collect::<Result<FxHashSet<_>, _>>()?,
                policy: policy.into(),
            },
            RuleFixture::ProductGroup { group, policy } => Rule::ProductGroup {
                group: self.group_key(&group)?,
                policy: policy.into(),
            },
            RuleFixture::User { customers } => Rule::User {
                customers: customers.into_iter().map(CustomerId).collect(),
            },
            RuleFixture::FirstOrder => Rule::FirstOrder,
        })
    }

    fn order_from(&mut self, fixture: OrderFixture) -> Result<Order<'a>, FixtureError> {
        let currency = self.currency()?;
        let mut order = Order::new(currency);

        for line_item in fixture.line_items {
            let product_key = self.product_key(&line_item.product)?;
            let price = self
                .catalog
                .product(product_key)
                .map(|product| product.price)
                .ok_or_else(|| FixtureError::ProductNotFound(line_item.product.clone()))?;

            order.add_line_item(LineItem::new(product_key, price, line_item.quantity))?;
        }

        for payment in fixture.payments {
            let amount = self.money(&payment.amount)?;

            order.add_payment(Payment::new(amount, payment.state.into()))?;
        }

        for charge_fixture in fixture.charges {
            let mut charge = Charge::new(charge_fixture.label, self.money(&charge_fixture.amount)?);
            charge.set_applicable(charge_fixture.applicable);

            order.add_charge(charge)?;
        }

        if let Some(ship_total) = fixture.ship_total {
            order.set_ship_total(self.money(&ship_total)?)?;
        }

        order.set_customer(fixture.customer.map(|customer| Customer {
            id: CustomerId(customer.id),
            completed_orders: customer.completed_orders,
        }));
        order.set_coupon_code(fixture.coupon_code);

        Ok(order)
    }

    /// Get a product by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&Product<'a>, FixtureError> {
        let product_key = self.product_key(key)?;

        self.catalog
            .product(product_key)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a product key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product_key(&self, key: &str) -> Result<ProductKey, FixtureError> {
        self.product_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a product group key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the group is not found.
    pub fn group_key(&self, key: &str) -> Result<ProductGroupKey, FixtureError> {
        self.group_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::ProductGroupNotFound(key.to_string()))
    }

    /// Get a promotion key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the promotion is not found.
    pub fn promotion_key(&self, key: &str) -> Result<PromotionKey, FixtureError> {
        self.promotion_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::PromotionNotFound(key.to_string()))
    }

    /// Get a promotion by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the promotion is not found.
    pub fn promotion(&self, key: &str) -> Result<&Promotion<'a>, FixtureError> {
        let promotion_key = self.promotion_key(key)?;

        self.registry
            .get(promotion_key)
            .ok_or_else(|| FixtureError::PromotionNotFound(key.to_string()))
    }

    /// Get a fresh copy of an order by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found.
    pub fn order(&self, key: &str) -> Result<Order<'a>, FixtureError> {
        self.orders
            .get(key)
            .cloned()
            .ok_or_else(|| FixtureError::OrderNotFound(key.to_string()))
    }

    /// Order keys, sorted
    pub fn order_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.orders.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Get the loaded engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }

    /// Build an engine from the loaded catalog, promotions and configuration
    pub fn into_engine(self) -> Engine<'a> {
        Engine::new(self.catalog, self.registry, self.config)
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}
