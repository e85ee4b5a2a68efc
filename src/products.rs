//! Products

use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

new_key_type! {
    /// Product Group Key
    pub struct ProductGroupKey;
}

/// Product
#[derive(Debug, Clone)]
pub struct Product<'a> {
    /// Product name
    pub name: String,

    /// Product price
    pub price: Money<'a, Currency>,
}

/// A named set of products that promotion rules can target as a whole.
#[derive(Debug, Clone, Default)]
pub struct ProductGroup {
    /// Group name
    pub name: String,

    /// Member products
    pub products: FxHashSet<ProductKey>,
}

impl ProductGroup {
    /// Create a product group from its members.
    pub fn new(name: impl Into<String>, products: impl IntoIterator<Item = ProductKey>) -> Self {
        Self {
            name: name.into(),
            products: products.into_iter().collect(),
        }
    }

    /// Check whether a product belongs to the group.
    pub fn contains(&self, product: ProductKey) -> bool {
        self.products.contains(&product)
    }
}

/// Products and product groups known to the engine.
#[derive(Debug, Clone, Default)]
pub struct Catalog<'a> {
    products: SlotMap<ProductKey, Product<'a>>,
    groups: SlotMap<ProductGroupKey, ProductGroup>,
}

impl<'a> Catalog<'a> {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            products: SlotMap::with_key(),
            groups: SlotMap::with_key(),
        }
    }

    /// Add a product, returning its key.
    pub fn insert_product(&mut self, product: Product<'a>) -> ProductKey {
        self.products.insert(product)
    }

    /// Add a product group, returning its key.
    pub fn insert_group(&mut self, group: ProductGroup) -> ProductGroupKey {
        self.groups.insert(group)
    }

    /// Look up a product.
    pub fn product(&self, key: ProductKey) -> Option<&Product<'a>> {
        self.products.get(key)
    }

    /// Look up a product group.
    pub fn group(&self, key: ProductGroupKey) -> Option<&ProductGroup> {
        self.groups.get(key)
    }

    /// Product metadata, keyed by product.
    pub fn products(&self) -> &SlotMap<ProductKey, Product<'a>> {
        &self.products
    }

    /// Iterate over the groups a product belongs to.
    pub fn groups_containing(
        &self,
        product: ProductKey,
    ) -> impl Iterator<Item = ProductGroupKey> + '_ {
        self.groups
            .iter()
            .filter(move |(_, group)| group.contains(product))
            .map(|(key, _)| key)
    }
}
