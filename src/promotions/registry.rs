//! Promotion Registry
//!
//! The set of promotions an engine knows about. Built once at startup, then handed to the
//! engine, which only ever reads it.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use thiserror::Error;

use crate::promotions::{Promotion, PromotionKey};

/// Errors raised while building a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two promotions share a redemption code, compared case-insensitively.
    #[error("Promotion code {0} is already in use")]
    DuplicateCode(String),

    /// A redemption code was present but blank.
    #[error("Promotion {0} has a blank code")]
    BlankCode(String),
}

/// Promotions keyed by [`PromotionKey`], with a case-insensitive code index.
#[derive(Debug, Default)]
pub struct PromotionRegistry<'a> {
    promotions: SlotMap<PromotionKey, Promotion<'a>>,
    codes: FxHashMap<String, PromotionKey>,
}

fn normalise_code(code: &str) -> String {
    code.to_uppercase()
}

impl<'a> PromotionRegistry<'a> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            promotions: SlotMap::with_key(),
            codes: FxHashMap::default(),
        }
    }

    /// Register a promotion, returning its key.
    ///
    /// # Errors
    ///
    /// Returns a `RegistryError` if the promotion's code is blank or already taken.
    pub fn insert(&mut self, promotion: Promotion<'a>) -> Result<PromotionKey, RegistryError> {
        let code = match promotion.code() {
            Some(code) if code.trim().is_empty() => {
                return Err(RegistryError::BlankCode(promotion.name().to_string()));
            }
            Some(code) => {
                let code = normalise_code(code);

                if self.codes.contains_key(&code) {
                    return Err(RegistryError::DuplicateCode(code));
                }

                Some(code)
            }
            None => None,
        };

        let key = self.promotions.insert(promotion);

        if let Some(code) = code {
            self.codes.insert(code, key);
        }

        Ok(key)
    }

    /// Look up a promotion.
    pub fn get(&self, key: PromotionKey) -> Option<&Promotion<'a>> {
        self.promotions.get(key)
    }

    /// Find the promotion whose code matches, ignoring case.
    pub fn find_by_code(&self, code: &str) -> Option<(PromotionKey, &Promotion<'a>)> {
        let key = *self.codes.get(&normalise_code(code))?;

        self.promotions.get(key).map(|promotion| (key, promotion))
    }

    /// Iterate over every promotion.
    pub fn iter(&self) -> impl Iterator<Item = (PromotionKey, &Promotion<'a>)> {
        self.promotions.iter()
    }

    /// Iterate over the automatic promotions.
    pub fn automatic(&self) -> impl Iterator<Item = (PromotionKey, &Promotion<'a>)> {
        self.iter().filter(|(_, promotion)| promotion.is_automatic())
    }

    /// Number of registered promotions.
    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use crate::calculators::Calculator;

    use super::*;

    fn five_off() -> Calculator<'static> {
        Calculator::FlatRate(Money::from_minor(500, GBP))
    }

    #[test]
    fn find_by_code_ignores_case() -> TestResult {
        let mut registry = PromotionRegistry::new();
        let key = registry.insert(Promotion::coupon("Save 10", "SAVE10", five_off()))?;

        let found = registry.find_by_code("save10").map(|(key, _)| key);

        assert_eq!(found, Some(key));
        assert!(registry.find_by_code("SAVE1").is_none());

        Ok(())
    }

    #[test]
    fn duplicate_codes_are_rejected() -> TestResult {
        let mut registry = PromotionRegistry::new();
        registry.insert(Promotion::coupon("Save 10", "SAVE10", five_off()))?;

        let result = registry.insert(Promotion::coupon("Also save 10", "Save10", five_off()));

        assert_eq!(result, Err(RegistryError::DuplicateCode("SAVE10".to_string())));
        assert_eq!(registry.len(), 1);

        Ok(())
    }

    #[test]
    fn blank_codes_are_rejected() {
        let mut registry = PromotionRegistry::new();

        let result = registry.insert(Promotion::coupon("Blank", "  ", five_off()));

        assert_eq!(result, Err(RegistryError::BlankCode("Blank".to_string())));
    }

    #[test]
    fn automatic_skips_coupon_promotions() -> TestResult {
        let mut registry = PromotionRegistry::new();
        let automatic = registry.insert(Promotion::new("Auto", five_off()))?;
        registry.insert(Promotion::coupon("Coupon", "CODE", five_off()))?;

        let keys: Vec<_> = registry.automatic().map(|(key, _)| key).collect();

        assert_eq!(keys, vec![automatic]);

        Ok(())
    }
}
