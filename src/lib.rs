//! Rebate
//!
//! Rebate decides which promotions apply to a shopping order, and keeps the order's discount
//! credits in step with its contents as line items and payments change.
//!
//! The [`engine::Engine`] owns a read-only [`promotions::registry::PromotionRegistry`] and
//! [`products::Catalog`]; every call to [`engine::Engine::reconcile`] brings an
//! [`orders::Order`]'s automatic credits back in line with the promotions it currently
//! qualifies for, then recomputes its totals.

pub mod calculators;
pub mod cli;
pub mod discounts;
pub mod engine;
pub mod fixtures;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod promotions;
pub mod receipt;
pub mod rules;
