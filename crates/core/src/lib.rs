//! Trolley
//!
//! Trolley is a deterministic cart pricing engine: quantity stepping and stock
//! validation, coupon validation, placement-scoped cart offers, and a fixed
//! order pricing pass that yields identical totals every time it runs on the
//! same inputs.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod coupons;
pub mod fixtures;
pub mod ids;
pub mod items;
pub mod money;
pub mod offers;
pub mod pricing;
pub mod units;
