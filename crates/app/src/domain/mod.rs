//! Trolley Domain Concerns

pub mod carts;
pub mod catalog;
pub mod coupons;
pub mod offers;
pub mod orders;
