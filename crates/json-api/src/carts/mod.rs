//! Cart endpoints

pub(crate) mod coupon;
pub(crate) mod errors;
pub(crate) mod handlers;
pub(crate) mod items;
pub(crate) mod offers;
pub(crate) mod responses;

pub(crate) use handlers::*;
