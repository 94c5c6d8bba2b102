//! Cart Offer Handlers

pub(crate) mod accept;
pub(crate) mod resolve;
