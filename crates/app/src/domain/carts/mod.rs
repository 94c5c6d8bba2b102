//! Carts

pub mod errors;
pub mod models;
pub mod service;
pub mod stores;

pub use errors::CartsServiceError;
pub use service::*;
