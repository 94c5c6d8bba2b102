//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};
use trolley::cart::CartOwner;

use crate::identity::Identity;

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    fn insert_identity(&mut self, identity: Identity);

    fn identity_or_401(&self) -> Result<&Identity, StatusError>;

    /// The cart owner for this request; a customer takes precedence over a
    /// guest session.
    fn cart_owner_or_401(&self) -> Result<CartOwner, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_identity(&mut self, identity: Identity) {
        self.inject(identity);
    }

    fn identity_or_401(&self) -> Result<&Identity, StatusError> {
        self.obtain::<Identity>()
            .map_err(|_ignored| StatusError::unauthorized().brief("Missing cart identity"))
    }

    fn cart_owner_or_401(&self) -> Result<CartOwner, StatusError> {
        self.identity_or_401()?
            .owner()
            .ok_or_else(|| StatusError::unauthorized().brief("Missing cart identity"))
    }
}
