//! Shared handler state

use std::sync::Arc;

use trolley_app::{context::AppContext, domain::carts::CartsService};

/// Services every handler reaches through the depot.
#[derive(Clone)]
pub(crate) struct State {
    app: AppContext,
}

impl State {
    pub(crate) fn shared(app: AppContext) -> Arc<Self> {
        Arc::new(Self { app })
    }

    pub(crate) fn carts(&self) -> &dyn CartsService {
        self.app.carts.as_ref()
    }
}
