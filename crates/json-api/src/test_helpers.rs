//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use trolley::cart::{Cart, CartOwner, SessionToken};
use trolley_app::{
    context::AppContext,
    domain::carts::{MockCartsService, models::PricedCart},
};

use crate::{
    extensions::*,
    identity::{self, Identity},
    state::State,
};

pub(crate) const TEST_SESSION: &str = "tab-1";

pub(crate) fn guest_owner() -> CartOwner {
    CartOwner::Session(SessionToken::new(TEST_SESSION))
}

#[salvo::handler]
pub(crate) async fn inject_guest(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_identity(Identity {
        customer: None,
        session: Some(SessionToken::new(TEST_SESSION)),
    });

    ctrl.call_next(req, depot, res).await;
}

pub(crate) fn state_with_carts(carts: MockCartsService) -> Arc<State> {
    State::shared(AppContext {
        carts: Arc::new(carts),
    })
}

/// A guest-scoped service around a single route.
pub(crate) fn carts_service(carts: MockCartsService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with_carts(carts)))
            .hoop(inject_guest)
            .push(route),
    )
}

/// Same as [`carts_service`] but identity comes from request headers.
pub(crate) fn carts_service_with_headers(carts: MockCartsService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with_carts(carts)))
            .hoop(identity::handler)
            .push(route),
    )
}

pub(crate) fn make_cart(owner: CartOwner) -> Cart {
    Cart::new(owner, "GBP", Timestamp::UNIX_EPOCH)
}

pub(crate) fn priced(cart: Cart) -> PricedCart {
    PricedCart {
        cart,
        notices: Vec::new(),
    }
}
