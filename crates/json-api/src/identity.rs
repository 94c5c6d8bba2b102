//! Cart identity middleware.
//!
//! Authentication happens upstream; by the time a request reaches this
//! service it carries the customer id and/or the guest session token in
//! headers.

use salvo::prelude::*;
use trolley::cart::{CartOwner, CustomerUuid, SessionToken};
use uuid::Uuid;

use crate::{errors::ApiError, extensions::*};

pub(crate) const CUSTOMER_HEADER: &str = "x-customer-uuid";
pub(crate) const SESSION_HEADER: &str = "x-session-token";

/// Identity headers of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    pub(crate) customer: Option<CustomerUuid>,
    pub(crate) session: Option<SessionToken>,
}

impl Identity {
    /// Whose cart this request operates on.
    pub(crate) fn owner(&self) -> Option<CartOwner> {
        match (&self.customer, &self.session) {
            (Some(customer), _) => Some(CartOwner::Customer(*customer)),
            (None, Some(session)) => Some(CartOwner::Session(session.clone())),
            (None, None) => None,
        }
    }
}

fn header_value(req: &Request, name: &str) -> Option<String> {
    req.header::<String>(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let customer = match header_value(req, CUSTOMER_HEADER).map(|raw| Uuid::parse_str(&raw)) {
        None => None,
        Some(Ok(uuid)) => Some(CustomerUuid::from_uuid(uuid)),
        Some(Err(_error)) => {
            res.render(ApiError::from(
                StatusError::unauthorized()
                    .brief("x-customer-uuid is not a valid UUID")
                    .detail("invalid_identity"),
            ));

            return;
        }
    };

    let identity = Identity {
        customer,
        session: header_value(req, SESSION_HEADER).map(SessionToken::new),
    };

    if identity.owner().is_none() {
        res.render(ApiError::from(
            StatusError::unauthorized()
                .brief("Missing x-customer-uuid or x-session-token header")
                .detail("missing_identity"),
        ));

        return;
    }

    depot.insert_identity(identity);

    ctrl.call_next(req, depot, res).await;
}
