//! JSON error responses

use salvo::{
    http::ResBody,
    oapi::{Components, EndpointOutRegister, Operation, ToSchema},
    prelude::*,
};
use serde::{Deserialize, Serialize};

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `coupon_expired`.
    pub code: String,

    /// Human readable explanation.
    pub message: String,
}

/// A [`StatusError`] rendered as an [`ErrorBody`]. The status error's
/// `detail` becomes the code; without one the code is derived from the
/// status name (`internal_server_error`).
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl From<StatusError> for ApiError {
    fn from(error: StatusError) -> Self {
        let code = error
            .detail
            .unwrap_or_else(|| error.name.to_lowercase().replace(' ', "_"));

        Self {
            status: error.code,
            body: ErrorBody {
                code,
                message: error.brief,
            },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.body.code, self.body.message)
    }
}

impl Scribe for ApiError {
    fn render(self, res: &mut Response) {
        res.stuff(self.status, Json(self.body));
    }
}

impl EndpointOutRegister for ApiError {
    fn register(components: &mut Components, operation: &mut Operation) {
        StatusError::register(components, operation);
    }
}

/// Catcher hoop giving errors raised outside the cart handlers (unknown
/// routes, rejected request bodies) the same JSON shape.
#[handler]
pub(crate) async fn catch_as_json(res: &mut Response, ctrl: &mut FlowCtrl) {
    let error = match res.take_body() {
        ResBody::Error(error) => error,
        ResBody::None => match res.status_code.and_then(StatusError::from_code) {
            Some(error) => error,
            None => return,
        },
        body => {
            res.body(body);

            return;
        }
    };

    res.render(ApiError::from(error));
    ctrl.skip_rest();
}
