//! `x-request-id` handling.

use std::fmt::{Display, Formatter, Result as FmtResult};

use salvo::{Request, http::header::HeaderValue, prelude::Response};
use tracing::warn;
use uuid::Uuid;

pub(super) const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlates a request across logs, spans and the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RequestId(String);

impl RequestId {
    pub(super) fn from_request(req: &Request) -> Self {
        Self::from_header(req.header::<String>(REQUEST_ID_HEADER))
    }

    /// Keeps the caller's id unless it is blank.
    fn from_header(value: Option<String>) -> Self {
        let id = value
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| Uuid::now_v7().to_string());

        Self(id)
    }

    /// Echo the id back on the response.
    pub(super) fn write_header(&self, res: &mut Response) {
        match HeaderValue::from_str(&self.0) {
            Ok(value) => {
                res.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            Err(source) => warn!(request_id = %self.0, "request id is not a valid header value: {source}"),
        }
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
