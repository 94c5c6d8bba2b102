//! Span naming.

use uuid::Uuid;

/// Route template and span name for a request. UUID segments collapse to
/// `{uuid}` so `/cart/items/{uuid}` stays one series.
#[derive(Debug, Clone)]
pub(super) struct RouteName {
    pub(super) route: String,
    pub(super) span: String,
}

impl RouteName {
    pub(super) fn new(method: &str, path: &str) -> Self {
        let route = route_template(path);
        let span = format!("{method} {route}");

        Self { route, span }
    }
}

fn route_template(path: &str) -> String {
    let route = path
        .split('/')
        .map(|segment| {
            if Uuid::parse_str(segment).is_ok() {
                "{uuid}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    if route.is_empty() { "/".to_owned() } else { route }
}
