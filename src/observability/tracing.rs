//! Request spans.
//!
//! Every dispatch runs inside a `dispatch` span carrying the request id, so
//! router and container events can be correlated with the access log.

use tracing::Span;

use crate::http::Request;

pub fn request_span(request: &Request) -> Span {
    tracing::info_span!(
        "dispatch",
        request_id = request.id().unwrap_or("unknown"),
        method = %request.method(),
        path = request.base_uri(),
    )
}
