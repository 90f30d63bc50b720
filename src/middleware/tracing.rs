// ABOUTME: Request tracing for the relay's HTTP surface
// ABOUTME: Builds one span per request carrying a request id taken from x-request-id or generated

use http::Request;
use tracing::Span;
use uuid::Uuid;

/// Header carrying a caller-supplied request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id from the incoming header, or a fresh `req_<uuid>`
#[must_use]
pub fn request_id<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map_or_else(
            || format!("req_{}", Uuid::new_v4().simple()),
            ToOwned::to_owned,
        )
}

/// Span used by `TraceLayer::make_span_with`
pub fn create_request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request),
        status_code = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}
