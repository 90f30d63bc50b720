// ABOUTME: HTTP middleware for the relay router
// ABOUTME: CORS for the widget origin and per-request tracing spans

/// CORS configuration for the widget origin
pub mod cors;
/// Per-request tracing spans
pub mod tracing;

pub use cors::setup_cors;
pub use tracing::{create_request_span, request_id, REQUEST_ID_HEADER};
