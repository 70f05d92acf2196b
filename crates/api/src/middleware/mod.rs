//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, set up hub per request) - added in `main`
//! 2. `TraceLayer` (request span, see [`make_request_span`])
//! 3. Request ID (record on span, tag Sentry, echo header)
//! 4. Security headers
//! 5. CORS (API routes only, also answers preflights)

pub mod cors;
pub mod request_id;
pub mod security_headers;

pub use cors::cors_middleware;
pub use request_id::{REQUEST_ID_HEADER, make_request_span, request_id_middleware};
pub use security_headers::security_headers_middleware;
