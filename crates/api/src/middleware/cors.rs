//! Cross-origin headers for the front-end API routes.
//!
//! The allow-list lives in [`CorsConfig`](crate::config::CorsConfig). A
//! recognized `Origin` is echoed back; any other caller gets the default
//! production origin, which browsers then refuse for foreign pages.
//!
//! Headers are applied after the handler runs, so error responses carry them
//! as well. Preflight `OPTIONS` requests are answered here with `200 OK` and
//! never reach a handler.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, X-Request-Id";
const PREFLIGHT_MAX_AGE_SECS: &str = "86400";

/// Apply the CORS policy to every response and answer preflights.
pub async fn cors_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let request_origin = request
        .headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let allow_origin = state
        .config()
        .cors
        .allow_origin_for(request_origin.as_deref())
        .to_string();

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    apply_cors_headers(response.headers_mut(), &allow_origin);
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, allow_origin: &str) {
    match HeaderValue::from_str(allow_origin) {
        Ok(value) => {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        Err(e) => {
            // Origins are normalized at config load, so this means a bad config.
            tracing::error!(error = %e, origin = allow_origin, "Unusable CORS origin");
        }
    }
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE_SECS),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_cors_headers() {
        let mut headers = HeaderMap::new();
        apply_cors_headers(&mut headers, "https://shop.test");

        assert_eq!(
            headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).map(HeaderValue::as_bytes),
            Some(&b"https://shop.test"[..])
        );
        assert_eq!(
            headers.get(ACCESS_CONTROL_ALLOW_METHODS).map(HeaderValue::as_bytes),
            Some(ALLOWED_METHODS.as_bytes())
        );
        assert_eq!(headers.get_all(VARY).iter().count(), 1);
    }
}
