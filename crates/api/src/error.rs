//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, ApiError>` (the coupon route wraps it in
//! [`CouponError`]). Errors render as a JSON envelope; server-side failures
//! are captured to Sentry before responding. CORS headers are added by
//! middleware after the error is rendered, so failures carry them too.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use order_intake_core::address::MissingFields;
use order_intake_core::embed::EmbedError;

use crate::services::EasyPostError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Required request fields were absent or blank.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// Malformed request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The address verification provider is throttling us.
    #[error("Rate limited")]
    RateLimited,

    /// The provider rejected the address as malformed.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The provider failed in any other way.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body for error responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_fields: Option<&'a [&'static str]>,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields(_) | Self::BadRequest(_) | Self::InvalidParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::MissingFields(_) => "Missing required address fields".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => {
                "Address verification is busy right now. Please try again in a moment.".to_string()
            }
            Self::InvalidParameter(_) => {
                "The address could not be checked. Please review it and try again.".to_string()
            }
            Self::Upstream(_) => "Address verification failed".to_string(),
            // Don't expose internal error details to clients
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Capture server errors to Sentry and log them.
    fn report(&self) {
        if matches!(self, Self::Upstream(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.report();

        let details = match &self {
            Self::Upstream(msg) | Self::InvalidParameter(msg) => Some(msg.as_str()),
            _ => None,
        };
        let missing_fields = match &self {
            Self::MissingFields(fields) => Some(fields.as_slice()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.public_message(),
            details,
            missing_fields,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<MissingFields> for ApiError {
    fn from(err: MissingFields) -> Self {
        Self::MissingFields(err.0)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<EasyPostError> for ApiError {
    fn from(err: EasyPostError) -> Self {
        match err {
            EasyPostError::RateLimited => Self::RateLimited,
            EasyPostError::InvalidParameter(msg) => Self::InvalidParameter(msg),
            EasyPostError::Config(msg) => Self::Internal(msg),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<EmbedError> for ApiError {
    fn from(err: EmbedError) -> Self {
        match err {
            EmbedError::InvalidFormId(_) => Self::BadRequest(err.to_string()),
            EmbedError::InvalidContainerId(_)
            | EmbedError::ContainerNotFound(_)
            | EmbedError::ElementNotFound => {
                Self::Internal(err.to_string())
            }
        }
    }
}

/// Coupon route error: same statuses as [`ApiError`], rendered as
/// `{"valid": false, "error": ...}`.
#[derive(Debug)]
pub struct CouponError(pub ApiError);

impl From<ApiError> for CouponError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for CouponError {
    fn from(rejection: JsonRejection) -> Self {
        Self(rejection.into())
    }
}

impl IntoResponse for CouponError {
    fn into_response(self) -> Response {
        self.0.report();
        let body = serde_json::json!({
            "valid": false,
            "error": self.0.public_message(),
        });
        (self.0.status(), Json(body)).into_response()
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;
