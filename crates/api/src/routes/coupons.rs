//! Coupon validation route handler.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use order_intake_core::coupon::{CouponCode, CouponResolution};

use crate::error::{ApiError, CouponError};
use crate::state::AppState;

/// Coupon validation request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRequest {
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Check whether a coupon code can be applied.
///
/// POST /api/coupons/validate
///
/// Unknown and ineligible codes are a normal answer (`200`, `valid: false`).
/// Only an empty code or an unreadable body is a client error.
#[instrument(skip(state, payload))]
pub async fn validate(
    State(state): State<AppState>,
    payload: Result<Json<CouponRequest>, JsonRejection>,
) -> Result<Json<CouponResolution>, CouponError> {
    let Json(request) = payload?;

    let code = request
        .coupon_code
        .as_deref()
        .and_then(CouponCode::parse)
        .ok_or_else(|| ApiError::BadRequest("Coupon code is required".to_string()))?;

    let resolution = state.coupons().validate(&code, Utc::now());
    tracing::info!(code = %code, valid = resolution.valid, "Coupon checked");

    Ok(Json(resolution))
}
