//! Shipping carrier/service lookup.

use axum::{Json, extract::Query};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use order_intake_core::shipping::{ShippingResolution, get_shipping_carrier_and_service};

use crate::error::{ApiError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub fulfillment_type: String,
}

#[derive(Debug, Serialize)]
pub struct ShippingServiceResponse {
    #[serde(flatten)]
    pub resolution: ShippingResolution,
    pub automatable: bool,
}

/// Resolve the carrier and service for an order.
///
/// GET /api/shipping/service?category=&speed=&fulfillmentType=
///
/// Unsupported combinations answer `200` with `carrier`/`service` null and
/// `automatable: false`.
#[instrument]
pub async fn service(Query(query): Query<ShippingQuery>) -> Result<Json<ShippingServiceResponse>> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("category is required".to_string()))?;

    let resolution =
        get_shipping_carrier_and_service(category, &query.speed, &query.fulfillment_type);

    Ok(Json(ShippingServiceResponse {
        automatable: resolution.is_supported(),
        resolution,
    }))
}
