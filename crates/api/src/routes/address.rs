//! Address validation route handler.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::instrument;

use order_intake_core::address::{AddressInput, AddressVerificationResult, RawAddress};

use crate::error::Result;
use crate::state::AppState;

/// Verify a shipping address before checkout.
///
/// POST /api/address/validate
///
/// Required fields are checked before the provider is called, so a missing
/// `zip` never costs a verification request.
#[instrument(skip(state, payload))]
pub async fn validate(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RawAddress>, JsonRejection>,
) -> Result<Json<AddressVerificationResult>> {
    let Json(raw) = payload?;
    let input = AddressInput::try_from(raw)?;

    let verification = state.easypost().verify_address(&input).await?;
    let result = AddressVerificationResult::from_provider(&input, verification);

    tracing::info!(
        deliverable = result.deliverable,
        suggested = !result.suggestions.is_empty(),
        zip_mismatch = result.zip_mismatch,
        "Address verified"
    );

    Ok(Json(result))
}
