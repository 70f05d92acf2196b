//! Shipping address input and verification result shaping.
//!
//! The address verification provider is called from the `api` crate. This
//! module owns everything on either side of that call:
//! - [`RawAddress`] / [`AddressInput`] - request body and its validated form
//! - [`ProviderVerification`] - what the provider told us
//! - [`AddressVerificationResult`] - what we tell the caller
//!
//! Apartment and unit numbers (`street2`) are never sent to the provider. It
//! cannot reliably verify them and has been seen to invent suggestions for
//! units that do not exist, so the caller's original `street2` is carried
//! through to every record we return.

mod zip_heuristic;

pub use zip_heuristic::zip_mismatch;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Country assumed when the caller omits one.
pub const DEFAULT_COUNTRY: &str = "US";

/// Required address fields were absent or blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", .0.join(", "))]
pub struct MissingFields(pub Vec<&'static str>);

/// Address as submitted by the front end, before presence checks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddress {
    #[serde(default)]
    pub street1: Option<String>,
    #[serde(default)]
    pub street2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// A shipping address with all required fields present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInput {
    pub street1: String,
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// Trim a field and treat blank values as absent.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<RawAddress> for AddressInput {
    type Error = MissingFields;

    fn try_from(raw: RawAddress) -> Result<Self, Self::Error> {
        let street1 = present(raw.street1);
        let city = present(raw.city);
        let state = present(raw.state);
        let zip = present(raw.zip);

        let missing: Vec<&'static str> = [
            ("street1", street1.is_none()),
            ("city", city.is_none()),
            ("state", state.is_none()),
            ("zip", zip.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (street1, city, state, zip) {
            (Some(street1), Some(city), Some(state), Some(zip)) => Ok(Self {
                street1,
                street2: present(raw.street2),
                city,
                state,
                zip,
                country: present(raw.country).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            }),
            _ => Err(MissingFields(missing)),
        }
    }
}

/// Address-shaped record returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    pub street1: String,
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// Address fields as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAddress {
    pub street1: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

/// A field-level error reported by the provider, passed through as-is.
///
/// Every known field is optional on the way in, so one odd entry never turns
/// a verification into a parse failure. Fields we do not model are kept in
/// `extra` and serialized back at the top level of the error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFieldError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of one provider verification check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub success: bool,
    pub errors: Vec<ProviderFieldError>,
}

/// Everything the address shaping needs from a provider response.
///
/// `delivery` is required: a provider answer without it is a schema change
/// and must be rejected upstream of this type, not read as "undeliverable".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderVerification {
    pub address: ProviderAddress,
    pub delivery: VerificationOutcome,
    pub zip4: Option<VerificationOutcome>,
    /// Provider account mode (`test` or `production`).
    pub mode: Option<String>,
}

/// Provider check results echoed back for debugging on the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationDetails {
    pub delivery_success: bool,
    pub zip4_success: Option<bool>,
    pub mode: Option<String>,
}

/// Response body for a successful verification round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressVerificationResult {
    pub deliverable: bool,
    pub verified_address: AddressRecord,
    /// Corrected address to offer the customer; at most one entry.
    pub suggestions: Vec<AddressRecord>,
    pub errors: Vec<ProviderFieldError>,
    /// Local ZIP plausibility heuristic. Only computed for undeliverable
    /// addresses and never authoritative.
    pub zip_mismatch: bool,
    pub verification_details: VerificationDetails,
}

impl ProviderAddress {
    /// Returns true if the provider changed any of the verified fields.
    #[must_use]
    pub fn differs_from(&self, input: &AddressInput) -> bool {
        self.street1.trim() != input.street1
            || self.city.trim() != input.city
            || self.state.trim() != input.state
            || self.zip.trim() != input.zip
    }

    fn to_record(&self, street2: Option<String>) -> AddressRecord {
        AddressRecord {
            street1: self.street1.clone(),
            street2,
            city: self.city.clone(),
            state: self.state.clone(),
            zip: self.zip.clone(),
            country: self.country.clone(),
        }
    }
}

impl AddressVerificationResult {
    /// Shape the provider's answer for the caller.
    #[must_use]
    pub fn from_provider(input: &AddressInput, provider: ProviderVerification) -> Self {
        let deliverable = provider.delivery.success;
        let was_standardized = provider.address.differs_from(input);

        let suggestions = if was_standardized && deliverable {
            vec![provider.address.to_record(input.street2.clone())]
        } else {
            Vec::new()
        };

        let zip_mismatch = !deliverable && zip_mismatch(&input.city, &input.state, &input.zip);

        Self {
            deliverable,
            verified_address: provider.address.to_record(input.street2.clone()),
            suggestions,
            errors: provider.delivery.errors,
            zip_mismatch,
            verification_details: VerificationDetails {
                delivery_success: deliverable,
                zip4_success: provider.zip4.map(|z| z.success),
                mode: provider.mode,
            },
        }
    }
}
