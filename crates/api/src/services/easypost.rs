//! EasyPost address verification client.
//!
//! Creates an address with delivery verification enabled and converts the
//! provider's answer into [`ProviderVerification`] for shaping by the core
//! crate. No retries; every failure is returned to the caller.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use order_intake_core::address::{
    AddressInput, ProviderAddress, ProviderFieldError, ProviderVerification, VerificationOutcome,
};

use crate::config::EasyPostConfig;

/// Verification checks requested on every address.
const VERIFY_CHECKS: &[&str] = &["delivery"];

/// Errors that can occur when interacting with the EasyPost API.
#[derive(Debug, Error)]
pub enum EasyPostError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider is throttling our API key.
    #[error("Rate limited by address verification provider")]
    RateLimited,

    /// The provider rejected the shape of the submitted address.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// API returned any other error response.
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Response body did not match the expected schema.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The response has no delivery verification result.
    #[error("Response is missing the delivery verification result")]
    MissingVerification,

    /// Client could not be built from configuration.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Client for the EasyPost address API.
#[derive(Clone)]
pub struct EasyPostClient {
    client: reqwest::Client,
    addresses_url: Url,
    api_key: SecretString,
}

impl std::fmt::Debug for EasyPostClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EasyPostClient")
            .field("addresses_url", &self.addresses_url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl EasyPostClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the base URL
    /// cannot be extended with the addresses path.
    pub fn new(config: &EasyPostConfig) -> Result<Self, EasyPostError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("order-intake/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base = config.base_url.as_str().trim_end_matches('/');
        let addresses_url = Url::parse(&format!("{base}/addresses"))
            .map_err(|e| EasyPostError::Config(e.to_string()))?;

        Ok(Self {
            client,
            addresses_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Verify an address for deliverability.
    ///
    /// `street2` is never sent.
    ///
    /// # Errors
    ///
    /// Returns [`EasyPostError::RateLimited`] and
    /// [`EasyPostError::InvalidParameter`] for the provider's throttling and
    /// validation errors, and other variants for transport, API, or schema
    /// failures.
    #[instrument(skip(self, address), fields(city = %address.city, state = %address.state))]
    pub async fn verify_address(
        &self,
        address: &AddressInput,
    ) -> Result<ProviderVerification, EasyPostError> {
        let body = CreateAddressRequest {
            address: AddressBody {
                street1: &address.street1,
                city: &address.city,
                state: &address.state,
                zip: &address.zip,
                country: &address.country,
            },
            verify: VERIFY_CHECKS,
        };

        let response = self
            .client
            .post(self.addresses_url.clone())
            .basic_auth(self.api_key.expose_secret(), Some(""))
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let error = classify_error(status, &text);
            tracing::warn!(status = status.as_u16(), error = %error, "Address verification request failed");
            return Err(error);
        }

        let text = response.text().await?;
        let address: AddressResponse =
            serde_json::from_str(&text).map_err(|e| EasyPostError::Parse(e.to_string()))?;
        address.into_verification()
    }
}

/// Map a non-success response to an error variant.
fn classify_error(status: StatusCode, body: &str) -> EasyPostError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let code = envelope.as_ref().map(|e| e.error.code.clone());
    let message = envelope.map_or_else(
        || status.canonical_reason().unwrap_or("unknown error").to_string(),
        |e| e.error.message,
    );

    if status == StatusCode::TOO_MANY_REQUESTS || code.as_deref() == Some("RATE_LIMITED") {
        return EasyPostError::RateLimited;
    }

    let invalid_parameter = code
        .as_deref()
        .is_some_and(|c| c.starts_with("PARAMETER."))
        || matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
        );
    if invalid_parameter {
        return EasyPostError::InvalidParameter(message);
    }

    EasyPostError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct CreateAddressRequest<'a> {
    address: AddressBody<'a>,
    verify: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct AddressBody<'a> {
    street1: &'a str,
    city: &'a str,
    state: &'a str,
    zip: &'a str,
    country: &'a str,
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    #[serde(default)]
    mode: Option<String>,
    street1: String,
    city: String,
    state: String,
    zip: String,
    country: String,
    verifications: Verifications,
}

#[derive(Debug, Deserialize)]
struct Verifications {
    #[serde(default)]
    delivery: Option<Verification>,
    #[serde(default)]
    zip4: Option<Verification>,
}

#[derive(Debug, Deserialize)]
struct Verification {
    success: bool,
    #[serde(default)]
    errors: Vec<ProviderFieldError>,
}

impl From<Verification> for VerificationOutcome {
    fn from(v: Verification) -> Self {
        Self {
            success: v.success,
            errors: v.errors,
        }
    }
}

impl AddressResponse {
    fn into_verification(self) -> Result<ProviderVerification, EasyPostError> {
        let delivery = self
            .verifications
            .delivery
            .ok_or(EasyPostError::MissingVerification)?;

        Ok(ProviderVerification {
            address: ProviderAddress {
                street1: self.street1,
                city: self.city,
                state: self.state,
                zip: self.zip,
                country: self.country,
            },
            delivery: delivery.into(),
            zip4: self.verifications.zip4.map(Into::into),
            mode: self.mode,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer) -> EasyPostClient {
        EasyPostClient::new(&EasyPostConfig {
            api_key: SecretString::from("EZTK9f3aB7qLm2Xc8RvN4wYp6sD1hJ0k"),
            base_url: Url::parse(&server.url("/v2")).unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn input() -> AddressInput {
        AddressInput {
            street1: "417 montgomery street".to_string(),
            street2: Some("Floor 5".to_string()),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            zip: "94104".to_string(),
            country: "US".to_string(),
        }
    }

    #[tokio::test]
    async fn test_verify_address_sends_no_street2() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/addresses").json_body(json!({
                    "address": {
                        "street1": "417 montgomery street",
                        "city": "San Francisco",
                        "state": "CA",
                        "zip": "94104",
                        "country": "US"
                    },
                    "verify": ["delivery"]
                }));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "id": "adr_123",
                        "mode": "test",
                        "street1": "417 MONTGOMERY ST",
                        "street2": "FL 5",
                        "city": "SAN FRANCISCO",
                        "state": "CA",
                        "zip": "94104-1129",
                        "country": "US",
                        "verifications": {
                            "delivery": {"success": true, "errors": [], "details": {}},
                            "zip4": {"success": true, "errors": []}
                        }
                    }));
            })
            .await;

        let verification = client_for(&server).verify_address(&input()).await.unwrap();

        mock.assert_async().await;
        assert!(verification.delivery.success);
        assert_eq!(verification.address.street1, "417 MONTGOMERY ST");
        assert_eq!(verification.address.zip, "94104-1129");
        assert_eq!(verification.zip4.map(|z| z.success), Some(true));
        assert_eq!(verification.mode.as_deref(), Some("test"));
    }

    #[tokio::test]
    async fn test_missing_delivery_verification_fails_loudly() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/addresses");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "street1": "417 MONTGOMERY ST",
                        "city": "SAN FRANCISCO",
                        "state": "CA",
                        "zip": "94104",
                        "country": "US",
                        "verifications": {}
                    }));
            })
            .await;

        let err = client_for(&server)
            .verify_address(&input())
            .await
            .unwrap_err();
        assert!(matches!(err, EasyPostError::MissingVerification));
    }

    #[tokio::test]
    async fn test_delivery_errors_without_message_still_parse() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/addresses");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "street1": "417 MONTGOMERY ST",
                        "city": "SAN FRANCISCO",
                        "state": "CA",
                        "zip": "94104",
                        "country": "US",
                        "verifications": {
                            "delivery": {
                                "success": false,
                                "errors": [{"code": "E.HOUSE_NUMBER.INVALID", "field": "street1", "details": "range 400-499"}]
                            }
                        }
                    }));
            })
            .await;

        let verification = client_for(&server).verify_address(&input()).await.unwrap();
        let error = &verification.delivery.errors[0];
        assert_eq!(error.code, "E.HOUSE_NUMBER.INVALID");
        assert!(error.message.is_empty());
        assert_eq!(error.extra["details"], "range 400-499");
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/addresses");
                then.status(429)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "error": {"code": "RATE_LIMITED", "message": "Too many requests", "errors": []}
                    }));
            })
            .await;

        let err = client_for(&server)
            .verify_address(&input())
            .await
            .unwrap_err();
        assert!(matches!(err, EasyPostError::RateLimited));
    }

    #[test]
    fn test_classify_invalid_parameter() {
        let body = r#"{"error":{"code":"PARAMETER.INVALID","message":"Invalid zip","errors":[]}}"#;
        let err = classify_error(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert!(matches!(err, EasyPostError::InvalidParameter(ref m) if m == "Invalid zip"));
    }

    #[test]
    fn test_classify_other_errors() {
        let body = r#"{"error":{"code":"INTERNAL_SERVER_ERROR","message":"Oops","errors":[]}}"#;
        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, body);
        assert!(matches!(
            err,
            EasyPostError::Api { status: 500, code: Some(ref c), .. } if c == "INTERNAL_SERVER_ERROR"
        ));

        let err = classify_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(err, EasyPostError::Api { status: 502, code: None, ref message } if message == "Bad Gateway"));
    }

    #[test]
    fn test_classify_rate_limit_code_without_429() {
        let body = r#"{"error":{"code":"RATE_LIMITED","message":"slow down","errors":[]}}"#;
        assert!(matches!(
            classify_error(StatusCode::SERVICE_UNAVAILABLE, body),
            EasyPostError::RateLimited
        ));
    }
}
