//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `EASYPOST_API_KEY` - Address verification provider API key
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated front-end origins
//!   (e.g., `https://shop.example.com,https://www.shop.example.com`)
//!
//! ## Optional
//! - `INTAKE_HOST` - Bind address (default: 127.0.0.1)
//! - `INTAKE_PORT` - Listen port (default: 3000)
//! - `EASYPOST_BASE_URL` - Provider base URL (default: <https://api.easypost.com/v2>)
//! - `EASYPOST_TIMEOUT_SECS` - Provider request timeout (default: 10)
//! - `CORS_DEFAULT_ORIGIN` - Origin echoed to unrecognized callers
//!   (default: first entry of `CORS_ALLOWED_ORIGINS`)
//! - `COUPON_TABLE_PATH` - JSON coupon table (default: none, every code rejected)
//! - `FORM_WIDGET_SCRIPT_BASE` - Form widget script URL prefix
//!   (default: <https://form.jotform.com/jsform/>)
//! - `FORM_WIDGET_CONTAINER_ID` - Container element id (default: order-form)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use order_intake_core::embed::{
    DEFAULT_SCRIPT_BASE as DEFAULT_FORM_WIDGET_SCRIPT_BASE, validate_container_id,
};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_EASYPOST_BASE_URL: &str = "https://api.easypost.com/v2";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Address verification provider configuration
    pub easypost: EasyPostConfig,
    /// Cross-origin policy for the front end
    pub cors: CorsConfig,
    /// Coupon table file, if any
    pub coupon_table_path: Option<PathBuf>,
    /// Third-party form widget configuration
    pub form_widget: FormWidgetConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Address verification provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct EasyPostConfig {
    /// Provider API key (used as the basic-auth username)
    pub api_key: SecretString,
    /// Base URL including the API version path
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for EasyPostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EasyPostConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Allow-list of front-end origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    allowed_origins: Vec<String>,
    default_origin: String,
}

impl CorsConfig {
    /// Build a policy from an allow-list and the origin used for unknown callers.
    ///
    /// Origins are normalized to `scheme://host[:port]`. When `default_origin`
    /// is `None`, the first allowed origin is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, an origin does not parse, or the
    /// default origin is not in the list.
    pub fn new(allowed: &[&str], default_origin: Option<&str>) -> Result<Self, ConfigError> {
        let allowed_origins = allowed
            .iter()
            .map(|origin| normalize_origin(origin))
            .collect::<Result<Vec<_>, _>>()?;

        let default_origin = match default_origin {
            Some(origin) => normalize_origin(origin)?,
            None => allowed_origins.first().cloned().ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "CORS_ALLOWED_ORIGINS".to_string(),
                    "at least one origin is required".to_string(),
                )
            })?,
        };

        if !allowed_origins.contains(&default_origin) {
            return Err(ConfigError::InvalidEnvVar(
                "CORS_DEFAULT_ORIGIN".to_string(),
                format!("{default_origin} is not in CORS_ALLOWED_ORIGINS"),
            ));
        }

        Ok(Self {
            allowed_origins,
            default_origin,
        })
    }

    /// The origin to echo in `Access-Control-Allow-Origin` for a request.
    ///
    /// Recognized origins are echoed back; anything else, including a missing
    /// `Origin` header, gets the default origin.
    #[must_use]
    pub fn allow_origin_for(&self, request_origin: Option<&str>) -> &str {
        request_origin
            .and_then(|origin| {
                self.allowed_origins
                    .iter()
                    .find(|allowed| allowed.as_str() == origin.trim_end_matches('/'))
            })
            .unwrap_or(&self.default_origin)
    }

    #[must_use]
    pub fn default_origin(&self) -> &str {
        &self.default_origin
    }

    fn from_env() -> Result<Self, ConfigError> {
        let allowed = get_required_env("CORS_ALLOWED_ORIGINS")?;
        let allowed: Vec<&str> = allowed
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        let default_origin = get_optional_env("CORS_DEFAULT_ORIGIN");
        Self::new(&allowed, default_origin.as_deref())
    }
}

/// Third-party form widget configuration.
#[derive(Debug, Clone)]
pub struct FormWidgetConfig {
    /// Script URL prefix; the form id is appended
    pub script_base: String,
    /// Id of the element the widget is mounted into
    pub container_id: String,
}

impl FormWidgetConfig {
    /// Build a widget configuration, checking the container id.
    ///
    /// # Errors
    ///
    /// Returns an error if the container id is not safe to write into page
    /// markup (ASCII letter first, then alphanumerics, `-` or `_`).
    pub fn new(script_base: String, container_id: String) -> Result<Self, ConfigError> {
        validate_container_id(&container_id).map_err(|e| {
            ConfigError::InvalidEnvVar("FORM_WIDGET_CONTAINER_ID".to_string(), e.to_string())
        })?;
        Ok(Self {
            script_base,
            container_id,
        })
    }
}

impl Default for FormWidgetConfig {
    fn default() -> Self {
        Self {
            script_base: DEFAULT_FORM_WIDGET_SCRIPT_BASE.to_string(),
            container_id: "order-form".to_string(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("INTAKE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("INTAKE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("INTAKE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("INTAKE_PORT".to_string(), e.to_string()))?;

        let easypost = EasyPostConfig::from_env()?;
        let cors = CorsConfig::from_env()?;
        let coupon_table_path = get_optional_env("COUPON_TABLE_PATH").map(PathBuf::from);
        let form_widget = FormWidgetConfig::new(
            get_env_or_default("FORM_WIDGET_SCRIPT_BASE", DEFAULT_FORM_WIDGET_SCRIPT_BASE),
            get_env_or_default("FORM_WIDGET_CONTAINER_ID", "order-form"),
        )?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            host,
            port,
            easypost,
            cors,
            coupon_table_path,
            form_widget,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EasyPostConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_env_or_default("EASYPOST_BASE_URL", DEFAULT_EASYPOST_BASE_URL);
        let base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("EASYPOST_BASE_URL".to_string(), e.to_string()))?;
        let timeout = get_env_or_default("EASYPOST_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("EASYPOST_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_key: get_validated_secret("EASYPOST_API_KEY")?,
            base_url,
            timeout: Duration::from_secs(timeout),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Reduce an origin to `scheme://host[:port]`.
fn normalize_origin(origin: &str) -> Result<String, ConfigError> {
    let url = Url::parse(origin.trim()).map_err(|e| {
        ConfigError::InvalidEnvVar("CORS_ALLOWED_ORIGINS".to_string(), format!("{origin}: {e}"))
    })?;
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "CORS_ALLOWED_ORIGINS".to_string(),
            format!("{origin}: origin must have a host"),
        ));
    }
    Ok(url.origin().ascii_serialization())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
