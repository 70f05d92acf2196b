//! Application state shared across handlers.

use std::path::Path;
use std::sync::Arc;

use order_intake_core::coupon::{CouponTable, CouponTableError};

use crate::config::ApiConfig;
use crate::services::{EasyPostClient, EasyPostError};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("address verification client: {0}")]
    EasyPost(#[from] EasyPostError),
    #[error("failed to read coupon table {path}: {source}")]
    CouponTableIo {
        path: String,
        source: std::io::Error,
    },
    #[error("coupon table: {0}")]
    CouponTable(#[from] CouponTableError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Everything inside is
/// read-only for the lifetime of the process.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    easypost: EasyPostClient,
    coupons: CouponTable,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `coupons` - Coupon table used by coupon validation
    ///
    /// # Errors
    ///
    /// Returns an error if the address verification client cannot be built.
    pub fn new(config: ApiConfig, coupons: CouponTable) -> Result<Self, StateError> {
        let easypost = EasyPostClient::new(&config.easypost)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                easypost,
                coupons,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the address verification client.
    #[must_use]
    pub fn easypost(&self) -> &EasyPostClient {
        &self.inner.easypost
    }

    /// Get a reference to the coupon table.
    #[must_use]
    pub fn coupons(&self) -> &CouponTable {
        &self.inner.coupons
    }
}

/// Load the coupon table named in configuration.
///
/// A missing path yields an empty table; every code is then rejected.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the table is invalid.
pub fn load_coupon_table(path: Option<&Path>) -> Result<CouponTable, StateError> {
    let Some(path) = path else {
        tracing::warn!("COUPON_TABLE_PATH not set; all coupon codes will be rejected");
        return Ok(CouponTable::empty());
    };

    let json = std::fs::read_to_string(path).map_err(|source| StateError::CouponTableIo {
        path: path.display().to_string(),
        source,
    })?;
    let table = CouponTable::from_json_str(&json)?;
    tracing::info!(path = %path.display(), coupons = table.len(), "Coupon table loaded");
    Ok(table)
}
