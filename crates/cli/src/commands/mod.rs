//! Subcommand implementations.
//!
//! Each command returns the text to print so it can be tested without
//! capturing stdout.

pub mod coupon;
pub mod embed;
pub mod shipping;

use std::path::PathBuf;

use thiserror::Error;

use order_intake_core::coupon::CouponTableError;
use order_intake_core::embed::EmbedError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The coupon table failed to load.
    #[error("Invalid coupon table: {0}")]
    CouponTable(#[from] CouponTableError),

    /// The coupon code was empty.
    #[error("Coupon code is required")]
    EmptyCouponCode,

    /// The form widget could not be embedded.
    #[error("Embed failed: {0}")]
    Embed(#[from] EmbedError),

    /// Output could not be serialized.
    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}
