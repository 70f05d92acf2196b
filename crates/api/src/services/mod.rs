//! Clients for external services.
//!
//! # Services
//!
//! - `easypost` - Address verification provider

pub mod easypost;

pub use easypost::{EasyPostClient, EasyPostError};
