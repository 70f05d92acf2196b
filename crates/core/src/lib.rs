//! Order Intake Core - Shared types and decision logic.
//!
//! This crate provides the request-independent pieces used by every
//! order intake component:
//! - `api` - HTTP service (address validation, coupon validation, shipping lookup)
//! - `cli` - Command-line tools for checking shipping rules and coupon tables
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Calls to the address verification provider live in the `api`
//! crate, which feeds the provider's answer back into [`address`] for shaping.
//!
//! # Modules
//!
//! - [`shipping`] - Carrier and service-level resolution
//! - [`address`] - Address input, verification result shaping, ZIP heuristic
//! - [`coupon`] - Coupon table and eligibility rules
//! - [`embed`] - Third-party form widget embedding
//! - [`types`] - Money types shared by coupon terms

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod coupon;
pub mod embed;
pub mod shipping;
pub mod types;

pub use types::*;
