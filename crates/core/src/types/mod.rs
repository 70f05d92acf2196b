//! Core value types.

pub mod price;

pub use price::{CurrencyCode, Price};
