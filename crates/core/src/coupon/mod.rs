//! Promotional coupon definitions and validation results.
//!
//! Coupons are defined in a static table (see [`CouponTable`]) loaded at
//! startup. Validation never redeems anything; it only reports whether a code
//! is currently usable and, if so, the terms the checkout should apply.

mod table;

pub use table::{CouponTable, CouponTableError};

use core::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Price;

/// A coupon code as typed by a customer.
///
/// Codes are compared after trimming and ASCII upper-casing, so `welcome10`
/// and ` WELCOME10 ` name the same coupon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CouponCode(String);

impl CouponCode {
    /// Normalize a code. Returns `None` for empty or blank input.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a coupon takes off the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Discount {
    /// Percentage of the order subtotal, in (0, 100].
    PercentOff { percent: Decimal },
    /// Fixed amount off the order subtotal.
    AmountOff { amount: Price },
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PercentOff { percent } => write!(f, "{}% off", percent.normalize()),
            Self::AmountOff { amount } => write!(f, "{amount} off"),
        }
    }
}

/// How long a discount applies to a subscription order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CouponDuration {
    #[default]
    Once,
    Repeating,
    Forever,
}

/// A coupon as stored in the coupon table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponDefinition {
    /// Code customers type at checkout.
    pub code: String,
    /// Coupon identifier in the payment provider.
    pub id: String,
    /// Promotion code identifier the checkout attaches to the session.
    pub promotion_code_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub discount: Discount,
    #[serde(default)]
    pub duration: CouponDuration,
    /// Required when `duration` is `repeating`.
    #[serde(default)]
    pub duration_in_months: Option<u32>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_redemptions: Option<u32>,
    #[serde(default)]
    pub times_redeemed: u32,
}

const fn default_active() -> bool {
    true
}

/// Coupon fields safe to show a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCoupon {
    pub id: String,
    pub code: String,
    pub name: Option<String>,
    pub discount: Discount,
    pub duration: CouponDuration,
    pub duration_in_months: Option<u32>,
}

impl From<&CouponDefinition> for PublicCoupon {
    fn from(def: &CouponDefinition) -> Self {
        Self {
            id: def.id.clone(),
            code: def.code.clone(),
            name: def.name.clone(),
            discount: def.discount,
            duration: def.duration,
            duration_in_months: def.duration_in_months,
        }
    }
}

/// Why a coupon code cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponRejection {
    NotFound,
    Inactive,
    Expired,
    RedemptionLimitReached,
}

impl CouponRejection {
    /// Customer-facing reason.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::NotFound => "Invalid coupon code",
            Self::Inactive => "This coupon is no longer active",
            Self::Expired => "This coupon has expired",
            Self::RedemptionLimitReached => "This coupon has reached its redemption limit",
        }
    }
}

/// Result of validating a coupon code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponResolution {
    pub valid: bool,
    pub coupon: Option<PublicCoupon>,
    pub promotion_code_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CouponResolution {
    #[must_use]
    pub fn accepted(def: &CouponDefinition) -> Self {
        Self {
            valid: true,
            coupon: Some(PublicCoupon::from(def)),
            promotion_code_id: Some(def.promotion_code_id.clone()),
            error: None,
        }
    }

    #[must_use]
    pub fn rejected(rejection: CouponRejection) -> Self {
        Self {
            valid: false,
            coupon: None,
            promotion_code_id: None,
            error: Some(rejection.reason().to_string()),
        }
    }
}
