//! Static coupon table and eligibility rules.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use super::{
    CouponCode, CouponDefinition, CouponDuration, CouponRejection, CouponResolution, Discount,
};

/// Errors loading a coupon table.
#[derive(Debug, Error)]
pub enum CouponTableError {
    /// The table file is not valid JSON or does not match the schema.
    #[error("invalid coupon table JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A coupon has an empty code.
    #[error("coupon {id} has an empty code")]
    EmptyCode { id: String },

    /// Two coupons share a code (compared case-insensitively).
    #[error("duplicate coupon code: {0}")]
    DuplicateCode(String),

    /// A coupon's terms are out of range.
    #[error("coupon {code}: {reason}")]
    InvalidTerms { code: String, reason: String },
}

/// Immutable lookup table of coupon definitions keyed by normalized code.
#[derive(Debug, Clone, Default)]
pub struct CouponTable {
    coupons: HashMap<CouponCode, CouponDefinition>,
}

impl CouponTable {
    /// An empty table; every code is rejected.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from definitions, validating each one.
    ///
    /// # Errors
    ///
    /// Returns an error if a code is empty or duplicated, or if a coupon's
    /// discount or duration terms are out of range.
    pub fn new(definitions: Vec<CouponDefinition>) -> Result<Self, CouponTableError> {
        let mut coupons = HashMap::with_capacity(definitions.len());

        for def in definitions {
            let code = CouponCode::parse(&def.code).ok_or_else(|| CouponTableError::EmptyCode {
                id: def.id.clone(),
            })?;
            validate_terms(&def)?;

            if coupons.contains_key(&code) {
                return Err(CouponTableError::DuplicateCode(code.to_string()));
            }
            coupons.insert(code, def);
        }

        Ok(Self { coupons })
    }

    /// Parse a table from a JSON array of coupon definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or any definition is invalid.
    pub fn from_json_str(json: &str) -> Result<Self, CouponTableError> {
        let definitions: Vec<CouponDefinition> = serde_json::from_str(json)?;
        Self::new(definitions)
    }

    /// Number of coupons in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }

    /// All definitions, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &CouponDefinition> {
        self.coupons.values()
    }

    /// Look up a coupon by code, ignoring eligibility.
    #[must_use]
    pub fn get(&self, code: &CouponCode) -> Option<&CouponDefinition> {
        self.coupons.get(code)
    }

    /// Validate a code against the table as of `now`.
    ///
    /// Unknown and ineligible codes produce a rejected resolution with a
    /// customer-facing reason; this never fails.
    #[must_use]
    pub fn validate(&self, code: &CouponCode, now: DateTime<Utc>) -> CouponResolution {
        let Some(def) = self.get(code) else {
            tracing::debug!(code = %code, "Coupon code not found");
            return CouponResolution::rejected(CouponRejection::NotFound);
        };

        match check_eligibility(def, now) {
            Ok(()) => CouponResolution::accepted(def),
            Err(rejection) => {
                tracing::debug!(code = %code, ?rejection, "Coupon code not eligible");
                CouponResolution::rejected(rejection)
            }
        }
    }
}

/// Apply eligibility rules in order: active, not expired, under the
/// redemption limit.
fn check_eligibility(def: &CouponDefinition, now: DateTime<Utc>) -> Result<(), CouponRejection> {
    if !def.active {
        return Err(CouponRejection::Inactive);
    }
    if def.expires_at.is_some_and(|expires_at| expires_at <= now) {
        return Err(CouponRejection::Expired);
    }
    if def
        .max_redemptions
        .is_some_and(|max| def.times_redeemed >= max)
    {
        return Err(CouponRejection::RedemptionLimitReached);
    }
    Ok(())
}

fn validate_terms(def: &CouponDefinition) -> Result<(), CouponTableError> {
    let invalid = |reason: &str| CouponTableError::InvalidTerms {
        code: def.code.clone(),
        reason: reason.to_string(),
    };

    match def.discount {
        Discount::PercentOff { percent } => {
            if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                return Err(invalid("percent off must be greater than 0 and at most 100"));
            }
        }
        Discount::AmountOff { amount } => {
            if !amount.is_positive() {
                return Err(invalid("amount off must be positive"));
            }
        }
    }

    match (def.duration, def.duration_in_months) {
        (CouponDuration::Repeating, None | Some(0)) => Err(invalid(
            "repeating coupons need a positive durationInMonths",
        )),
        (CouponDuration::Once | CouponDuration::Forever, Some(_)) => Err(invalid(
            "durationInMonths is only allowed for repeating coupons",
        )),
        _ => Ok(()),
    }
}
