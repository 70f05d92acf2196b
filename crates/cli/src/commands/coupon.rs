//! Coupon table commands.
//!
//! # Usage
//!
//! ```bash
//! oi-cli coupon check welcome10 --table coupons.json
//! oi-cli coupon check subscribe3 --table coupons.json --at 2028-01-01T00:00:00Z
//! oi-cli coupon lint coupons.json
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::json;

use order_intake_core::coupon::{CouponCode, CouponTable};

use super::CliError;

fn load_table(path: &Path) -> Result<CouponTable, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(CouponTable::from_json_str(&content)?)
}

/// Validate a code against a table as of `now` and render the resolution.
///
/// # Errors
///
/// Returns an error if the code is blank or the table cannot be loaded.
pub fn check(code: &str, table: &Path, now: DateTime<Utc>) -> Result<String, CliError> {
    let code = CouponCode::parse(code).ok_or(CliError::EmptyCouponCode)?;
    let table = load_table(table)?;

    let resolution = table.validate(&code, now);
    tracing::info!(code = %code, valid = resolution.valid, at = %now, "Checked coupon");

    Ok(serde_json::to_string_pretty(&resolution)?)
}

/// Load a table and summarize it.
///
/// Load-time validation rejects empty and duplicate codes and invalid terms,
/// so a successful load is a clean lint. Each coupon is listed with its terms
/// in human-readable form, sorted by code.
///
/// # Errors
///
/// Returns the first problem found in the table.
pub fn lint(table: &Path) -> Result<String, CliError> {
    let coupons = load_table(table)?;
    tracing::info!(path = %table.display(), coupons = coupons.len(), "Coupon table is valid");

    let mut definitions: Vec<_> = coupons.iter().collect();
    definitions.sort_by(|a, b| a.code.cmp(&b.code));
    let listing: Vec<_> = definitions
        .into_iter()
        .map(|def| {
            json!({
                "code": def.code,
                "terms": def.discount.to_string(),
                "active": def.active,
            })
        })
        .collect();

    Ok(serde_json::to_string_pretty(&json!({
        "path": table.display().to_string(),
        "coupons": listing,
        "valid": true,
    }))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use chrono::TimeZone;
    use serde_json::Value;

    use super::*;

    fn sample_table() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/coupons.example.json")
    }

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_check_known_code_is_case_insensitive() {
        let out: Value = serde_json::from_str(&check("welcome10", &sample_table(), at(2026)).unwrap()).unwrap();
        assert_eq!(out["valid"], true);
        assert_eq!(out["promotionCodeId"], "promo_welcome10");
    }

    #[test]
    fn test_check_expired_code() {
        let out: Value = serde_json::from_str(&check("SUBSCRIBE3", &sample_table(), at(2028)).unwrap()).unwrap();
        assert_eq!(out["valid"], false);
        assert_eq!(out["error"], "This coupon has expired");
    }

    #[test]
    fn test_check_blank_code() {
        let err = check("   ", &sample_table(), at(2026)).unwrap_err();
        assert!(matches!(err, CliError::EmptyCouponCode));
    }

    #[test]
    fn test_lint_sample_table() {
        let out: Value = serde_json::from_str(&lint(&sample_table()).unwrap()).unwrap();
        let coupons = out["coupons"].as_array().unwrap();
        assert_eq!(coupons.len(), 3);
        assert_eq!(coupons[0]["code"], "SHIPFREE");
        assert_eq!(coupons[0]["terms"], "$12.00 off");
        assert_eq!(coupons[2]["code"], "WELCOME10");
        assert_eq!(coupons[2]["terms"], "10% off");
    }

    #[test]
    fn test_lint_missing_file() {
        let err = lint(Path::new("/nonexistent/coupons.json")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}
