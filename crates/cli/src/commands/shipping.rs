//! Shipping carrier/service lookup.

use serde_json::json;

use order_intake_core::shipping::get_shipping_carrier_and_service;

use super::CliError;

/// Resolve an order's carrier and service and render it as JSON.
///
/// # Errors
///
/// Returns an error only if the result cannot be serialized.
pub fn resolve(category: &str, speed: &str, fulfillment: &str) -> Result<String, CliError> {
    let resolution = get_shipping_carrier_and_service(category, speed, fulfillment);
    tracing::info!(
        category,
        speed,
        fulfillment,
        automatable = resolution.is_supported(),
        "Resolved shipping service"
    );

    Ok(serde_json::to_string_pretty(&json!({
        "carrier": resolution.carrier(),
        "service": resolution.service(),
        "automatable": resolution.is_supported(),
    }))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn test_military_uses_usps() {
        let out: Value = serde_json::from_str(&resolve("Military", "fast", "manual").unwrap()).unwrap();
        assert_eq!(out["carrier"], "USPS");
        assert_eq!(out["service"], "Express");
        assert_eq!(out["automatable"], true);
    }

    #[test]
    fn test_unknown_category_is_not_automatable() {
        let out: Value = serde_json::from_str(&resolve("lunar", "fast", "automated").unwrap()).unwrap();
        assert!(out["carrier"].is_null());
        assert!(out["service"].is_null());
        assert_eq!(out["automatable"], false);
    }
}
