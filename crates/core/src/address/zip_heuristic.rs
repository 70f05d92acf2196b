//! Local ZIP plausibility check for undeliverable addresses.
//!
//! Coverage is intentionally small: a city table for the highest-traffic
//! cities and coarse ranges for a handful of states. Anything not covered is
//! reported as plausible so the customer is never told their ZIP is wrong
//! when we cannot actually tell.

/// Three-digit ZIP prefixes served by specific cities, keyed by (city, state).
const CITY_ZIP_PREFIXES: &[(&str, &str, &[&str])] = &[("LOS ANGELES", "CA", &["900", "901"])];

/// Inclusive five-digit ZIP ranges per state.
const STATE_ZIP_RANGES: &[(&str, u32, u32)] = &[
    ("CA", 90000, 96199),
    ("NY", 10000, 14999),
    ("TX", 75000, 79999),
    ("FL", 32000, 34999),
    ("IL", 60000, 62999),
];

/// Returns true if the ZIP looks wrong for the given city and state.
///
/// The city table is consulted first, then the state ranges. States covered by
/// neither are never flagged. In a covered state, a ZIP whose first five
/// characters are not digits is flagged.
#[must_use]
pub fn zip_mismatch(city: &str, state: &str, zip: &str) -> bool {
    let city = city.trim().to_ascii_uppercase();
    let state = state.trim().to_ascii_uppercase();
    let zip = zip.trim();

    if let Some((_, _, prefixes)) = CITY_ZIP_PREFIXES
        .iter()
        .find(|(c, s, _)| *c == city && *s == state)
    {
        return !prefixes.iter().any(|prefix| zip.starts_with(prefix));
    }

    if let Some(&(_, min, max)) = STATE_ZIP_RANGES.iter().find(|(s, _, _)| *s == state) {
        return match zip5(zip) {
            Some(value) => !(min..=max).contains(&value),
            None => true,
        };
    }

    false
}

/// Numeric value of the five-digit ZIP, ignoring any `+4` suffix.
fn zip5(zip: &str) -> Option<u32> {
    let head = zip.get(..5)?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    head.parse().ok()
}
