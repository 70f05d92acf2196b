//! Carrier and service-level resolution for outbound shipments.
//!
//! Maps an order's shipping category, requested speed, and fulfillment mode
//! to the carrier and service code used when buying a label. Combinations
//! that cannot be fulfilled automatically resolve to [`ShippingResolution::UNSUPPORTED`]
//! rather than a guessed default; callers branch on that to route the order
//! to manual handling.
//!
//! # Policy
//!
//! First match wins:
//!
//! | Category        | Fulfillment | Carrier | Service by speed                                            |
//! |-----------------|-------------|---------|-------------------------------------------------------------|
//! | military        | any         | USPS    | fastest/fast → `Express`, standard → `Priority`             |
//! | domestic        | any         | FedEx   | fastest → `PRIORITY_OVERNIGHT`, fast/standard → `FEDEX_2_DAY` |
//! | international   | automated   | FedEx   | `INTERNATIONAL_PRIORITY`                                    |
//! | international   | manual      | -       | unsupported                                                 |

use core::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Errors parsing a shipping request field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShippingParseError {
    #[error("unknown shipping category: {0}")]
    UnknownCategory(String),
    #[error("unknown shipping speed: {0}")]
    UnknownSpeed(String),
    #[error("unknown fulfillment type: {0}")]
    UnknownFulfillmentType(String),
}

/// Destination class of a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingCategory {
    Domestic,
    International,
    /// APO/FPO/DPO addresses, served by the postal carrier only.
    Military,
}

/// Requested delivery speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingSpeed {
    #[default]
    Standard,
    Fast,
    Fastest,
}

/// How an order's label is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentType {
    Automated,
    Manual,
}

impl FromStr for ShippingCategory {
    type Err = ShippingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "domestic" => Ok(Self::Domestic),
            "international" => Ok(Self::International),
            "military" => Ok(Self::Military),
            _ => Err(ShippingParseError::UnknownCategory(s.to_string())),
        }
    }
}

impl FromStr for ShippingSpeed {
    type Err = ShippingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "fast" => Ok(Self::Fast),
            "fastest" => Ok(Self::Fastest),
            _ => Err(ShippingParseError::UnknownSpeed(s.to_string())),
        }
    }
}

impl FromStr for FulfillmentType {
    type Err = ShippingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "automated" => Ok(Self::Automated),
            "manual" => Ok(Self::Manual),
            _ => Err(ShippingParseError::UnknownFulfillmentType(s.to_string())),
        }
    }
}

/// Delivery company selected for a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Carrier {
    #[serde(rename = "USPS")]
    Usps,
    #[serde(rename = "FedEx")]
    FedEx,
}

impl Carrier {
    /// Carrier identifier as understood by the label provider.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usps => "USPS",
            Self::FedEx => "FedEx",
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Carrier-specific service level code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceCode {
    /// USPS Priority Mail Express.
    #[serde(rename = "Express")]
    UspsExpress,
    /// USPS Priority Mail.
    #[serde(rename = "Priority")]
    UspsPriority,
    #[serde(rename = "PRIORITY_OVERNIGHT")]
    FedExPriorityOvernight,
    #[serde(rename = "FEDEX_2_DAY")]
    FedExTwoDay,
    #[serde(rename = "INTERNATIONAL_PRIORITY")]
    FedExInternationalPriority,
}

impl ServiceCode {
    /// Service code as understood by the label provider.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UspsExpress => "Express",
            Self::UspsPriority => "Priority",
            Self::FedExPriorityOvernight => "PRIORITY_OVERNIGHT",
            Self::FedExTwoDay => "FEDEX_2_DAY",
            Self::FedExInternationalPriority => "INTERNATIONAL_PRIORITY",
        }
    }
}

impl fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A carrier together with one of its service codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CarrierService {
    pub carrier: Carrier,
    pub service: ServiceCode,
}

/// Outcome of resolving a shipping request.
///
/// Carrier and service are either both present or both absent; the inner
/// `Option` makes a half-populated pair unrepresentable. Serializes as
/// `{"carrier": ..., "service": ...}` with both fields `null` when the
/// combination is not automatable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShippingResolution(Option<CarrierService>);

impl ShippingResolution {
    /// The "not automatable" result.
    pub const UNSUPPORTED: Self = Self(None);

    const fn supported(carrier: Carrier, service: ServiceCode) -> Self {
        Self(Some(CarrierService { carrier, service }))
    }

    #[must_use]
    pub fn carrier(&self) -> Option<Carrier> {
        self.0.map(|cs| cs.carrier)
    }

    #[must_use]
    pub fn service(&self) -> Option<ServiceCode> {
        self.0.map(|cs| cs.service)
    }

    /// Returns true if a label can be purchased automatically.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.0.is_some()
    }
}

impl Serialize for ShippingResolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ShippingResolution", 2)?;
        state.serialize_field("carrier", &self.carrier())?;
        state.serialize_field("service", &self.service())?;
        state.end()
    }
}

/// Resolve the carrier and service for a shipment.
#[must_use]
pub const fn resolve(
    category: ShippingCategory,
    speed: ShippingSpeed,
    fulfillment: FulfillmentType,
) -> ShippingResolution {
    match (category, fulfillment) {
        (ShippingCategory::Military, _) => {
            let service = match speed {
                ShippingSpeed::Fastest | ShippingSpeed::Fast => ServiceCode::UspsExpress,
                ShippingSpeed::Standard => ServiceCode::UspsPriority,
            };
            ShippingResolution::supported(Carrier::Usps, service)
        }
        (ShippingCategory::Domestic, _) => {
            let service = match speed {
                ShippingSpeed::Fastest => ServiceCode::FedExPriorityOvernight,
                ShippingSpeed::Fast | ShippingSpeed::Standard => ServiceCode::FedExTwoDay,
            };
            ShippingResolution::supported(Carrier::FedEx, service)
        }
        (ShippingCategory::International, FulfillmentType::Automated) => {
            ShippingResolution::supported(Carrier::FedEx, ServiceCode::FedExInternationalPriority)
        }
        // Manual international orders are packed and labelled by hand.
        (ShippingCategory::International, FulfillmentType::Manual) => {
            ShippingResolution::UNSUPPORTED
        }
    }
}

/// Resolve the carrier and service from raw request strings.
///
/// This is the entry point used by order fulfillment when deciding whether a
/// label can be bought automatically. Parsing is case-insensitive:
/// - an unknown category is unsupported,
/// - an unknown speed uses the category's standard service,
/// - an unknown fulfillment type is treated as not automated.
#[must_use]
pub fn get_shipping_carrier_and_service(
    category: &str,
    speed: &str,
    fulfillment_type: &str,
) -> ShippingResolution {
    let Ok(category) = category.parse::<ShippingCategory>() else {
        tracing::debug!(category, "Unsupported shipping category");
        return ShippingResolution::UNSUPPORTED;
    };

    let speed = speed.parse::<ShippingSpeed>().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Falling back to standard shipping speed");
        ShippingSpeed::Standard
    });

    let fulfillment = fulfillment_type
        .parse::<FulfillmentType>()
        .unwrap_or(FulfillmentType::Manual);

    resolve(category, speed, fulfillment)
}
