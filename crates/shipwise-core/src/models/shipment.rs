//! Shipment model
//!
//! The pricing request: what is being shipped, where, and how it is paid.

use super::zone::Zone;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Payment mode of a shipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    /// Paid online before pickup
    Prepaid,
    /// Cash on delivery, collected by the courier
    Cod,
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMode::Prepaid => write!(f, "prepaid"),
            PaymentMode::Cod => write!(f, "cod"),
        }
    }
}

/// Direction of a shipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShipmentType {
    /// Seller to buyer
    #[default]
    Forward,
    /// Buyer back to seller (returns)
    Reverse,
}

impl fmt::Display for ShipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipmentType::Forward => write!(f, "forward"),
            ShipmentType::Reverse => write!(f, "reverse"),
        }
    }
}

/// Shipment to be priced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    /// Caller-side reference (order number, AWB draft id)
    #[serde(default)]
    pub reference: Option<String>,

    /// Company whose rate cards apply
    pub company_id: Uuid,

    /// Dead weight in kilograms
    pub weight_kg: Decimal,

    /// Pickup pincode (informational, zone is pre-computed)
    #[serde(default)]
    pub origin_pincode: Option<String>,

    /// Delivery pincode (informational, zone is pre-computed)
    #[serde(default)]
    pub destination_pincode: Option<String>,

    /// Pricing zone for the origin/destination pair
    pub zone: Zone,

    /// Payment mode
    pub payment_mode: PaymentMode,

    /// Declared order value, used for COD fees and value limits
    pub declared_value: Decimal,

    /// Forward or reverse
    #[serde(default)]
    pub shipment_type: ShipmentType,
}

impl Shipment {
    /// Returns true for cash-on-delivery shipments
    #[inline]
    pub fn is_cod(&self) -> bool {
        self.payment_mode == PaymentMode::Cod
    }
}

impl Default for Shipment {
    fn default() -> Self {
        Self {
            reference: None,
            company_id: Uuid::nil(),
            weight_kg: Decimal::ONE,
            origin_pincode: None,
            destination_pincode: None,
            zone: Zone::A,
            payment_mode: PaymentMode::Prepaid,
            declared_value: Decimal::ZERO,
            shipment_type: ShipmentType::Forward,
        }
    }
}
