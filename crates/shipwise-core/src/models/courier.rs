//! Courier service model
//!
//! A bookable service of a courier provider (e.g. Delhivery Surface,
//! BlueDart Air) with the constraints it accepts and its delivery SLA.
//! Rate cards reference services by carrier + service type, not by id.

use super::shipment::PaymentMode;
use super::zone::Zone;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Courier service status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Active => write!(f, "active"),
            ServiceStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// What a service accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConstraints {
    pub min_weight_kg: Decimal,
    pub max_weight_kg: Decimal,
    /// Largest order value accepted for COD (None = unlimited)
    #[serde(default)]
    pub max_cod_value: Option<Decimal>,
    /// Largest order value accepted for prepaid (None = unlimited)
    #[serde(default)]
    pub max_prepaid_value: Option<Decimal>,
    pub payment_modes: BTreeSet<PaymentMode>,
}

impl Default for ServiceConstraints {
    fn default() -> Self {
        Self {
            min_weight_kg: Decimal::ZERO,
            max_weight_kg: Decimal::from(50),
            max_cod_value: None,
            max_prepaid_value: None,
            payment_modes: [PaymentMode::Prepaid, PaymentMode::Cod].into_iter().collect(),
        }
    }
}

/// Estimated delivery window in days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sla {
    pub edd_min_days: u32,
    pub edd_max_days: u32,
}

impl Default for Sla {
    fn default() -> Self {
        Self {
            edd_min_days: 3,
            edd_max_days: 5,
        }
    }
}

/// Courier service entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierService {
    /// Unique identifier
    pub id: Uuid,

    /// Provider / carrier name (matches `BaseRate::carrier`)
    pub provider: String,

    /// Provider's own code for the service
    pub service_code: String,

    /// Service type (matches `BaseRate::service_type`)
    pub service_type: String,

    /// Display name
    pub name: String,

    /// Zones the service delivers to
    pub zone_support: BTreeSet<Zone>,

    /// Acceptance constraints
    pub constraints: ServiceConstraints,

    /// Delivery SLA
    pub sla: Sla,

    /// Status
    pub status: ServiceStatus,
}

impl CourierService {
    pub fn is_active(&self) -> bool {
        self.status == ServiceStatus::Active
    }
}

impl Default for CourierService {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            provider: String::new(),
            service_code: String::new(),
            service_type: String::new(),
            name: String::new(),
            zone_support: Zone::ALL.into_iter().collect(),
            constraints: ServiceConstraints::default(),
            sla: Sla::default(),
            status: ServiceStatus::Active,
        }
    }
}
