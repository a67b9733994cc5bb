//! Quote and selection DTOs

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shipwise_core::models::{Quote, Shipment};
use shipwise_services::constants::MAX_BULK_SHIPMENTS;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Quote one shipment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuoteRequest {
    pub seller_id: Uuid,

    pub shipment: Shipment,

    /// Pricing instant, defaults to now
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

/// Quote many shipments for one seller
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkQuoteRequest {
    pub seller_id: Uuid,

    #[validate(custom(function = "validate_bulk_size"))]
    pub shipments: Vec<Shipment>,

    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

fn validate_bulk_size(shipments: &[Shipment]) -> Result<(), ValidationError> {
    if shipments.is_empty() || shipments.len() > MAX_BULK_SHIPMENTS {
        return Err(ValidationError::new("bulk_size"));
    }
    Ok(())
}

/// Rank quotes for a seller
///
/// Either pass quotes already computed, or a shipment to quote first.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_select_source"))]
pub struct SelectRequest {
    pub seller_id: Uuid,

    #[serde(default)]
    pub quotes: Option<Vec<Quote>>,

    #[serde(default)]
    pub shipment: Option<Shipment>,

    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

fn validate_select_source(req: &SelectRequest) -> Result<(), ValidationError> {
    match (&req.quotes, &req.shipment) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => Err(ValidationError::new("quotes_or_shipment")),
    }
}
