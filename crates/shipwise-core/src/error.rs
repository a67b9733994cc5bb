//! Unified error handling for the Shipwise rate engine
//!
//! This module provides a comprehensive error type that covers all possible
//! failure scenarios in the engine, with automatic HTTP response mapping.
//!
//! `NoEligibleCourier` is deliberately absent: an empty selection is a
//! valid outcome reported by the selection engine, not an error.

use crate::models::{RateCardStatus, SchemeKind, WeightRange, Zone};
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Main application error type
///
/// All errors in the engine should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Database Errors ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing required pricing field: {0}")]
    MissingPricingField(String),

    #[error("Overlapping slabs in {context}: {first} overlaps {second}")]
    OverlappingSlab {
        context: String,
        first: WeightRange,
        second: WeightRange,
    },

    #[error("Invalid slab in {context}: {range} (min must be below max)")]
    InvalidSlab { context: String, range: WeightRange },

    #[error("Invalid percentage for {field}: {value}")]
    InvalidPercentage { field: String, value: Decimal },

    // ==================== Pricing Errors ====================
    #[error(
        "No active rate card for company {company_id}, {carrier}/{service_type} as of {as_of}"
    )]
    NoActiveRateCard {
        company_id: Uuid,
        carrier: String,
        service_type: String,
        as_of: DateTime<Utc>,
    },

    #[error("No base rate for {carrier}/{service_type} at {weight_kg} kg")]
    NoBaseRate {
        carrier: String,
        service_type: String,
        weight_kg: Decimal,
    },

    #[error("Zone {zone} is not priced by rate card {rate_card_id}")]
    ZoneNotPriced { zone: Zone, rate_card_id: Uuid },

    #[error("Rate card {rate_card_id} has multiple pricing schemes populated: {schemes:?}")]
    MultipleSchemes {
        rate_card_id: Uuid,
        schemes: Vec<SchemeKind>,
    },

    // ==================== Lifecycle Errors ====================
    #[error("Stale version for rate card {id}: expected {expected}, found {actual}")]
    StaleVersion { id: Uuid, expected: i64, actual: i64 },

    #[error("Invalid transition for rate card {id}: {from} -> {to}")]
    InvalidTransition {
        id: Uuid,
        from: RateCardStatus,
        to: RateCardStatus,
    },

    #[error("Bulk edit for company {company_id} touches foreign rate cards: {offending:?}")]
    CrossCompanyBulk {
        company_id: Uuid,
        offending: Vec<Uuid>,
    },

    // ==================== Resource Errors ====================
    #[error("Rate card not found: {0}")]
    RateCardNotFound(Uuid),

    #[error("Conflict: {0}")]
    Conflict(String),

    // ==================== Internal Errors ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_)
            | AppError::InvalidInput(_)
            | AppError::MissingPricingField(_)
            | AppError::OverlappingSlab { .. }
            | AppError::InvalidSlab { .. }
            | AppError::InvalidPercentage { .. } => StatusCode::BAD_REQUEST,

            // 403 Forbidden
            AppError::CrossCompanyBulk { .. } => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::RateCardNotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::StaleVersion { .. }
            | AppError::InvalidTransition { .. }
            | AppError::Conflict(_) => StatusCode::CONFLICT,

            // 422 Unprocessable Entity
            AppError::NoActiveRateCard { .. }
            | AppError::NoBaseRate { .. }
            | AppError::ZoneNotPriced { .. }
            | AppError::MultipleSchemes { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Validation(_) => "validation_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::MissingPricingField(_) => "missing_pricing_field",
            AppError::OverlappingSlab { .. } => "overlapping_slab",
            AppError::InvalidSlab { .. } => "invalid_slab",
            AppError::InvalidPercentage { .. } => "invalid_percentage",
            AppError::NoActiveRateCard { .. } => "no_active_rate_card",
            AppError::NoBaseRate { .. } => "no_base_rate",
            AppError::ZoneNotPriced { .. } => "zone_not_priced",
            AppError::MultipleSchemes { .. } => "multiple_schemes",
            AppError::StaleVersion { .. } => "stale_version",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::CrossCompanyBulk { .. } => "cross_company_bulk",
            AppError::RateCardNotFound(_) => "rate_card_not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }

    /// True for the validation family, which is rejected before persistence
    pub fn is_validation(&self) -> bool {
        self.status_code() == StatusCode::BAD_REQUEST
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::StaleVersion {
                id: Uuid::nil(),
                expected: 2,
                actual: 3
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::RateCardNotFound(Uuid::nil()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::CrossCompanyBulk {
                company_id: Uuid::nil(),
                offending: vec![]
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NoActiveRateCard {
                company_id: Uuid::nil(),
                carrier: "Delhivery".to_string(),
                service_type: "surface".to_string(),
                as_of: Utc::now(),
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::InvalidPercentage {
                field: "gst".to_string(),
                value: dec!(120)
            }
            .error_code(),
            "invalid_percentage"
        );
        assert_eq!(
            AppError::MultipleSchemes {
                rate_card_id: Uuid::nil(),
                schemes: vec![SchemeKind::ZoneAdditive, SchemeKind::ZoneMultiplier],
            }
            .error_code(),
            "multiple_schemes"
        );
    }

    #[test]
    fn test_overlapping_slab_message_names_both_ranges() {
        let err = AppError::OverlappingSlab {
            context: "weight_rules".to_string(),
            first: WeightRange::new(dec!(0), dec!(1.5)),
            second: WeightRange::new(dec!(1), dec!(2)),
        };

        let message = err.to_string();
        assert!(message.contains("[0, 1.5)"));
        assert!(message.contains("[1, 2)"));
        assert!(err.is_validation());
    }
}
