//! Repository implementations
//!
//! This module contains concrete implementations of the repository traits
//! defined in shipwise-core, using sqlx for PostgreSQL access.

pub mod audit_repo;
pub mod courier_repo;
pub mod policy_repo;
pub mod rate_card_repo;

pub use audit_repo::PgAuditSink;
pub use courier_repo::PgCourierServiceRepository;
pub use policy_repo::PgSellerPolicyRepository;
pub use rate_card_repo::PgRateCardRepository;

use serde::de::DeserializeOwned;
use shipwise_core::{AppError, AppResult};

/// Decode a TEXT column holding a snake_case enum name
pub(crate) fn parse_text_enum<T: DeserializeOwned>(column: &str, value: &str) -> AppResult<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).map_err(|_| {
        AppError::Database(format!("Unexpected value '{}' in column {}", value, column))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipwise_core::models::{SelectionMode, ShipmentType};

    #[test]
    fn test_parse_text_enum() {
        let mode: SelectionMode = parse_text_enum("selection_mode", "auto").unwrap();
        assert_eq!(mode, SelectionMode::Auto);

        let result: AppResult<ShipmentType> = parse_text_enum("shipment_type", "sideways");
        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
