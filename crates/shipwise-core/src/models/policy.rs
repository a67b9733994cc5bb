//! Seller courier policy model
//!
//! Per-seller rules governing which couriers may carry a shipment and how
//! the choice among them is made.

use crate::error::AppError;
use crate::money::is_valid_percentage;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Who makes the final courier choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Seller picks from the ranked list
    ManualOnly,
    /// Seller picks, top entry flagged as recommended
    #[default]
    ManualWithRecommendation,
    /// Engine picks the top entry
    Auto,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::ManualOnly => write!(f, "manual_only"),
            SelectionMode::ManualWithRecommendation => write!(f, "manual_with_recommendation"),
            SelectionMode::Auto => write!(f, "auto"),
        }
    }
}

/// Ranking priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AutoPriority {
    #[default]
    Price,
    Speed,
    Balanced,
}

impl fmt::Display for AutoPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoPriority::Price => write!(f, "price"),
            AutoPriority::Speed => write!(f, "speed"),
            AutoPriority::Balanced => write!(f, "balanced"),
        }
    }
}

/// Seller courier policy entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerCourierPolicy {
    pub seller_id: Uuid,
    pub company_id: Uuid,
    pub is_active: bool,
    pub selection_mode: SelectionMode,
    pub auto_priority: AutoPriority,
    /// Tolerance over the cheapest total for `balanced`, in percent
    pub balanced_delta_percent: Decimal,
    #[serde(default)]
    pub allowed_providers: BTreeSet<String>,
    #[serde(default)]
    pub blocked_providers: BTreeSet<String>,
    #[serde(default)]
    pub allowed_service_ids: BTreeSet<Uuid>,
    #[serde(default)]
    pub blocked_service_ids: BTreeSet<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl SellerCourierPolicy {
    /// Rule-free policy used when a seller has none or it is inactive
    pub fn fallback(
        seller_id: Uuid,
        selection_mode: SelectionMode,
        auto_priority: AutoPriority,
        balanced_delta_percent: Decimal,
    ) -> Self {
        Self {
            seller_id,
            company_id: Uuid::nil(),
            is_active: true,
            selection_mode,
            auto_priority,
            balanced_delta_percent,
            allowed_providers: BTreeSet::new(),
            blocked_providers: BTreeSet::new(),
            allowed_service_ids: BTreeSet::new(),
            blocked_service_ids: BTreeSet::new(),
            updated_at: Utc::now(),
        }
    }

    /// True when either allow list is non-empty (allow-lists are exclusive)
    pub fn has_allow_list(&self) -> bool {
        !self.allowed_providers.is_empty() || !self.allowed_service_ids.is_empty()
    }

    /// Case-insensitive provider membership
    pub fn provider_in(set: &BTreeSet<String>, provider: &str) -> bool {
        set.iter().any(|p| p.eq_ignore_ascii_case(provider))
    }

    /// Check field ranges before the policy is stored
    ///
    /// # Errors
    ///
    /// `AppError::InvalidPercentage` when `balanced_delta_percent` is outside `[0, 100]`
    pub fn validate(&self) -> Result<(), AppError> {
        if !is_valid_percentage(self.balanced_delta_percent) {
            return Err(AppError::InvalidPercentage {
                field: "balanced_delta_percent".to_string(),
                value: self.balanced_delta_percent,
            });
        }
        Ok(())
    }
}

impl Default for SellerCourierPolicy {
    fn default() -> Self {
        Self::fallback(
            Uuid::nil(),
            SelectionMode::default(),
            AutoPriority::default(),
            Decimal::from(10),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_delta_out_of_range_rejected() {
        let policy = SellerCourierPolicy {
            balanced_delta_percent: dec!(150),
            ..Default::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(AppError::InvalidPercentage { .. })
        ));
        assert!(SellerCourierPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_provider_match_ignores_case() {
        let set: BTreeSet<String> = ["Delhivery".to_string()].into_iter().collect();
        assert!(SellerCourierPolicy::provider_in(&set, "DELHIVERY"));
        assert!(!SellerCourierPolicy::provider_in(&set, "BlueDart"));
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&SelectionMode::ManualWithRecommendation).unwrap();
        assert_eq!(json, "\"manual_with_recommendation\"");
        let priority: AutoPriority = serde_json::from_str("\"balanced\"").unwrap();
        assert_eq!(priority, AutoPriority::Balanced);
    }
}
