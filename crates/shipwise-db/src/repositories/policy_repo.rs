//! Seller courier policy repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shipwise_core::{
    models::SellerCourierPolicy, traits::SellerPolicyRepository, AppError, AppResult,
};
use sqlx::{PgPool, Postgres};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::parse_text_enum;

/// PostgreSQL implementation of SellerPolicyRepository
pub struct PgSellerPolicyRepository {
    pool: PgPool,
}

impl PgSellerPolicyRepository {
    /// Create a new seller policy repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SellerPolicyRepository for PgSellerPolicyRepository {
    #[instrument(skip(self))]
    async fn find_by_seller(&self, seller_id: Uuid) -> AppResult<Option<SellerCourierPolicy>> {
        debug!("Finding courier policy for seller {}", seller_id);

        let row = sqlx::query_as::<Postgres, PolicyRow>(
            r#"
            SELECT seller_id, company_id, is_active, selection_mode, auto_priority,
                   balanced_delta_percent, allowed_providers, blocked_providers,
                   allowed_service_ids, blocked_service_ids, updated_at
            FROM seller_courier_policies
            WHERE seller_id = $1
            "#,
        )
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding policy for seller {}: {}", seller_id, e);
            AppError::Database(format!("Failed to find seller policy: {}", e))
        })?;

        row.map(SellerCourierPolicy::try_from).transpose()
    }

    #[instrument(skip(self, policy), fields(seller_id = %policy.seller_id))]
    async fn upsert(&self, policy: &SellerCourierPolicy) -> AppResult<SellerCourierPolicy> {
        policy.validate()?;

        let row = sqlx::query_as::<Postgres, PolicyRow>(
            r#"
            INSERT INTO seller_courier_policies (
                seller_id, company_id, is_active, selection_mode, auto_priority,
                balanced_delta_percent, allowed_providers, blocked_providers,
                allowed_service_ids, blocked_service_ids, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            ON CONFLICT (seller_id) DO UPDATE
            SET company_id = EXCLUDED.company_id,
                is_active = EXCLUDED.is_active,
                selection_mode = EXCLUDED.selection_mode,
                auto_priority = EXCLUDED.auto_priority,
                balanced_delta_percent = EXCLUDED.balanced_delta_percent,
                allowed_providers = EXCLUDED.allowed_providers,
                blocked_providers = EXCLUDED.blocked_providers,
                allowed_service_ids = EXCLUDED.allowed_service_ids,
                blocked_service_ids = EXCLUDED.blocked_service_ids,
                updated_at = NOW()
            RETURNING seller_id, company_id, is_active, selection_mode, auto_priority,
                      balanced_delta_percent, allowed_providers, blocked_providers,
                      allowed_service_ids, blocked_service_ids, updated_at
            "#,
        )
        .bind(policy.seller_id)
        .bind(policy.company_id)
        .bind(policy.is_active)
        .bind(policy.selection_mode.to_string())
        .bind(policy.auto_priority.to_string())
        .bind(policy.balanced_delta_percent)
        .bind(policy.allowed_providers.iter().cloned().collect::<Vec<_>>())
        .bind(policy.blocked_providers.iter().cloned().collect::<Vec<_>>())
        .bind(policy.allowed_service_ids.iter().copied().collect::<Vec<_>>())
        .bind(policy.blocked_service_ids.iter().copied().collect::<Vec<_>>())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error saving policy for seller {}: {}", policy.seller_id, e);
            AppError::Database(format!("Failed to save seller policy: {}", e))
        })?;

        SellerCourierPolicy::try_from(row)
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct PolicyRow {
    seller_id: Uuid,
    company_id: Uuid,
    is_active: bool,
    selection_mode: String,
    auto_priority: String,
    balanced_delta_percent: Decimal,
    allowed_providers: Vec<String>,
    blocked_providers: Vec<String>,
    allowed_service_ids: Vec<Uuid>,
    blocked_service_ids: Vec<Uuid>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PolicyRow> for SellerCourierPolicy {
    type Error = AppError;

    fn try_from(row: PolicyRow) -> Result<Self, Self::Error> {
        Ok(Self {
            seller_id: row.seller_id,
            company_id: row.company_id,
            is_active: row.is_active,
            selection_mode: parse_text_enum("selection_mode", &row.selection_mode)?,
            auto_priority: parse_text_enum("auto_priority", &row.auto_priority)?,
            balanced_delta_percent: row.balanced_delta_percent,
            allowed_providers: row.allowed_providers.into_iter().collect(),
            blocked_providers: row.blocked_providers.into_iter().collect(),
            allowed_service_ids: row.allowed_service_ids.into_iter().collect(),
            blocked_service_ids: row.blocked_service_ids.into_iter().collect(),
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shipwise_core::models::{AutoPriority, SelectionMode};

    #[test]
    fn test_row_conversion() {
        let row = PolicyRow {
            seller_id: Uuid::from_u128(1),
            company_id: Uuid::from_u128(2),
            is_active: true,
            selection_mode: "auto".to_string(),
            auto_priority: "balanced".to_string(),
            balanced_delta_percent: dec!(12.5),
            allowed_providers: vec![],
            blocked_providers: vec!["Ekart".to_string()],
            allowed_service_ids: vec![Uuid::from_u128(9)],
            blocked_service_ids: vec![],
            updated_at: Utc::now(),
        };

        let policy = SellerCourierPolicy::try_from(row).unwrap();
        assert_eq!(policy.selection_mode, SelectionMode::Auto);
        assert_eq!(policy.auto_priority, AutoPriority::Balanced);
        assert!(policy.blocked_providers.contains("Ekart"));
        assert!(policy.allowed_service_ids.contains(&Uuid::from_u128(9)));
    }
}
