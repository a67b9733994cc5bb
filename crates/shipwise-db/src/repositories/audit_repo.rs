//! Rate card history repository implementation
//!
//! Provides PostgreSQL-backed storage for the rate card version history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use shipwise_core::{
    models::{RateCardStatus, VersionHistoryEntry},
    traits::AuditSink,
    AppError, AppResult,
};
use sqlx::{PgPool, Postgres};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::parse_text_enum;

/// PostgreSQL implementation of AuditSink
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    /// Create a new history sink
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    #[instrument(skip(self, entry), fields(rate_card_id = %entry.rate_card_id, action = %entry.action))]
    async fn append(&self, entry: &VersionHistoryEntry) -> AppResult<()> {
        debug!(
            "Recording {} on rate card {} by {}",
            entry.action, entry.rate_card_id, entry.actor
        );

        sqlx::query(
            r#"
            INSERT INTO rate_card_history (
                rate_card_id, company_id, action, actor, from_version,
                to_version, from_status, to_status, details, recorded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.rate_card_id)
        .bind(entry.company_id)
        .bind(entry.action.to_string())
        .bind(&entry.actor)
        .bind(entry.from_version)
        .bind(entry.to_version)
        .bind(entry.from_status.map(|s| s.as_str()))
        .bind(entry.to_status.as_str())
        .bind(&entry.details)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error appending rate card history: {}", e);
            AppError::Database(format!("Failed to record rate card history: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn history(&self, rate_card_id: Uuid) -> AppResult<Vec<VersionHistoryEntry>> {
        let rows = sqlx::query_as::<Postgres, HistoryRow>(
            r#"
            SELECT rate_card_id, company_id, action, actor, from_version,
                   to_version, from_status, to_status, details, recorded_at
            FROM rate_card_history
            WHERE rate_card_id = $1
            ORDER BY recorded_at, id
            "#,
        )
        .bind(rate_card_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error reading history of {}: {}", rate_card_id, e);
            AppError::Database(format!("Failed to read rate card history: {}", e))
        })?;

        rows.into_iter().map(VersionHistoryEntry::try_from).collect()
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    rate_card_id: Uuid,
    company_id: Option<Uuid>,
    action: String,
    actor: String,
    from_version: Option<i64>,
    to_version: i64,
    from_status: Option<String>,
    to_status: String,
    details: Option<JsonValue>,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for VersionHistoryEntry {
    type Error = AppError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let from_status = row
            .from_status
            .as_deref()
            .map(|s| {
                RateCardStatus::parse(s).ok_or_else(|| {
                    AppError::Database(format!("Unexpected value '{}' in column from_status", s))
                })
            })
            .transpose()?;

        Ok(Self {
            rate_card_id: row.rate_card_id,
            company_id: row.company_id,
            action: parse_text_enum("action", &row.action)?,
            actor: row.actor,
            from_version: row.from_version,
            to_version: row.to_version,
            from_status,
            to_status: parse_text_enum("to_status", &row.to_status)?,
            details: row.details,
            recorded_at: row.recorded_at,
        })
    }
}
