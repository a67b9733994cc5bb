//! Rate card version history
//!
//! Append-only record of every committed lifecycle mutation. The sink that
//! stores these entries is an external collaborator; the lifecycle manager
//! appends synchronously before committing.

use super::rate_card::{RateCard, RateCardStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

/// Lifecycle action recorded in history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Create,
    Activate,
    Deactivate,
    Revise,
    Clone,
    BulkAdjust,
    Expire,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleAction::Create => "create",
            LifecycleAction::Activate => "activate",
            LifecycleAction::Deactivate => "deactivate",
            LifecycleAction::Revise => "revise",
            LifecycleAction::Clone => "clone",
            LifecycleAction::BulkAdjust => "bulk_adjust",
            LifecycleAction::Expire => "expire",
        };
        f.write_str(s)
    }
}

/// One version history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionHistoryEntry {
    pub rate_card_id: Uuid,
    pub company_id: Option<Uuid>,
    pub action: LifecycleAction,
    /// Who asked for the change
    pub actor: String,
    /// Version before the change (None for creation)
    pub from_version: Option<i64>,
    pub to_version: i64,
    pub from_status: Option<RateCardStatus>,
    pub to_status: RateCardStatus,
    pub details: Option<JsonValue>,
    pub recorded_at: DateTime<Utc>,
}

impl VersionHistoryEntry {
    /// Create a new history entry builder
    pub fn builder() -> VersionHistoryBuilder {
        VersionHistoryBuilder::default()
    }
}

/// Builder for history entries
#[derive(Debug, Default)]
pub struct VersionHistoryBuilder {
    action: Option<LifecycleAction>,
    actor: Option<String>,
    before: Option<(i64, RateCardStatus)>,
    after: Option<(Uuid, Option<Uuid>, i64, RateCardStatus)>,
    details: Option<JsonValue>,
}

impl VersionHistoryBuilder {
    pub fn action(mut self, action: LifecycleAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Card as it was read
    pub fn before(mut self, card: &RateCard) -> Self {
        self.before = Some((card.version, card.status));
        self
    }

    /// Card as it will be committed
    pub fn after(mut self, card: &RateCard) -> Self {
        self.after = Some((card.id, card.company_id, card.version, card.status));
        self
    }

    pub fn details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    /// Build the entry
    pub fn build(self) -> Result<VersionHistoryEntry, &'static str> {
        let (rate_card_id, company_id, to_version, to_status) =
            self.after.ok_or("resulting card is required")?;

        Ok(VersionHistoryEntry {
            rate_card_id,
            company_id,
            action: self.action.ok_or("action is required")?,
            actor: self.actor.ok_or("actor is required")?,
            from_version: self.before.map(|(v, _)| v),
            to_version,
            from_status: self.before.map(|(_, s)| s),
            to_status,
            details: self.details,
            recorded_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_records_transition() {
        let before = RateCard {
            version: 3,
            status: RateCardStatus::Draft,
            ..Default::default()
        };
        let after = RateCard {
            version: 4,
            status: RateCardStatus::Active,
            ..before.clone()
        };

        let entry = VersionHistoryEntry::builder()
            .action(LifecycleAction::Activate)
            .actor("ops@shipwise")
            .before(&before)
            .after(&after)
            .details(json!({ "reason": "go live" }))
            .build()
            .unwrap();

        assert_eq!(entry.from_version, Some(3));
        assert_eq!(entry.to_version, 4);
        assert_eq!(entry.from_status, Some(RateCardStatus::Draft));
        assert_eq!(entry.to_status, RateCardStatus::Active);
    }

    #[test]
    fn test_builder_requires_actor() {
        let result = VersionHistoryEntry::builder()
            .action(LifecycleAction::Create)
            .after(&RateCard::default())
            .build();
        assert_eq!(result.unwrap_err(), "actor is required");
    }
}
