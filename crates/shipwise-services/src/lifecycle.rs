//! Rate card lifecycle
//!
//! Every mutation follows the same path: read the card, build the next
//! version, validate it, append a history entry, then commit with a
//! compare-and-swap on the version read. A history append failure aborts
//! the mutation. Status changes are idempotent: asking for the state a
//! card is already in returns it untouched.
//!
//! The history entry is appended before the compare-and-swap, so a write
//! that loses the race leaves one entry without a matching version.

use crate::constants::{CLONE_NAME_SUFFIX, MAX_BULK_ADJUSTMENT_PERCENT, MIN_BULK_ADJUSTMENT_PERCENT};
use crate::slab::ensure_valid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use shipwise_core::{
    models::{
        LifecycleAction, PricingScheme, RateCard, RateCardStatus, VersionHistoryBuilder,
        VersionHistoryEntry,
    },
    money::round_money,
    traits::{AuditSink, PaginatedResponse, Pagination, PaginationMeta, RateCardRepository},
    AppError, AppResult,
};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentDirection {
    Increase,
    Decrease,
}

impl fmt::Display for AdjustmentDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjustmentDirection::Increase => write!(f, "increase"),
            AdjustmentDirection::Decrease => write!(f, "decrease"),
        }
    }
}

/// Percentage change applied to every flat price on a card
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceAdjustment {
    pub direction: AdjustmentDirection,
    pub percent: Decimal,
}

impl PriceAdjustment {
    /// # Errors
    ///
    /// `AppError::InvalidPercentage` outside `[1, 100]`
    pub fn validate(&self) -> AppResult<()> {
        if self.percent < MIN_BULK_ADJUSTMENT_PERCENT || self.percent > MAX_BULK_ADJUSTMENT_PERCENT {
            return Err(AppError::InvalidPercentage {
                field: "percent".to_string(),
                value: self.percent,
            });
        }
        Ok(())
    }

    pub fn factor(&self) -> Decimal {
        let delta = self.percent / Decimal::ONE_HUNDRED;
        match self.direction {
            AdjustmentDirection::Increase => Decimal::ONE + delta,
            AdjustmentDirection::Decrease => Decimal::ONE - delta,
        }
    }

    /// Scale base prices, zone additions, slab charges and per-kg overflow
    ///
    /// Multipliers, weight rules and floors are left alone.
    pub fn apply(&self, card: &mut RateCard) {
        let factor = self.factor();
        let scale = |v: &mut Decimal| *v = round_money(*v * factor);

        card.base_rates.iter_mut().for_each(|r| scale(&mut r.base_price));

        match &mut card.scheme {
            PricingScheme::ZoneAdditive { rules } => {
                rules.iter_mut().for_each(|r| scale(&mut r.additional_price));
            }
            PricingScheme::ZoneMultiplier { .. } => {}
            PricingScheme::BandedSlab(table) => {
                for band in table.zones.values_mut() {
                    band.slabs.iter_mut().for_each(|s| scale(&mut s.charge));
                    scale(&mut band.additional_per_kg);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSuccess {
    pub rate_card_id: Uuid,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    pub rate_card_id: Uuid,
    pub error_code: String,
    pub message: String,
}

impl BulkFailure {
    fn new(rate_card_id: Uuid, err: &AppError) -> Self {
        Self {
            rate_card_id,
            error_code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Per-card outcome of a batch operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    pub succeeded: Vec<BulkSuccess>,
    pub failed: Vec<BulkFailure>,
}

/// Rate card lifecycle manager
pub struct LifecycleManager {
    cards: Arc<dyn RateCardRepository>,
    audit: Arc<dyn AuditSink>,
}

impl LifecycleManager {
    /// Create a new lifecycle manager
    pub fn new(cards: Arc<dyn RateCardRepository>, audit: Arc<dyn AuditSink>) -> Self {
        Self { cards, audit }
    }

    /// Get a rate card by id
    pub async fn get(&self, id: Uuid) -> AppResult<RateCard> {
        self.cards
            .find_by_id(id)
            .await?
            .ok_or(AppError::RateCardNotFound(id))
    }

    /// Cards owned by a company
    pub async fn list(
        &self,
        company_id: Uuid,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<RateCard>> {
        let (data, total) = self
            .cards
            .list_by_company(company_id, pagination.limit(), pagination.offset())
            .await?;
        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(total, pagination.page, pagination.per_page),
        })
    }

    /// Version history of a card, oldest first
    pub async fn history(&self, id: Uuid) -> AppResult<Vec<VersionHistoryEntry>> {
        self.audit.history(id).await
    }

    /// Store a new draft
    #[instrument(skip(self, card), fields(name = %card.name))]
    pub async fn create(&self, card: RateCard, actor: &str) -> AppResult<RateCard> {
        let now = Utc::now();
        let draft = RateCard {
            id: Uuid::now_v7(),
            status: RateCardStatus::Draft,
            version: 1,
            created_at: now,
            updated_at: now,
            ..card
        };
        ensure_valid(&draft)?;

        self.record(
            VersionHistoryEntry::builder()
                .action(LifecycleAction::Create)
                .actor(actor)
                .after(&draft),
        )
        .await?;
        let created = self.cards.create(&draft).await?;

        info!(rate_card_id = %created.id, "Created rate card draft");
        Ok(created)
    }

    /// Make a card live
    ///
    /// Requires effective dates and a valid card. Activating an active card
    /// is a no-op; an expired card cannot come back.
    #[instrument(skip(self))]
    pub async fn activate(&self, id: Uuid, actor: &str) -> AppResult<RateCard> {
        let card = self.get(id).await?;

        match card.status {
            RateCardStatus::Active => {
                debug!("Rate card {} already active", id);
                return Ok(card);
            }
            RateCardStatus::Expired => {
                return Err(AppError::InvalidTransition {
                    id,
                    from: card.status,
                    to: RateCardStatus::Active,
                })
            }
            RateCardStatus::Draft | RateCardStatus::Inactive => {}
        }

        if card.effective_dates.is_none() {
            return Err(AppError::Validation(
                "effective_dates are required to activate a rate card".to_string(),
            ));
        }

        let mut next = card.clone();
        next.status = RateCardStatus::Active;
        ensure_valid(&next)?;

        self.commit(&card, next, LifecycleAction::Activate, actor, None)
            .await
    }

    /// Take a live card out of resolution
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid, actor: &str) -> AppResult<RateCard> {
        let card = self.get(id).await?;

        match card.status {
            RateCardStatus::Inactive => {
                debug!("Rate card {} already inactive", id);
                return Ok(card);
            }
            RateCardStatus::Active => {}
            RateCardStatus::Draft | RateCardStatus::Expired => {
                return Err(AppError::InvalidTransition {
                    id,
                    from: card.status,
                    to: RateCardStatus::Inactive,
                })
            }
        }

        let mut next = card.clone();
        next.status = RateCardStatus::Inactive;
        self.commit(&card, next, LifecycleAction::Deactivate, actor, None)
            .await
    }

    /// Replace a card's content
    ///
    /// Identity, owner, status and creation time are kept from the stored card.
    #[instrument(skip(self, revised), fields(rate_card_id = %revised.id))]
    pub async fn revise(
        &self,
        revised: RateCard,
        expected_version: i64,
        actor: &str,
    ) -> AppResult<RateCard> {
        let current = self.get(revised.id).await?;
        if current.version != expected_version {
            warn!(
                "Revision of {} based on version {}, stored is {}",
                current.id, expected_version, current.version
            );
            return Err(AppError::StaleVersion {
                id: current.id,
                expected: expected_version,
                actual: current.version,
            });
        }

        let next = RateCard {
            id: current.id,
            company_id: current.company_id,
            status: current.status,
            created_at: current.created_at,
            ..revised
        };
        ensure_valid(&next)?;

        let changed = changed_fields(&current, &next)?;
        self.commit(
            &current,
            next,
            LifecycleAction::Revise,
            actor,
            Some(json!({ "changed_fields": changed })),
        )
        .await
    }

    /// Copy a card into a new draft without effective dates
    #[instrument(skip(self))]
    pub async fn clone_card(
        &self,
        id: Uuid,
        new_name: Option<String>,
        actor: &str,
    ) -> AppResult<RateCard> {
        let source = self.get(id).await?;
        let now = Utc::now();

        let copy = RateCard {
            id: Uuid::now_v7(),
            name: new_name.unwrap_or_else(|| format!("{}{}", source.name, CLONE_NAME_SUFFIX)),
            status: RateCardStatus::Draft,
            version: 1,
            effective_dates: None,
            created_at: now,
            updated_at: now,
            ..source.clone()
        };
        ensure_valid(&copy)?;

        self.record(
            VersionHistoryEntry::builder()
                .action(LifecycleAction::Clone)
                .actor(actor)
                .after(&copy)
                .details(json!({
                    "source_rate_card_id": source.id,
                    "source_version": source.version,
                })),
        )
        .await?;
        let created = self.cards.create(&copy).await?;

        info!(rate_card_id = %created.id, source = %source.id, "Cloned rate card");
        Ok(created)
    }

    /// Scale prices on many cards of one company
    ///
    /// The whole batch is rejected before any write if a card belongs to
    /// another company (global cards included). After that, each card
    /// commits or fails on its own.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn bulk_adjust_price(
        &self,
        company_id: Uuid,
        ids: &[Uuid],
        adjustment: PriceAdjustment,
        actor: &str,
    ) -> AppResult<BulkResult> {
        adjustment.validate()?;

        let requested: BTreeSet<Uuid> = ids.iter().copied().collect();
        let requested: Vec<Uuid> = requested.into_iter().collect();
        let cards = self.cards.find_many(&requested).await?;

        let offending: Vec<Uuid> = cards
            .iter()
            .filter(|c| c.company_id != Some(company_id))
            .map(|c| c.id)
            .collect();
        if !offending.is_empty() {
            warn!(
                "Bulk adjust for {} rejected, {} foreign cards",
                company_id,
                offending.len()
            );
            return Err(AppError::CrossCompanyBulk {
                company_id,
                offending,
            });
        }

        let mut result = BulkResult::default();
        let found: BTreeSet<Uuid> = cards.iter().map(|c| c.id).collect();
        for id in requested.iter().filter(|id| !found.contains(id)) {
            result
                .failed
                .push(BulkFailure::new(*id, &AppError::RateCardNotFound(*id)));
        }

        let details = json!({
            "direction": adjustment.direction,
            "percent": adjustment.percent,
        });
        for card in &cards {
            let mut next = card.clone();
            adjustment.apply(&mut next);

            let committed = match ensure_valid(&next) {
                Ok(()) => {
                    self.commit(
                        card,
                        next,
                        LifecycleAction::BulkAdjust,
                        actor,
                        Some(details.clone()),
                    )
                    .await
                }
                Err(e) => Err(e),
            };

            match committed {
                Ok(saved) => result.succeeded.push(BulkSuccess {
                    rate_card_id: saved.id,
                    version: saved.version,
                }),
                Err(e) => {
                    warn!(rate_card_id = %card.id, "Bulk adjust failed: {}", e);
                    result.failed.push(BulkFailure::new(card.id, &e));
                }
            }
        }

        info!(
            "Bulk {} of {}% for {}: {} succeeded, {} failed",
            adjustment.direction,
            adjustment.percent,
            company_id,
            result.succeeded.len(),
            result.failed.len()
        );
        Ok(result)
    }

    /// Mark active cards whose window has ended as expired
    #[instrument(skip(self))]
    pub async fn expire_lapsed(&self, as_of: DateTime<Utc>, actor: &str) -> AppResult<BulkResult> {
        let lapsed = self.cards.find_lapsed(as_of).await?;
        let mut result = BulkResult::default();

        for card in &lapsed {
            let mut next = card.clone();
            next.status = RateCardStatus::Expired;

            match self
                .commit(card, next, LifecycleAction::Expire, actor, None)
                .await
            {
                Ok(saved) => result.succeeded.push(BulkSuccess {
                    rate_card_id: saved.id,
                    version: saved.version,
                }),
                Err(e) => result.failed.push(BulkFailure::new(card.id, &e)),
            }
        }

        if !lapsed.is_empty() {
            info!("Expired {} of {} lapsed rate cards", result.succeeded.len(), lapsed.len());
        }
        Ok(result)
    }

    /// Bump the version, record history, then compare-and-swap
    async fn commit(
        &self,
        before: &RateCard,
        mut next: RateCard,
        action: LifecycleAction,
        actor: &str,
        details: Option<JsonValue>,
    ) -> AppResult<RateCard> {
        next.version = before.version + 1;
        next.updated_at = Utc::now();

        let mut entry = VersionHistoryEntry::builder()
            .action(action)
            .actor(actor)
            .before(before)
            .after(&next);
        if let Some(details) = details {
            entry = entry.details(details);
        }
        self.record(entry).await?;

        let saved = self.cards.update_versioned(&next, before.version).await?;
        info!(
            rate_card_id = %saved.id,
            version = saved.version,
            status = %saved.status,
            "Rate card {}",
            action
        );
        Ok(saved)
    }

    async fn record(&self, builder: VersionHistoryBuilder) -> AppResult<()> {
        let entry = builder
            .build()
            .map_err(|e| AppError::Internal(format!("history entry: {}", e)))?;
        self.audit.append(&entry).await
    }
}

/// Top-level fields that differ, ignoring bookkeeping
fn changed_fields(before: &RateCard, after: &RateCard) -> AppResult<Vec<String>> {
    let as_map = |card: &RateCard| -> AppResult<Map<String, JsonValue>> {
        match serde_json::to_value(card)? {
            JsonValue::Object(map) => Ok(map),
            _ => Err(AppError::Internal("rate card did not serialize to an object".to_string())),
        }
    };
    let before = as_map(before)?;
    let after = as_map(after)?;

    Ok(after
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "version" | "updated_at"))
        .filter(|(key, value)| before.get(*key) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect())
}
