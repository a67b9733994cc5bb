//! In-memory rate card repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shipwise_core::{
    models::{RateCard, RateCardSnapshot, RateCardStatus},
    traits::{RateCardRepository, Repository},
    AppError, AppResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory implementation of [`RateCardRepository`]
///
/// `update_versioned` checks and writes under one write lock, so it has the
/// same compare-and-swap semantics as the conditional SQL update.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRateCardRepository {
    storage: Arc<RwLock<HashMap<Uuid, RateCard>>>,
}

impl InMemoryRateCardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-loaded with `cards`
    pub fn with_cards(cards: impl IntoIterator<Item = RateCard>) -> Self {
        let storage = cards.into_iter().map(|c| (c.id, c)).collect();
        Self {
            storage: Arc::new(RwLock::new(storage)),
        }
    }

    /// Overwrite a card without a version check (test setup)
    pub async fn put(&self, card: RateCard) {
        self.storage.write().await.insert(card.id, card);
    }

    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

fn sorted(mut cards: Vec<RateCard>) -> Vec<RateCard> {
    cards.sort_by_key(|c| c.id);
    cards
}

#[async_trait]
impl Repository<RateCard, Uuid> for InMemoryRateCardRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<RateCard>> {
        Ok(self.storage.read().await.get(&id).cloned())
    }

    async fn create(&self, entity: &RateCard) -> AppResult<RateCard> {
        let mut storage = self.storage.write().await;
        if storage.contains_key(&entity.id) {
            return Err(AppError::Conflict(format!(
                "Rate card {} already exists",
                entity.id
            )));
        }
        storage.insert(entity.id, entity.clone());
        Ok(entity.clone())
    }
}

#[async_trait]
impl RateCardRepository for InMemoryRateCardRepository {
    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<RateCard>> {
        let storage = self.storage.read().await;
        Ok(sorted(
            ids.iter().filter_map(|id| storage.get(id).cloned()).collect(),
        ))
    }

    async fn active_snapshot(
        &self,
        company_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> AppResult<RateCardSnapshot> {
        let storage = self.storage.read().await;
        let cards = storage
            .values()
            .filter(|c| c.status == RateCardStatus::Active)
            .filter(|c| c.company_id.map_or(true, |owner| owner == company_id))
            .filter(|c| c.is_effective_at(as_of))
            .cloned()
            .collect();

        Ok(RateCardSnapshot::new(company_id, as_of, sorted(cards)))
    }

    async fn list_by_company(
        &self,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<RateCard>, i64)> {
        let storage = self.storage.read().await;
        let owned = sorted(
            storage
                .values()
                .filter(|c| c.company_id == Some(company_id))
                .cloned()
                .collect(),
        );
        let total = owned.len() as i64;
        let page = owned
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn find_lapsed(&self, as_of: DateTime<Utc>) -> AppResult<Vec<RateCard>> {
        let storage = self.storage.read().await;
        Ok(sorted(
            storage
                .values()
                .filter(|c| c.status == RateCardStatus::Active)
                .filter(|c| {
                    c.effective_dates
                        .and_then(|d| d.end)
                        .is_some_and(|end| end <= as_of)
                })
                .cloned()
                .collect(),
        ))
    }

    async fn update_versioned(&self, card: &RateCard, expected_version: i64) -> AppResult<RateCard> {
        let mut storage = self.storage.write().await;
        let stored = storage
            .get(&card.id)
            .ok_or(AppError::RateCardNotFound(card.id))?;

        if stored.version != expected_version {
            return Err(AppError::StaleVersion {
                id: card.id,
                expected: expected_version,
                actual: stored.version,
            });
        }

        storage.insert(card.id, card.clone());
        Ok(card.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shipwise_core::models::EffectiveDates;

    fn card(id: u128, company: Option<u128>, status: RateCardStatus) -> RateCard {
        let now = Utc::now();
        RateCard {
            id: Uuid::from_u128(id),
            company_id: company.map(Uuid::from_u128),
            status,
            effective_dates: Some(EffectiveDates {
                start: now - Duration::days(1),
                end: Some(now + Duration::days(1)),
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn snapshot_includes_own_and_global_active_cards() {
        let repo = InMemoryRateCardRepository::with_cards([
            card(1, Some(100), RateCardStatus::Active),
            card(2, None, RateCardStatus::Active),
            card(3, Some(200), RateCardStatus::Active),
            card(4, Some(100), RateCardStatus::Draft),
        ]);

        let snapshot = repo
            .active_snapshot(Uuid::from_u128(100), Utc::now())
            .await
            .unwrap();
        let ids: Vec<Uuid> = snapshot.cards.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![Uuid::from_u128(1), Uuid::from_u128(2)]);
        assert!(snapshot.quarantined.is_empty());
    }

    #[tokio::test]
    async fn update_versioned_is_compare_and_swap() {
        let repo = InMemoryRateCardRepository::with_cards([card(1, Some(100), RateCardStatus::Draft)]);

        let mut next = card(1, Some(100), RateCardStatus::Active);
        next.version = 2;
        repo.update_versioned(&next, 1).await.unwrap();

        let result = repo.update_versioned(&next, 1).await;
        assert!(matches!(
            result,
            Err(AppError::StaleVersion {
                expected: 1,
                actual: 2,
                ..
            })
        ));

        let missing = card(9, None, RateCardStatus::Draft);
        assert!(matches!(
            repo.update_versioned(&missing, 1).await,
            Err(AppError::RateCardNotFound(_))
        ));
    }

    #[tokio::test]
    async fn lapsed_cards_have_ended() {
        let repo = InMemoryRateCardRepository::with_cards([card(1, Some(100), RateCardStatus::Active)]);

        assert!(repo.find_lapsed(Utc::now()).await.unwrap().is_empty());
        let later = Utc::now() + Duration::days(2);
        assert_eq!(repo.find_lapsed(later).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_id() {
        let repo = InMemoryRateCardRepository::new();
        let c = card(1, Some(100), RateCardStatus::Draft);
        repo.create(&c).await.unwrap();
        assert!(matches!(repo.create(&c).await, Err(AppError::Conflict(_))));
        let stored = repo.find_by_id(c.id).await.unwrap().unwrap();
        assert_eq!(stored.version, c.version);
    }
}
