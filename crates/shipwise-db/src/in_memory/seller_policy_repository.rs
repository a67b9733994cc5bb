//! In-memory seller policy repository

use async_trait::async_trait;
use chrono::Utc;
use shipwise_core::{models::SellerCourierPolicy, traits::SellerPolicyRepository, AppResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory implementation of [`SellerPolicyRepository`]
#[derive(Debug, Clone, Default)]
pub struct InMemorySellerPolicyRepository {
    storage: Arc<RwLock<HashMap<Uuid, SellerCourierPolicy>>>,
}

impl InMemorySellerPolicyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SellerPolicyRepository for InMemorySellerPolicyRepository {
    async fn find_by_seller(&self, seller_id: Uuid) -> AppResult<Option<SellerCourierPolicy>> {
        Ok(self.storage.read().await.get(&seller_id).cloned())
    }

    async fn upsert(&self, policy: &SellerCourierPolicy) -> AppResult<SellerCourierPolicy> {
        policy.validate()?;

        let mut stored = policy.clone();
        stored.updated_at = Utc::now();
        self.storage
            .write()
            .await
            .insert(stored.seller_id, stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shipwise_core::AppError;

    #[tokio::test]
    async fn upsert_validates_delta() {
        let repo = InMemorySellerPolicyRepository::new();
        let policy = SellerCourierPolicy {
            seller_id: Uuid::from_u128(1),
            balanced_delta_percent: dec!(101),
            ..Default::default()
        };

        assert!(matches!(
            repo.upsert(&policy).await,
            Err(AppError::InvalidPercentage { .. })
        ));
        assert!(repo.find_by_seller(Uuid::from_u128(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_existing() {
        let repo = InMemorySellerPolicyRepository::new();
        let mut policy = SellerCourierPolicy {
            seller_id: Uuid::from_u128(1),
            ..Default::default()
        };
        repo.upsert(&policy).await.unwrap();

        policy.balanced_delta_percent = dec!(25);
        repo.upsert(&policy).await.unwrap();

        let stored = repo.find_by_seller(Uuid::from_u128(1)).await.unwrap().unwrap();
        assert_eq!(stored.balanced_delta_percent, dec!(25));
    }
}
