//! In-memory courier service repository

use async_trait::async_trait;
use shipwise_core::{
    models::CourierService,
    traits::{CourierServiceRepository, Repository},
    AppError, AppResult,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory implementation of [`CourierServiceRepository`]
///
/// Backed by a `BTreeMap` so listings come back in id order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCourierServiceRepository {
    storage: Arc<RwLock<BTreeMap<Uuid, CourierService>>>,
}

impl InMemoryCourierServiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-loaded with `services`
    pub fn with_services(services: impl IntoIterator<Item = CourierService>) -> Self {
        let storage = services.into_iter().map(|s| (s.id, s)).collect();
        Self {
            storage: Arc::new(RwLock::new(storage)),
        }
    }
}

#[async_trait]
impl Repository<CourierService, Uuid> for InMemoryCourierServiceRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CourierService>> {
        Ok(self.storage.read().await.get(&id).cloned())
    }

    async fn create(&self, entity: &CourierService) -> AppResult<CourierService> {
        let mut storage = self.storage.write().await;
        if storage.contains_key(&entity.id) {
            return Err(AppError::Conflict(format!(
                "Courier service {} already exists",
                entity.id
            )));
        }
        storage.insert(entity.id, entity.clone());
        Ok(entity.clone())
    }
}

#[async_trait]
impl CourierServiceRepository for InMemoryCourierServiceRepository {
    async fn find_active(&self) -> AppResult<Vec<CourierService>> {
        Ok(self
            .storage
            .read()
            .await
            .values()
            .filter(|s| s.is_active())
            .cloned()
            .collect())
    }

    async fn upsert(&self, service: &CourierService) -> AppResult<CourierService> {
        self.storage
            .write()
            .await
            .insert(service.id, service.clone());
        Ok(service.clone())
    }
}
