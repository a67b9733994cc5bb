//! Common traits for repositories and sinks
//!
//! Defines the storage contracts the engine reads through. Storage
//! technology is an implementation detail behind these traits.

use crate::error::AppError;
use crate::models::{
    CourierService, RateCard, RateCardSnapshot, SellerCourierPolicy, VersionHistoryEntry,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Generic repository trait for read and create operations
#[async_trait]
pub trait Repository<T, ID>: Send + Sync {
    /// Find entity by ID
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, AppError>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<T, AppError>;
}

/// Rate card repository trait with specialized methods
#[async_trait]
pub trait RateCardRepository: Repository<RateCard, Uuid> {
    /// Find several cards in one read; missing ids are simply absent
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<RateCard>, AppError>;

    /// Active cards visible to a company (its own plus global) as of one instant
    async fn active_snapshot(
        &self,
        company_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> Result<RateCardSnapshot, AppError>;

    /// Cards owned by a company, paginated
    async fn list_by_company(
        &self,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RateCard>, i64), AppError>;

    /// Active cards whose effective end is at or before `as_of`
    async fn find_lapsed(&self, as_of: DateTime<Utc>) -> Result<Vec<RateCard>, AppError>;

    /// Compare-and-swap update
    ///
    /// Writes `card` only if the stored version still equals
    /// `expected_version`; otherwise fails with `AppError::StaleVersion`.
    async fn update_versioned(
        &self,
        card: &RateCard,
        expected_version: i64,
    ) -> Result<RateCard, AppError>;
}

/// Courier service repository trait
#[async_trait]
pub trait CourierServiceRepository: Repository<CourierService, Uuid> {
    /// All services with `status = active`, ordered by id
    async fn find_active(&self) -> Result<Vec<CourierService>, AppError>;

    /// Insert or replace a service
    async fn upsert(&self, service: &CourierService) -> Result<CourierService, AppError>;
}

/// Seller policy repository trait
#[async_trait]
pub trait SellerPolicyRepository: Send + Sync {
    /// Policy for a seller, if one was ever stored
    async fn find_by_seller(&self, seller_id: Uuid) -> Result<Option<SellerCourierPolicy>, AppError>;

    /// Create or update a seller's policy
    async fn upsert(&self, policy: &SellerCourierPolicy) -> Result<SellerCourierPolicy, AppError>;
}

/// Append-only sink for rate card version history
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one entry; a failure aborts the mutation being recorded
    async fn append(&self, entry: &VersionHistoryEntry) -> Result<(), AppError>;

    /// Entries for a card, oldest first
    async fn history(&self, rate_card_id: Uuid) -> Result<Vec<VersionHistoryEntry>, AppError>;
}

/// Pagination parameters
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 1000),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination() {
        let p = Pagination::new(1, 10);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 10);

        let p = Pagination::new(3, 20);
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn test_pagination_bounds() {
        let p = Pagination::new(0, 10);
        assert_eq!(p.page, 1);

        let p = Pagination::new(1, 2000);
        assert_eq!(p.per_page, 1000);
    }

    #[test]
    fn test_pagination_meta() {
        assert_eq!(PaginationMeta::new(95, 1, 10).total_pages, 10);
        assert_eq!(PaginationMeta::new(101, 1, 10).total_pages, 11);
        assert_eq!(PaginationMeta::new(5, 1, 0).total_pages, 0);
    }
}
