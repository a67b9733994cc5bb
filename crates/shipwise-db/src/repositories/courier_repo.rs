//! Courier service repository implementation
//!
//! Provides PostgreSQL-backed storage for the courier service catalogue.

use async_trait::async_trait;
use shipwise_core::{
    models::{CourierService, ServiceConstraints, Sla, Zone},
    traits::{CourierServiceRepository, Repository},
    AppError, AppResult,
};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use std::collections::BTreeSet;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::parse_text_enum;

/// PostgreSQL implementation of CourierServiceRepository
pub struct PgCourierServiceRepository {
    pool: PgPool,
}

impl PgCourierServiceRepository {
    /// Create a new courier service repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<CourierService, Uuid> for PgCourierServiceRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CourierService>> {
        debug!("Finding courier service by id: {}", id);

        let row = sqlx::query_as::<Postgres, CourierServiceRow>(
            r#"
            SELECT id, provider, service_code, service_type, name,
                   zone_support, constraints, edd_min_days, edd_max_days, status
            FROM courier_services
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding courier service {}: {}", id, e);
            AppError::Database(format!("Failed to find courier service: {}", e))
        })?;

        row.map(CourierService::try_from).transpose()
    }

    #[instrument(skip(self, entity), fields(service_id = %entity.id))]
    async fn create(&self, entity: &CourierService) -> AppResult<CourierService> {
        let row = sqlx::query_as::<Postgres, CourierServiceRow>(
            r#"
            INSERT INTO courier_services (
                id, provider, service_code, service_type, name,
                zone_support, constraints, edd_min_days, edd_max_days, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, provider, service_code, service_type, name,
                      zone_support, constraints, edd_min_days, edd_max_days, status
            "#,
        )
        .bind(entity.id)
        .bind(&entity.provider)
        .bind(&entity.service_code)
        .bind(&entity.service_type)
        .bind(&entity.name)
        .bind(Json(&entity.zone_support))
        .bind(Json(&entity.constraints))
        .bind(entity.sla.edd_min_days as i32)
        .bind(entity.sla.edd_max_days as i32)
        .bind(entity.status.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating courier service: {}", e);
            AppError::Database(format!("Failed to create courier service: {}", e))
        })?;

        CourierService::try_from(row)
    }
}

#[async_trait]
impl CourierServiceRepository for PgCourierServiceRepository {
    #[instrument(skip(self))]
    async fn find_active(&self) -> AppResult<Vec<CourierService>> {
        let rows = sqlx::query_as::<Postgres, CourierServiceRow>(
            r#"
            SELECT id, provider, service_code, service_type, name,
                   zone_support, constraints, edd_min_days, edd_max_days, status
            FROM courier_services
            WHERE status = 'active'
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding active courier services: {}", e);
            AppError::Database(format!("Failed to fetch courier services: {}", e))
        })?;

        debug!("Loaded {} active courier services", rows.len());
        rows.into_iter().map(CourierService::try_from).collect()
    }

    #[instrument(skip(self, service), fields(service_id = %service.id))]
    async fn upsert(&self, service: &CourierService) -> AppResult<CourierService> {
        let row = sqlx::query_as::<Postgres, CourierServiceRow>(
            r#"
            INSERT INTO courier_services (
                id, provider, service_code, service_type, name,
                zone_support, constraints, edd_min_days, edd_max_days, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE
            SET provider = EXCLUDED.provider,
                service_code = EXCLUDED.service_code,
                service_type = EXCLUDED.service_type,
                name = EXCLUDED.name,
                zone_support = EXCLUDED.zone_support,
                constraints = EXCLUDED.constraints,
                edd_min_days = EXCLUDED.edd_min_days,
                edd_max_days = EXCLUDED.edd_max_days,
                status = EXCLUDED.status
            RETURNING id, provider, service_code, service_type, name,
                      zone_support, constraints, edd_min_days, edd_max_days, status
            "#,
        )
        .bind(service.id)
        .bind(&service.provider)
        .bind(&service.service_code)
        .bind(&service.service_type)
        .bind(&service.name)
        .bind(Json(&service.zone_support))
        .bind(Json(&service.constraints))
        .bind(service.sla.edd_min_days as i32)
        .bind(service.sla.edd_max_days as i32)
        .bind(service.status.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error upserting courier service {}: {}", service.id, e);
            AppError::Database(format!("Failed to save courier service: {}", e))
        })?;

        CourierService::try_from(row)
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct CourierServiceRow {
    id: Uuid,
    provider: String,
    service_code: String,
    service_type: String,
    name: String,
    zone_support: Json<BTreeSet<Zone>>,
    constraints: Json<ServiceConstraints>,
    edd_min_days: i32,
    edd_max_days: i32,
    status: String,
}

impl TryFrom<CourierServiceRow> for CourierService {
    type Error = AppError;

    fn try_from(row: CourierServiceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            provider: row.provider,
            service_code: row.service_code,
            service_type: row.service_type,
            name: row.name,
            zone_support: row.zone_support.0,
            constraints: row.constraints.0,
            sla: Sla {
                edd_min_days: row.edd_min_days.max(0) as u32,
                edd_max_days: row.edd_max_days.max(0) as u32,
            },
            status: parse_text_enum("status", &row.status)?,
        })
    }
}
