//! Rate card repository implementation
//!
//! PostgreSQL-backed storage for rate cards. Rows keep the three legacy
//! scheme columns; every load goes through [`LegacySchemeFields`] so an
//! ambiguous row is never priced under a guessed scheme.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shipwise_core::{
    models::{
        BandedSlabTable, BaseRate, EffectiveDates, LegacySchemeFields, RateCard, RateCardScope,
        RateCardSnapshot, WeightRule, Zone, ZoneRule,
    },
    traits::{RateCardRepository, Repository},
    AppError, AppResult,
};
use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use std::collections::BTreeMap;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use super::parse_text_enum;

const RATE_CARD_COLUMNS: &str = r#"
    id, company_id, scope, service_id, name, status, version, category,
    shipment_type, base_rates, weight_rules, zone_rules, zone_multipliers,
    banded_slabs, cod_percentage, cod_minimum_charge, gst, fuel_surcharge,
    minimum_fare, effective_start, effective_end, created_at, updated_at
"#;

/// PostgreSQL implementation of RateCardRepository
pub struct PgRateCardRepository {
    pool: PgPool,
}

impl PgRateCardRepository {
    /// Create a new rate card repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version(&self, id: Uuid) -> AppResult<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM rate_cards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error reading version of rate card {}: {}", id, e);
                AppError::Database(format!("Failed to read rate card version: {}", e))
            })?;

        Ok(row.map(|r| r.0))
    }
}

#[async_trait]
impl Repository<RateCard, Uuid> for PgRateCardRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<RateCard>> {
        debug!("Finding rate card by id: {}", id);

        let sql = format!("SELECT {} FROM rate_cards WHERE id = $1", RATE_CARD_COLUMNS);
        let row = sqlx::query_as::<Postgres, RateCardRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding rate card {}: {}", id, e);
                AppError::Database(format!("Failed to find rate card: {}", e))
            })?;

        row.map(RateCard::try_from).transpose()
    }

    #[instrument(skip(self, entity), fields(rate_card_id = %entity.id))]
    async fn create(&self, entity: &RateCard) -> AppResult<RateCard> {
        debug!("Creating rate card: {}", entity.name);

        let sql = format!(
            r#"
            INSERT INTO rate_cards ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
            RETURNING {cols}
            "#,
            cols = RATE_CARD_COLUMNS
        );

        let row = bind_card(sqlx::query_as::<Postgres, RateCardRow>(&sql), entity)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating rate card: {}", e);
                AppError::Database(format!("Failed to create rate card: {}", e))
            })?;

        RateCard::try_from(row)
    }
}

#[async_trait]
impl RateCardRepository for PgRateCardRepository {
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<RateCard>> {
        let sql = format!(
            "SELECT {} FROM rate_cards WHERE id = ANY($1) ORDER BY id",
            RATE_CARD_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, RateCardRow>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding rate cards by id: {}", e);
                AppError::Database(format!("Failed to fetch rate cards: {}", e))
            })?;

        rows.into_iter().map(RateCard::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn active_snapshot(
        &self,
        company_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> AppResult<RateCardSnapshot> {
        let sql = format!(
            r#"
            SELECT {}
            FROM rate_cards
            WHERE status = 'active'
                AND (company_id = $1 OR company_id IS NULL)
                AND effective_start IS NOT NULL
                AND effective_start <= $2
                AND (effective_end IS NULL OR effective_end > $2)
            ORDER BY id
            "#,
            RATE_CARD_COLUMNS
        );

        let rows = sqlx::query_as::<Postgres, RateCardRow>(&sql)
            .bind(company_id)
            .bind(as_of)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error loading rate card snapshot: {}", e);
                AppError::Database(format!("Failed to load active rate cards: {}", e))
            })?;

        let (cards, quarantined) = load_cards(rows)?;
        debug!(
            "Snapshot for company {} holds {} cards ({} quarantined)",
            company_id,
            cards.len(),
            quarantined.len()
        );

        Ok(RateCardSnapshot {
            company_id,
            as_of,
            cards,
            quarantined,
        })
    }

    #[instrument(skip(self))]
    async fn list_by_company(
        &self,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<RateCard>, i64)> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rate_cards WHERE company_id = $1")
            .bind(company_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting company rate cards: {}", e);
                AppError::Database(format!("Failed to count rate cards: {}", e))
            })?;

        let sql = format!(
            r#"
            SELECT {}
            FROM rate_cards
            WHERE company_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
            RATE_CARD_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, RateCardRow>(&sql)
            .bind(company_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing company rate cards: {}", e);
                AppError::Database(format!("Failed to list rate cards: {}", e))
            })?;

        let cards = rows
            .into_iter()
            .map(RateCard::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((cards, total.0))
    }

    #[instrument(skip(self))]
    async fn find_lapsed(&self, as_of: DateTime<Utc>) -> AppResult<Vec<RateCard>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM rate_cards
            WHERE status = 'active'
                AND effective_end IS NOT NULL
                AND effective_end <= $1
            ORDER BY id
            "#,
            RATE_CARD_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, RateCardRow>(&sql)
            .bind(as_of)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding lapsed rate cards: {}", e);
                AppError::Database(format!("Failed to find lapsed rate cards: {}", e))
            })?;

        let (cards, _) = load_cards(rows)?;
        Ok(cards)
    }

    #[instrument(skip(self, card), fields(rate_card_id = %card.id, version = card.version))]
    async fn update_versioned(&self, card: &RateCard, expected_version: i64) -> AppResult<RateCard> {
        let sql = format!(
            r#"
            UPDATE rate_cards
            SET company_id = $2,
                scope = $3,
                service_id = $4,
                name = $5,
                status = $6,
                version = $7,
                category = $8,
                shipment_type = $9,
                base_rates = $10,
                weight_rules = $11,
                zone_rules = $12,
                zone_multipliers = $13,
                banded_slabs = $14,
                cod_percentage = $15,
                cod_minimum_charge = $16,
                gst = $17,
                fuel_surcharge = $18,
                minimum_fare = $19,
                effective_start = $20,
                effective_end = $21,
                created_at = $22,
                updated_at = $23
            WHERE id = $1 AND version = $24
            RETURNING {}
            "#,
            RATE_CARD_COLUMNS
        );

        let row = bind_card(sqlx::query_as::<Postgres, RateCardRow>(&sql), card)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating rate card {}: {}", card.id, e);
                AppError::Database(format!("Failed to update rate card: {}", e))
            })?;

        match row {
            Some(row) => RateCard::try_from(row),
            None => match self.current_version(card.id).await? {
                Some(actual) => {
                    warn!(
                        "Stale write to rate card {}: expected version {}, found {}",
                        card.id, expected_version, actual
                    );
                    Err(AppError::StaleVersion {
                        id: card.id,
                        expected: expected_version,
                        actual,
                    })
                }
                None => Err(AppError::RateCardNotFound(card.id)),
            },
        }
    }
}

/// Convert rows, setting aside cards whose legacy scheme is ambiguous
fn load_cards(rows: Vec<RateCardRow>) -> AppResult<(Vec<RateCard>, Vec<Uuid>)> {
    let mut cards = Vec::with_capacity(rows.len());
    let mut quarantined = Vec::new();

    for row in rows {
        let id = row.id;
        match RateCard::try_from(row) {
            Ok(card) => cards.push(card),
            Err(AppError::MultipleSchemes { .. }) => quarantined.push(id),
            Err(e) => return Err(e),
        }
    }

    Ok((cards, quarantined))
}

/// Bind every column of `card` in `RATE_CARD_COLUMNS` order ($1..$23)
fn bind_card<'q>(
    query: QueryAs<'q, Postgres, RateCardRow, PgArguments>,
    card: &RateCard,
) -> QueryAs<'q, Postgres, RateCardRow, PgArguments> {
    let legacy = LegacySchemeFields::from_scheme(&card.scheme);
    let (effective_start, effective_end) = match card.effective_dates {
        Some(dates) => (Some(dates.start), dates.end),
        None => (None, None),
    };

    query
        .bind(card.id)
        .bind(card.company_id)
        .bind(card.scope.as_str())
        .bind(card.scope.service_id())
        .bind(card.name.clone())
        .bind(card.status.as_str())
        .bind(card.version)
        .bind(card.category.clone())
        .bind(card.shipment_type.to_string())
        .bind(Json(card.base_rates.clone()))
        .bind(Json(card.weight_rules.clone()))
        .bind(legacy.zone_rules.map(Json))
        .bind(legacy.zone_multipliers.map(Json))
        .bind(legacy.banded_slabs.map(Json))
        .bind(card.cod_percentage)
        .bind(card.cod_minimum_charge)
        .bind(card.gst)
        .bind(card.fuel_surcharge)
        .bind(card.minimum_fare)
        .bind(effective_start)
        .bind(effective_end)
        .bind(card.created_at)
        .bind(card.updated_at)
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct RateCardRow {
    id: Uuid,
    company_id: Option<Uuid>,
    scope: String,
    service_id: Option<Uuid>,
    name: String,
    status: String,
    version: i64,
    category: Option<String>,
    shipment_type: String,
    base_rates: Json<Vec<BaseRate>>,
    weight_rules: Json<Vec<WeightRule>>,
    zone_rules: Option<Json<Vec<ZoneRule>>>,
    zone_multipliers: Option<Json<BTreeMap<Zone, Decimal>>>,
    banded_slabs: Option<Json<BandedSlabTable>>,
    cod_percentage: Decimal,
    cod_minimum_charge: Decimal,
    gst: Decimal,
    fuel_surcharge: Decimal,
    minimum_fare: Decimal,
    effective_start: Option<DateTime<Utc>>,
    effective_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RateCardRow> for RateCard {
    type Error = AppError;

    fn try_from(row: RateCardRow) -> Result<Self, Self::Error> {
        let scope = match row.scope.as_str() {
            "global" => RateCardScope::Global,
            "company" => RateCardScope::Company,
            "service" => RateCardScope::Service {
                service_id: row.service_id.ok_or_else(|| {
                    AppError::Database(format!(
                        "Service-scoped rate card {} has no service_id",
                        row.id
                    ))
                })?,
            },
            other => {
                return Err(AppError::Database(format!(
                    "Unexpected value '{}' in column scope",
                    other
                )))
            }
        };

        let legacy = LegacySchemeFields {
            zone_rules: row.zone_rules.map(|j| j.0),
            zone_multipliers: row.zone_multipliers.map(|j| j.0),
            banded_slabs: row.banded_slabs.map(|j| j.0),
        };
        let scheme = legacy.into_scheme(row.id)?;

        Ok(Self {
            id: row.id,
            company_id: row.company_id,
            scope,
            name: row.name,
            status: parse_text_enum("status", &row.status)?,
            version: row.version,
            category: row.category,
            shipment_type: parse_text_enum("shipment_type", &row.shipment_type)?,
            base_rates: row.base_rates.0,
            weight_rules: row.weight_rules.0,
            scheme,
            cod_percentage: row.cod_percentage,
            cod_minimum_charge: row.cod_minimum_charge,
            gst: row.gst,
            fuel_surcharge: row.fuel_surcharge,
            minimum_fare: row.minimum_fare,
            effective_dates: row
                .effective_start
                .map(|start| EffectiveDates {
                    start,
                    end: row.effective_end,
                }),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shipwise_core::models::{PricingScheme, SchemeKind};

    fn row(id: u128) -> RateCardRow {
        let now = Utc::now();
        RateCardRow {
            id: Uuid::from_u128(id),
            company_id: Some(Uuid::from_u128(100)),
            scope: "company".to_string(),
            service_id: None,
            name: "Standard".to_string(),
            status: "active".to_string(),
            version: 3,
            category: None,
            shipment_type: "forward".to_string(),
            base_rates: Json(vec![]),
            weight_rules: Json(vec![]),
            zone_rules: None,
            zone_multipliers: None,
            banded_slabs: None,
            cod_percentage: dec!(2),
            cod_minimum_charge: dec!(30),
            gst: dec!(18),
            fuel_surcharge: dec!(5),
            minimum_fare: dec!(0),
            effective_start: Some(now),
            effective_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn multipliers() -> BTreeMap<Zone, Decimal> {
        let mut m = BTreeMap::new();
        m.insert(Zone::C, dec!(1.2));
        m
    }

    #[test]
    fn test_row_with_single_scheme_converts() {
        let mut r = row(1);
        r.zone_multipliers = Some(Json(multipliers()));

        let card = RateCard::try_from(r).unwrap();
        assert_eq!(card.scheme_kind(), SchemeKind::ZoneMultiplier);
        assert_eq!(card.version, 3);
        assert!(card.effective_dates.is_some());
    }

    #[test]
    fn test_ambiguous_rows_are_quarantined() {
        let mut clean = row(1);
        clean.zone_rules = Some(Json(vec![]));

        let mut ambiguous = row(2);
        ambiguous.zone_multipliers = Some(Json(multipliers()));
        ambiguous.zone_rules = Some(Json(vec![ZoneRule {
            zone: Zone::A,
            carrier: "Delhivery".to_string(),
            service_type: "surface".to_string(),
            additional_price: dec!(5),
            transit_days: None,
        }]));

        let (cards, quarantined) = load_cards(vec![clean, ambiguous]).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].scheme, PricingScheme::ZoneAdditive { rules: vec![] });
        assert_eq!(quarantined, vec![Uuid::from_u128(2)]);
    }

    #[test]
    fn test_service_scope_requires_service_id() {
        let mut r = row(1);
        r.zone_rules = Some(Json(vec![]));
        r.scope = "service".to_string();
        assert!(matches!(RateCard::try_from(r), Err(AppError::Database(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database
    async fn test_update_versioned_rejects_stale_write() {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/shipwise".to_string());
        let pool = PgPool::connect(&database_url).await.unwrap();
        let repo = PgRateCardRepository::new(pool);

        let card = RateCard {
            id: Uuid::new_v4(),
            company_id: Some(Uuid::new_v4()),
            name: "CAS".to_string(),
            ..Default::default()
        };
        let stored = repo.create(&card).await.unwrap();

        let mut next = stored.clone();
        next.version += 1;
        repo.update_versioned(&next, stored.version).await.unwrap();

        let result = repo.update_versioned(&next, stored.version).await;
        assert!(matches!(result, Err(AppError::StaleVersion { actual: 2, .. })));
    }
}
