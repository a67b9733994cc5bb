//! Rate card resolution
//!
//! Picks the one card that prices a courier service at an instant. Service
//! scope beats company scope beats global scope; within a scope the latest
//! effective start wins, then the highest version, then the lowest id.

use chrono::{DateTime, Utc};
use shipwise_core::{
    models::{RateCard, RateCardSnapshot, RateCardStatus, ShipmentType},
    AppError, AppResult,
};
use std::cmp::{Ordering, Reverse};
use tracing::debug;
use uuid::Uuid;

/// What needs a rate card
#[derive(Debug, Clone)]
pub struct RateQuery<'a> {
    pub company_id: Uuid,
    pub service_id: Option<Uuid>,
    pub carrier: &'a str,
    pub service_type: &'a str,
    pub shipment_type: ShipmentType,
    pub as_of: DateTime<Utc>,
}

impl RateQuery<'_> {
    fn admits(&self, card: &RateCard) -> bool {
        card.status == RateCardStatus::Active
            && card.company_id.map_or(true, |owner| owner == self.company_id)
            && card.is_effective_at(self.as_of)
            && card.shipment_type == self.shipment_type
            && card.applies_to(self.service_id, self.carrier, self.service_type)
    }
}

fn preference(a: &RateCard, b: &RateCard) -> Ordering {
    let key = |c: &RateCard| (c.scope.rank(), Reverse(c.effective_start()), Reverse(c.version), c.id);
    key(a).cmp(&key(b))
}

/// Resolve the rate card for `query` from a snapshot
///
/// # Errors
///
/// `AppError::NoActiveRateCard` when no card in the snapshot qualifies.
pub fn resolve_rate_card<'s>(
    snapshot: &'s RateCardSnapshot,
    query: &RateQuery<'_>,
) -> AppResult<&'s RateCard> {
    let card = snapshot
        .cards
        .iter()
        .filter(|c| query.admits(c))
        .min_by(|a, b| preference(a, b))
        .ok_or_else(|| AppError::NoActiveRateCard {
            company_id: query.company_id,
            carrier: query.carrier.to_string(),
            service_type: query.service_type.to_string(),
            as_of: query.as_of,
        })?;

    debug!(
        rate_card_id = %card.id,
        scope = card.scope.as_str(),
        version = card.version,
        "Resolved rate card for {}/{}",
        query.carrier,
        query.service_type
    );

    Ok(card)
}
