//! Courier quote collection
//!
//! Produces one quote per active courier service for a shipment. Every
//! service in one request is resolved against the same rate card snapshot.
//! Services that cannot carry the shipment are returned as ineligible
//! quotes with a reason, never dropped.

use crate::charges::{aggregate, Overheads};
use crate::constants::MAX_BULK_SHIPMENTS;
use crate::pricing::{evaluate, EvaluatedCharges, PricingContext};
use crate::resolver::{resolve_rate_card, RateQuery};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shipwise_core::{
    config::PricingConfig,
    models::{
        CourierService, EtaDays, IneligibleReason, PaymentMode, PricingNote, Quote, QuoteSet,
        RateCardSnapshot, Shipment,
    },
    money::{is_valid_amount, MAX_AMOUNT, MAX_WEIGHT_KG},
    traits::{CourierServiceRepository, RateCardRepository},
    AppError, AppResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Quote collection service
pub struct QuoteService {
    services: Arc<dyn CourierServiceRepository>,
    rate_cards: Arc<dyn RateCardRepository>,
    pricing: PricingConfig,
}

impl QuoteService {
    /// Create a new quote service
    pub fn new(
        services: Arc<dyn CourierServiceRepository>,
        rate_cards: Arc<dyn RateCardRepository>,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            services,
            rate_cards,
            pricing,
        }
    }

    /// Quote every active courier service for one shipment
    #[instrument(skip(self, shipment), fields(company_id = %shipment.company_id, zone = %shipment.zone))]
    pub async fn compute_quotes(
        &self,
        shipment: &Shipment,
        seller_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> AppResult<QuoteSet> {
        validate_shipment(shipment)?;

        let (services, snapshot) = futures::try_join!(
            self.services.find_active(),
            self.rate_cards.active_snapshot(shipment.company_id, as_of),
        )?;

        let set = build_quote_set(&services, shipment, seller_id, &snapshot, &self.pricing)?;
        info!(
            "Quoted {} services, {} eligible",
            set.quotes.len(),
            set.eligible().count()
        );
        Ok(set)
    }

    /// Quote many shipments against one service list and one snapshot per company
    #[instrument(skip(self, shipments), fields(count = shipments.len()))]
    pub async fn compute_quotes_bulk(
        &self,
        shipments: &[Shipment],
        seller_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> AppResult<Vec<QuoteSet>> {
        if shipments.len() > MAX_BULK_SHIPMENTS {
            return Err(AppError::InvalidInput(format!(
                "At most {} shipments per bulk request, got {}",
                MAX_BULK_SHIPMENTS,
                shipments.len()
            )));
        }
        for shipment in shipments {
            validate_shipment(shipment)?;
        }

        let services = self.services.find_active().await?;

        let mut snapshots: HashMap<Uuid, RateCardSnapshot> = HashMap::new();
        for shipment in shipments {
            if !snapshots.contains_key(&shipment.company_id) {
                let snapshot = self
                    .rate_cards
                    .active_snapshot(shipment.company_id, as_of)
                    .await?;
                snapshots.insert(shipment.company_id, snapshot);
            }
        }

        let mut sets = Vec::with_capacity(shipments.len());
        for shipment in shipments {
            let snapshot = snapshots.get(&shipment.company_id).ok_or_else(|| {
                AppError::Internal(format!("No snapshot loaded for {}", shipment.company_id))
            })?;
            sets.push(build_quote_set(
                &services,
                shipment,
                seller_id,
                snapshot,
                &self.pricing,
            )?);
        }

        info!(
            "Bulk quoted {} shipments across {} companies",
            sets.len(),
            snapshots.len()
        );
        Ok(sets)
    }
}

/// Reject shipments that cannot be priced at all
///
/// Weight and declared value are capped so no charge computed from them
/// can leave the `Decimal` range.
pub fn validate_shipment(shipment: &Shipment) -> AppResult<()> {
    if shipment.weight_kg <= Decimal::ZERO || shipment.weight_kg > MAX_WEIGHT_KG {
        return Err(AppError::Validation(format!(
            "weight_kg must be in (0, {}], got {}",
            MAX_WEIGHT_KG, shipment.weight_kg
        )));
    }
    if !is_valid_amount(shipment.declared_value) {
        return Err(AppError::Validation(format!(
            "declared_value must be in [0, {}], got {}",
            MAX_AMOUNT, shipment.declared_value
        )));
    }
    Ok(())
}

/// First service constraint the shipment violates
pub fn check_constraints(service: &CourierService, shipment: &Shipment) -> Option<IneligibleReason> {
    let c = &service.constraints;

    if !service.zone_support.contains(&shipment.zone) {
        return Some(IneligibleReason::ZoneNotSupported {
            zone: shipment.zone,
        });
    }
    if shipment.weight_kg < c.min_weight_kg {
        return Some(IneligibleReason::WeightBelowMinimum {
            weight_kg: shipment.weight_kg,
            min_kg: c.min_weight_kg,
        });
    }
    if shipment.weight_kg > c.max_weight_kg {
        return Some(IneligibleReason::WeightAboveMaximum {
            weight_kg: shipment.weight_kg,
            max_kg: c.max_weight_kg,
        });
    }
    if !c.payment_modes.contains(&shipment.payment_mode) {
        return Some(IneligibleReason::PaymentModeNotAllowed {
            payment_mode: shipment.payment_mode,
        });
    }

    match shipment.payment_mode {
        PaymentMode::Cod => match c.max_cod_value {
            Some(max) if shipment.declared_value > max => Some(IneligibleReason::CodValueExceeded {
                declared_value: shipment.declared_value,
                max_cod_value: max,
            }),
            _ => None,
        },
        PaymentMode::Prepaid => match c.max_prepaid_value {
            Some(max) if shipment.declared_value > max => {
                Some(IneligibleReason::PrepaidValueExceeded {
                    declared_value: shipment.declared_value,
                    max_prepaid_value: max,
                })
            }
            _ => None,
        },
    }
}

/// Quotes for every service, ordered by service id
pub fn build_quote_set(
    services: &[CourierService],
    shipment: &Shipment,
    seller_id: Uuid,
    snapshot: &RateCardSnapshot,
    pricing: &PricingConfig,
) -> AppResult<QuoteSet> {
    let mut quotes = services
        .iter()
        .filter(|s| s.is_active())
        .map(|s| quote_service(s, shipment, snapshot, pricing))
        .collect::<AppResult<Vec<_>>>()?;
    quotes.sort_by_key(|q| q.service_id);

    Ok(QuoteSet {
        seller_id,
        company_id: shipment.company_id,
        shipment_reference: shipment.reference.clone(),
        as_of: snapshot.as_of,
        quotes,
    })
}

/// Quote one service
///
/// Resolution and pricing failures with a known meaning become ineligible
/// quotes; anything else is returned as an error.
pub fn quote_service(
    service: &CourierService,
    shipment: &Shipment,
    snapshot: &RateCardSnapshot,
    pricing: &PricingConfig,
) -> AppResult<Quote> {
    if let Some(reason) = check_constraints(service, shipment) {
        debug!(service_id = %service.id, "Ineligible: {}", reason);
        return Ok(Quote::ineligible(service, reason));
    }

    let query = RateQuery {
        company_id: shipment.company_id,
        service_id: Some(service.id),
        carrier: &service.provider,
        service_type: &service.service_type,
        shipment_type: shipment.shipment_type,
        as_of: snapshot.as_of,
    };

    let card = match resolve_rate_card(snapshot, &query) {
        Ok(card) => card,
        Err(AppError::NoActiveRateCard { .. }) => {
            return Ok(match pricing.estimated_base_price() {
                Some(base_price) => estimated_quote(service, shipment, base_price),
                None => Quote::ineligible(
                    service,
                    IneligibleReason::NoActiveRateCard {
                        quarantined_rate_cards: snapshot.quarantined.clone(),
                    },
                ),
            });
        }
        Err(e) => return Err(e),
    };

    let ctx = PricingContext {
        card,
        carrier: &service.provider,
        service_type: &service.service_type,
        zone: shipment.zone,
        weight_kg: shipment.weight_kg,
    };

    let charges = match evaluate(&ctx) {
        Ok(charges) => charges,
        Err(AppError::NoBaseRate { .. }) => {
            return Ok(Quote::ineligible(
                service,
                IneligibleReason::NoBaseRate {
                    rate_card_id: card.id,
                    weight_kg: shipment.weight_kg,
                },
            ))
        }
        Err(AppError::ZoneNotPriced { zone, rate_card_id }) => {
            return Ok(Quote::ineligible(
                service,
                IneligibleReason::ZoneNotPriced { rate_card_id, zone },
            ))
        }
        Err(e) => return Err(e),
    };

    let (total, breakdown) = aggregate(&charges, &Overheads::from_card(card), shipment);

    Ok(Quote {
        service_id: service.id,
        carrier: service.provider.clone(),
        service_type: service.service_type.clone(),
        service_code: service.service_code.clone(),
        rate_card_id: Some(card.id),
        rate_card_version: Some(card.version),
        total,
        breakdown,
        eta_days: eta_for(service, charges.transit_days),
        eligible: true,
        ineligible_reason: None,
        estimated: false,
    })
}

fn estimated_quote(service: &CourierService, shipment: &Shipment, base_price: Decimal) -> Quote {
    warn!(
        service_id = %service.id,
        "No active rate card, using estimated base price {}",
        base_price
    );

    let charges = EvaluatedCharges {
        base_charge: base_price,
        notes: vec![PricingNote::EstimatedBasePrice { base_price }],
        ..Default::default()
    };
    let (total, breakdown) = aggregate(&charges, &Overheads::default(), shipment);

    Quote {
        service_id: service.id,
        carrier: service.provider.clone(),
        service_type: service.service_type.clone(),
        service_code: service.service_code.clone(),
        rate_card_id: None,
        rate_card_version: None,
        total,
        breakdown,
        eta_days: eta_for(service, None),
        eligible: true,
        ineligible_reason: None,
        estimated: true,
    }
}

fn eta_for(service: &CourierService, transit_days: Option<u32>) -> EtaDays {
    let sla = service.sla;
    match transit_days {
        Some(days) => EtaDays {
            min: sla.edd_min_days.min(days),
            max: days,
        },
        None => EtaDays {
            min: sla.edd_min_days,
            max: sla.edd_max_days,
        },
    }
}
