//! Quote model
//!
//! Computed, never persisted. One quote per courier service for one
//! shipment, itemized so a reviewer can see how the total was reached or
//! why the service was excluded.

use super::courier::CourierService;
use super::shipment::PaymentMode;
use super::zone::Zone;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Delivery estimate in days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtaDays {
    pub min: u32,
    pub max: u32,
}

/// Why a courier service cannot carry the shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IneligibleReason {
    ZoneNotSupported { zone: Zone },
    WeightBelowMinimum { weight_kg: Decimal, min_kg: Decimal },
    WeightAboveMaximum { weight_kg: Decimal, max_kg: Decimal },
    PaymentModeNotAllowed { payment_mode: PaymentMode },
    CodValueExceeded { declared_value: Decimal, max_cod_value: Decimal },
    PrepaidValueExceeded { declared_value: Decimal, max_prepaid_value: Decimal },
    /// No active card resolved; ambiguous cards skipped at load are listed
    NoActiveRateCard { quarantined_rate_cards: Vec<Uuid> },
    NoBaseRate { rate_card_id: Uuid, weight_kg: Decimal },
    ZoneNotPriced { rate_card_id: Uuid, zone: Zone },
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZoneNotSupported { zone } => write!(f, "zone {} not serviced", zone),
            Self::WeightBelowMinimum { weight_kg, min_kg } => {
                write!(f, "weight {} kg below minimum {} kg", weight_kg, min_kg)
            }
            Self::WeightAboveMaximum { weight_kg, max_kg } => {
                write!(f, "weight {} kg above maximum {} kg", weight_kg, max_kg)
            }
            Self::PaymentModeNotAllowed { payment_mode } => {
                write!(f, "payment mode {} not accepted", payment_mode)
            }
            Self::CodValueExceeded {
                declared_value,
                max_cod_value,
            } => write!(
                f,
                "COD value {} exceeds limit {}",
                declared_value, max_cod_value
            ),
            Self::PrepaidValueExceeded {
                declared_value,
                max_prepaid_value,
            } => write!(
                f,
                "prepaid value {} exceeds limit {}",
                declared_value, max_prepaid_value
            ),
            Self::NoActiveRateCard {
                quarantined_rate_cards,
            } => {
                if quarantined_rate_cards.is_empty() {
                    write!(f, "no active rate card")
                } else {
                    write!(
                        f,
                        "no active rate card ({} skipped with ambiguous schemes)",
                        quarantined_rate_cards.len()
                    )
                }
            }
            Self::NoBaseRate {
                rate_card_id,
                weight_kg,
            } => write!(
                f,
                "rate card {} has no base rate at {} kg",
                rate_card_id, weight_kg
            ),
            Self::ZoneNotPriced { rate_card_id, zone } => {
                write!(f, "rate card {} does not price {}", rate_card_id, zone)
            }
        }
    }
}

/// Rule-matching and rounding decisions taken while pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum PricingNote {
    /// Additive card has no rule for the zone; zone charge is 0
    ZoneRuleMissing { zone: Zone },
    /// Multiplier card has no multiplier for the zone; zone charge is 0
    ZoneMultiplierMissing { zone: Zone },
    /// No weight rule covers the weight; weight charge is 0
    WeightRuleMissing { weight_kg: Decimal },
    /// Banded card rounded the weight before slab lookup
    WeightRounded { from_kg: Decimal, to_kg: Decimal },
    /// Banded weight above the top slab, charged per kg
    OverflowWeight { extra_kg: Decimal, per_kg: Decimal },
    /// Banded weight fell between slabs; base charge is 0
    SlabMissing { weight_kg: Decimal },
    /// Freight below the floor, raised to the minimum fare
    MinimumFareApplied { computed: Decimal, minimum_fare: Decimal },
    /// COD percentage below the floor, raised to the minimum charge
    CodMinimumApplied { computed: Decimal, minimum: Decimal },
    /// Priced from the configured default, not from a rate card
    EstimatedBasePrice { base_price: Decimal },
}

/// Itemized charges
///
/// Components are rounded independently for display. `total` on the quote
/// is rounded once from unrounded components, and `rounding_adjustment`
/// carries the difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChargeBreakdown {
    pub base: Decimal,
    pub weight_charge: Decimal,
    pub zone_charge: Decimal,
    pub subtotal: Decimal,
    pub gst: Decimal,
    pub fuel_surcharge: Decimal,
    pub minimum_fare_adjustment: Decimal,
    pub cod_fee: Decimal,
    pub rounding_adjustment: Decimal,
    #[serde(default)]
    pub notes: Vec<PricingNote>,
}

/// Quote for one courier service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub service_id: Uuid,
    pub carrier: String,
    pub service_type: String,
    pub service_code: String,
    #[serde(default)]
    pub rate_card_id: Option<Uuid>,
    #[serde(default)]
    pub rate_card_version: Option<i64>,
    pub total: Decimal,
    pub breakdown: ChargeBreakdown,
    pub eta_days: EtaDays,
    pub eligible: bool,
    #[serde(default)]
    pub ineligible_reason: Option<IneligibleReason>,
    /// Priced from a fallback default rather than an active rate card
    #[serde(default)]
    pub estimated: bool,
}

impl Quote {
    /// Quote for a service that cannot carry the shipment
    pub fn ineligible(service: &CourierService, reason: IneligibleReason) -> Self {
        Self {
            service_id: service.id,
            carrier: service.provider.clone(),
            service_type: service.service_type.clone(),
            service_code: service.service_code.clone(),
            rate_card_id: None,
            rate_card_version: None,
            total: Decimal::ZERO,
            breakdown: ChargeBreakdown::default(),
            eta_days: EtaDays {
                min: service.sla.edd_min_days,
                max: service.sla.edd_max_days,
            },
            eligible: false,
            ineligible_reason: Some(reason),
            estimated: false,
        }
    }
}

/// All quotes for one shipment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSet {
    pub seller_id: Uuid,
    pub company_id: Uuid,
    #[serde(default)]
    pub shipment_reference: Option<String>,
    /// Instant every card in this set was resolved against
    pub as_of: DateTime<Utc>,
    pub quotes: Vec<Quote>,
}

impl QuoteSet {
    /// Eligible quotes only
    pub fn eligible(&self) -> impl Iterator<Item = &Quote> {
        self.quotes.iter().filter(|q| q.eligible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ineligible_quote_keeps_service_identity() {
        let service = CourierService {
            id: Uuid::from_u128(3),
            provider: "Ekart".to_string(),
            service_code: "EK-SFC".to_string(),
            service_type: "surface".to_string(),
            ..Default::default()
        };

        let quote = Quote::ineligible(&service, IneligibleReason::ZoneNotSupported { zone: Zone::E });
        assert!(!quote.eligible);
        assert_eq!(quote.service_id, Uuid::from_u128(3));
        assert_eq!(quote.carrier, "Ekart");
        assert_eq!(quote.eta_days, EtaDays { min: 3, max: 5 });
    }

    #[test]
    fn test_reason_serializes_with_code() {
        let reason = IneligibleReason::WeightAboveMaximum {
            weight_kg: dec!(12),
            max_kg: dec!(10),
        };
        let value = serde_json::to_value(&reason).unwrap();
        assert_eq!(value["code"], "weight_above_maximum");
        assert_eq!(reason.to_string(), "weight 12 kg above maximum 10 kg");
    }

    #[test]
    fn test_no_active_card_reason_mentions_quarantine() {
        let reason = IneligibleReason::NoActiveRateCard {
            quarantined_rate_cards: vec![Uuid::nil()],
        };
        assert!(reason.to_string().contains("ambiguous"));
    }
}
