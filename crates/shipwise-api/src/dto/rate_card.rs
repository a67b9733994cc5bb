//! Rate card DTOs

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shipwise_core::models::{
    BaseRate, EffectiveDates, PricingScheme, RateCard, RateCardScope, RateCardStatus, SchemeKind,
    ShipmentType, WeightRule,
};
use shipwise_services::{AdjustmentDirection, PriceAdjustment};
use uuid::Uuid;
use validator::Validate;

/// Rate card content as sent by clients
///
/// Identity, status and version are owned by the lifecycle and cannot be
/// set here.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RateCardRequest {
    #[serde(default)]
    pub company_id: Option<Uuid>,

    #[serde(default)]
    pub scope: RateCardScope,

    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub category: Option<String>,

    #[serde(default)]
    pub shipment_type: ShipmentType,

    #[serde(default)]
    pub base_rates: Vec<BaseRate>,

    #[serde(default)]
    pub weight_rules: Vec<WeightRule>,

    #[serde(default)]
    pub scheme: PricingScheme,

    #[serde(default)]
    pub cod_percentage: Decimal,

    #[serde(default)]
    pub cod_minimum_charge: Decimal,

    #[serde(default)]
    pub gst: Decimal,

    #[serde(default)]
    pub fuel_surcharge: Decimal,

    #[serde(default)]
    pub minimum_fare: Decimal,

    #[serde(default)]
    pub effective_dates: Option<EffectiveDates>,
}

impl RateCardRequest {
    /// Build an unsaved card; the lifecycle assigns id, status and version
    pub fn into_rate_card(self, id: Uuid) -> RateCard {
        let now = Utc::now();
        RateCard {
            id,
            company_id: self.company_id,
            scope: self.scope,
            name: self.name.trim().to_string(),
            status: RateCardStatus::Draft,
            version: 1,
            category: self.category,
            shipment_type: self.shipment_type,
            base_rates: self.base_rates,
            weight_rules: self.weight_rules,
            scheme: self.scheme,
            cod_percentage: self.cod_percentage,
            cod_minimum_charge: self.cod_minimum_charge,
            gst: self.gst,
            fuel_surcharge: self.fuel_surcharge,
            minimum_fare: self.minimum_fare,
            effective_dates: self.effective_dates,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Revise a card based on the version the client read
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RateCardReviseRequest {
    #[validate(range(min = 1))]
    pub expected_version: i64,

    #[serde(flatten)]
    #[validate(nested)]
    pub card: RateCardRequest,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CloneRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkAdjustRequest {
    #[validate(length(min = 1, max = 500))]
    pub rate_card_ids: Vec<Uuid>,

    pub direction: AdjustmentDirection,

    pub percent: Decimal,
}

impl BulkAdjustRequest {
    pub fn adjustment(&self) -> PriceAdjustment {
        PriceAdjustment {
            direction: self.direction,
            percent: self.percent,
        }
    }
}

/// Rate card with its derived scheme kind
#[derive(Debug, Clone, Serialize)]
pub struct RateCardResponse {
    #[serde(flatten)]
    pub card: RateCard,
    pub scheme_kind: SchemeKind,
}

impl From<RateCard> for RateCardResponse {
    fn from(card: RateCard) -> Self {
        Self {
            scheme_kind: card.scheme_kind(),
            card,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rate_card_request_validation() {
        let req: RateCardRequest = serde_json::from_value(json!({
            "name": "Standard B2C",
            "company_id": "00000000-0000-0000-0000-000000000064",
            "base_rates": [{
                "carrier": "Delhivery",
                "service_type": "surface",
                "base_price": "50",
                "min_weight": "0",
                "max_weight": "10"
            }],
            "scheme": { "scheme": "zone_multiplier", "multipliers": { "zoneA": "1.0", "zoneC": "1.2" } },
            "gst": "18"
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let card = req.clone().into_rate_card(Uuid::nil());
        assert_eq!(card.status, RateCardStatus::Draft);
        assert_eq!(card.scope, RateCardScope::Company);
        assert_eq!(card.scheme_kind(), SchemeKind::ZoneMultiplier);

        let empty = RateCardRequest {
            name: String::new(),
            ..req
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_revise_request_flattens_card() {
        let req: RateCardReviseRequest = serde_json::from_value(json!({
            "expected_version": 3,
            "name": "Festive",
        }))
        .unwrap();
        assert_eq!(req.expected_version, 3);
        assert_eq!(req.card.name, "Festive");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_bulk_adjust_request() {
        let req: BulkAdjustRequest = serde_json::from_value(json!({
            "rate_card_ids": ["00000000-0000-0000-0000-000000000001"],
            "direction": "decrease",
            "percent": "7.5"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.adjustment().direction, AdjustmentDirection::Decrease);
    }
}
