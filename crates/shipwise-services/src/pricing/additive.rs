//! Zone-additive scheme: a flat extra per zone, carrier and service type

use super::{base_and_weight, EvaluatedCharges, PricingContext, SchemeEvaluator};
use shipwise_core::{
    models::{PricingNote, ZoneRule},
    AppResult,
};
use tracing::warn;

pub struct ZoneAdditive<'a> {
    pub rules: &'a [ZoneRule],
}

impl SchemeEvaluator for ZoneAdditive<'_> {
    fn evaluate(&self, ctx: &PricingContext<'_>) -> AppResult<EvaluatedCharges> {
        let mut charges = base_and_weight(ctx)?;

        match self
            .rules
            .iter()
            .find(|r| r.matches(ctx.zone, ctx.carrier, ctx.service_type))
        {
            Some(rule) => {
                charges.zone_charge = rule.additional_price;
                charges.transit_days = rule.transit_days;
            }
            None => {
                warn!(
                    rate_card_id = %ctx.card.id,
                    "No zone rule for {} {}/{}, zone charge is 0",
                    ctx.zone,
                    ctx.carrier,
                    ctx.service_type
                );
                charges
                    .notes
                    .push(PricingNote::ZoneRuleMissing { zone: ctx.zone });
            }
        }

        Ok(charges)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::card;
    use super::super::evaluate;
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use shipwise_core::models::{PricingScheme, Zone};

    fn scheme() -> PricingScheme {
        PricingScheme::ZoneAdditive {
            rules: vec![ZoneRule {
                zone: Zone::B,
                carrier: "Delhivery".to_string(),
                service_type: "surface".to_string(),
                additional_price: dec!(15),
                transit_days: Some(2),
            }],
        }
    }

    fn ctx(c: &shipwise_core::models::RateCard, zone: Zone) -> PricingContext<'_> {
        PricingContext {
            card: c,
            carrier: "Delhivery",
            service_type: "surface",
            zone,
            weight_kg: dec!(0.8),
        }
    }

    #[test]
    fn test_matching_rule_adds_zone_price() {
        let c = card(scheme(), dec!(40));
        let charges = evaluate(&ctx(&c, Zone::B)).unwrap();
        assert_eq!(charges.base_charge, dec!(40));
        assert_eq!(charges.zone_charge, dec!(15));
        assert_eq!(charges.transit_days, Some(2));
    }

    #[test]
    fn test_missing_rule_is_zero_with_note() {
        let c = card(scheme(), dec!(40));
        let charges = evaluate(&ctx(&c, Zone::E)).unwrap();
        assert_eq!(charges.zone_charge, Decimal::ZERO);
        assert!(charges
            .notes
            .contains(&PricingNote::ZoneRuleMissing { zone: Zone::E }));
        assert_eq!(charges.transit_days, None);
    }
}
