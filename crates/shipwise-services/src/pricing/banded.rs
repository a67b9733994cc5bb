//! Banded-slab scheme (service-scoped cards)
//!
//! The zone selects a band of weight slabs. Weight is rounded to the card's
//! unit first; at or beyond the top slab the top charge applies plus a per-kg
//! charge for the excess. Base rates and weight rules are not used.

use super::{EvaluatedCharges, PricingContext, SchemeEvaluator};
use rust_decimal::Decimal;
use shipwise_core::{
    models::{BandedSlabTable, PricingNote},
    AppError, AppResult,
};
use tracing::{debug, warn};

pub struct BandedSlab<'a> {
    pub table: &'a BandedSlabTable,
}

impl SchemeEvaluator for BandedSlab<'_> {
    fn evaluate(&self, ctx: &PricingContext<'_>) -> AppResult<EvaluatedCharges> {
        let not_priced = || AppError::ZoneNotPriced {
            zone: ctx.zone,
            rate_card_id: ctx.card.id,
        };

        let band = self.table.zones.get(&ctx.zone).ok_or_else(not_priced)?;
        let top = band.top().ok_or_else(not_priced)?;

        let calc = &self.table.calculation;
        let weight = calc.rounding_mode.apply(ctx.weight_kg, calc.rounding_unit_kg);

        let mut charges = EvaluatedCharges::default();
        if weight != ctx.weight_kg {
            charges.notes.push(PricingNote::WeightRounded {
                from_kg: ctx.weight_kg,
                to_kg: weight,
            });
        }

        if weight >= top.max_kg {
            let extra = weight - top.max_kg;
            charges.base_charge = top.charge;
            charges.weight_charge = extra * band.additional_per_kg;
            if extra > Decimal::ZERO {
                charges.notes.push(PricingNote::OverflowWeight {
                    extra_kg: extra,
                    per_kg: band.additional_per_kg,
                });
            }
        } else if let Some(slab) = band.slab_for(weight) {
            debug!("Slab [{}, {}) charge {}", slab.min_kg, slab.max_kg, slab.charge);
            charges.base_charge = slab.charge;
        } else {
            warn!(
                rate_card_id = %ctx.card.id,
                "No slab in {} for {} kg, base charge is 0",
                ctx.zone,
                weight
            );
            charges
                .notes
                .push(PricingNote::SlabMissing { weight_kg: weight });
        }

        Ok(charges)
    }
}

#[cfg(test)]
mod tests {
    use super::super::evaluate;
    use super::*;
    use rust_decimal_macros::dec;
    use shipwise_core::models::{
        BandSlab, PricingScheme, RateCard, RateCardScope, RoundingMode, SlabCalculation, Zone,
        ZoneBand,
    };
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn banded_card(mode: RoundingMode) -> RateCard {
        let mut zones = BTreeMap::new();
        zones.insert(
            Zone::A,
            ZoneBand {
                slabs: vec![
                    BandSlab {
                        min_kg: dec!(0),
                        max_kg: dec!(0.5),
                        charge: dec!(30),
                    },
                    BandSlab {
                        min_kg: dec!(0.5),
                        max_kg: dec!(1),
                        charge: dec!(45),
                    },
                    BandSlab {
                        min_kg: dec!(1),
                        max_kg: dec!(2),
                        charge: dec!(70),
                    },
                ],
                additional_per_kg: dec!(25),
            },
        );

        RateCard {
            name: "Banded".to_string(),
            scope: RateCardScope::Service {
                service_id: Uuid::from_u128(1),
            },
            scheme: PricingScheme::BandedSlab(BandedSlabTable {
                calculation: SlabCalculation {
                    rounding_mode: mode,
                    rounding_unit_kg: dec!(0.5),
                },
                zones,
            }),
            ..Default::default()
        }
    }

    fn price(card: &RateCard, zone: Zone, weight: Decimal) -> AppResult<EvaluatedCharges> {
        evaluate(&PricingContext {
            card,
            carrier: "Shadowfax",
            service_type: "surface",
            zone,
            weight_kg: weight,
        })
    }

    #[test]
    fn test_ceil_rounding_selects_next_slab() {
        let card = banded_card(RoundingMode::Ceil);
        let charges = price(&card, Zone::A, dec!(0.7)).unwrap();
        assert_eq!(charges.base_charge, dec!(70));
        assert_eq!(charges.zone_charge, Decimal::ZERO);
        assert_eq!(
            charges.notes,
            vec![PricingNote::WeightRounded {
                from_kg: dec!(0.7),
                to_kg: dec!(1.0)
            }]
        );
    }

    #[test]
    fn test_floor_rounding() {
        let card = banded_card(RoundingMode::Floor);
        let charges = price(&card, Zone::A, dec!(0.7)).unwrap();
        assert_eq!(charges.base_charge, dec!(45));
    }

    #[test]
    fn test_overflow_above_top_slab() {
        let card = banded_card(RoundingMode::Ceil);
        let charges = price(&card, Zone::A, dec!(3.2)).unwrap();
        assert_eq!(charges.base_charge, dec!(70));
        assert_eq!(charges.weight_charge, dec!(37.5));
        assert!(charges.notes.contains(&PricingNote::OverflowWeight {
            extra_kg: dec!(1.5),
            per_kg: dec!(25)
        }));
    }

    #[test]
    fn test_exact_top_boundary_uses_top_charge() {
        let card = banded_card(RoundingMode::Ceil);
        let charges = price(&card, Zone::A, dec!(2)).unwrap();
        assert_eq!(charges.base_charge, dec!(70));
        assert_eq!(charges.weight_charge, Decimal::ZERO);
    }

    #[test]
    fn test_zone_without_band_not_priced() {
        let card = banded_card(RoundingMode::Ceil);
        assert!(matches!(
            price(&card, Zone::D, dec!(1)),
            Err(AppError::ZoneNotPriced { zone: Zone::D, .. })
        ));
    }
}
