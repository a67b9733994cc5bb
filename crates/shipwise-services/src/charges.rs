//! Charge aggregation
//!
//! Applies GST, fuel surcharge, the minimum fare and the COD fee on top of
//! the scheme components. Everything stays unrounded until the total, which
//! is rounded half-up to two places exactly once.

use crate::pricing::EvaluatedCharges;
use rust_decimal::Decimal;
use shipwise_core::{
    models::{ChargeBreakdown, PricingNote, RateCard, Shipment},
    money::{percent_of, round_money},
};

/// Overhead percentages and floors taken from a rate card
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overheads {
    pub gst: Decimal,
    pub fuel_surcharge: Decimal,
    pub minimum_fare: Decimal,
    pub cod_percentage: Decimal,
    pub cod_minimum_charge: Decimal,
}

impl Overheads {
    pub fn from_card(card: &RateCard) -> Self {
        Self {
            gst: card.gst,
            fuel_surcharge: card.fuel_surcharge,
            minimum_fare: card.minimum_fare,
            cod_percentage: card.cod_percentage,
            cod_minimum_charge: card.cod_minimum_charge,
        }
    }
}

/// Combine scheme charges and overheads into a total and its breakdown
///
/// The minimum fare floors freight only; the COD fee is added after it.
pub fn aggregate(
    charges: &EvaluatedCharges,
    overheads: &Overheads,
    shipment: &Shipment,
) -> (Decimal, ChargeBreakdown) {
    let mut notes = charges.notes.clone();

    let subtotal = charges.base_charge + charges.weight_charge + charges.zone_charge;
    let gst = percent_of(subtotal, overheads.gst);
    let fuel = percent_of(subtotal + gst, overheads.fuel_surcharge);
    let raw_freight = subtotal + gst + fuel;

    let freight = if raw_freight < overheads.minimum_fare {
        notes.push(PricingNote::MinimumFareApplied {
            computed: round_money(raw_freight),
            minimum_fare: overheads.minimum_fare,
        });
        overheads.minimum_fare
    } else {
        raw_freight
    };

    let cod_fee = if shipment.is_cod() {
        let computed = percent_of(shipment.declared_value, overheads.cod_percentage);
        if computed < overheads.cod_minimum_charge {
            notes.push(PricingNote::CodMinimumApplied {
                computed: round_money(computed),
                minimum: overheads.cod_minimum_charge,
            });
            overheads.cod_minimum_charge
        } else {
            computed
        }
    } else {
        Decimal::ZERO
    };

    let total = round_money(freight + cod_fee);

    let mut breakdown = ChargeBreakdown {
        base: round_money(charges.base_charge),
        weight_charge: round_money(charges.weight_charge),
        zone_charge: round_money(charges.zone_charge),
        subtotal: round_money(subtotal),
        gst: round_money(gst),
        fuel_surcharge: round_money(fuel),
        minimum_fare_adjustment: round_money(freight - raw_freight),
        cod_fee: round_money(cod_fee),
        rounding_adjustment: Decimal::ZERO,
        notes,
    };
    breakdown.rounding_adjustment = total
        - (breakdown.subtotal
            + breakdown.gst
            + breakdown.fuel_surcharge
            + breakdown.minimum_fare_adjustment
            + breakdown.cod_fee);

    (total, breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shipwise_core::models::PaymentMode;

    fn charges(base: Decimal, weight: Decimal, zone: Decimal) -> EvaluatedCharges {
        EvaluatedCharges {
            base_charge: base,
            weight_charge: weight,
            zone_charge: zone,
            ..Default::default()
        }
    }

    fn overheads(gst: Decimal, fuel: Decimal) -> Overheads {
        Overheads {
            gst,
            fuel_surcharge: fuel,
            ..Default::default()
        }
    }

    fn prepaid() -> Shipment {
        Shipment {
            payment_mode: PaymentMode::Prepaid,
            ..Default::default()
        }
    }

    fn cod(value: Decimal) -> Shipment {
        Shipment {
            payment_mode: PaymentMode::Cod,
            declared_value: value,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_rounding_on_total() {
        // base 100, multiplier 1.0825 -> zone delta 8.25
        let (total, breakdown) = aggregate(
            &charges(dec!(100), Decimal::ZERO, dec!(8.25)),
            &overheads(dec!(18), dec!(5)),
            &prepaid(),
        );

        assert_eq!(total, dec!(134.12));
        assert_eq!(breakdown.subtotal, dec!(108.25));
        assert_eq!(breakdown.gst, dec!(19.49));
        assert_eq!(breakdown.fuel_surcharge, dec!(6.39));
        assert_eq!(breakdown.rounding_adjustment, dec!(-0.01));
    }

    #[test]
    fn test_unrounded_multiplier_delta() {
        // base 33, multiplier 1.015 -> zone delta 0.495, rounding it first gives 41.51
        let (total, _) = aggregate(
            &charges(dec!(33), Decimal::ZERO, dec!(0.495)),
            &overheads(dec!(18), dec!(5)),
            &prepaid(),
        );
        assert_eq!(total, dec!(41.50));
    }

    #[test]
    fn test_minimum_fare_then_cod() {
        let o = Overheads {
            gst: dec!(18),
            minimum_fare: dec!(40),
            cod_percentage: dec!(2),
            cod_minimum_charge: dec!(30),
            ..Default::default()
        };

        // freight 20 × 1.18 = 23.60, floored to 40; COD 2% of 500 = 10, floored to 30
        let (total, breakdown) = aggregate(&charges(dec!(20), dec!(0), dec!(0)), &o, &cod(dec!(500)));
        assert_eq!(total, dec!(70));
        assert_eq!(breakdown.minimum_fare_adjustment, dec!(16.40));
        assert_eq!(breakdown.cod_fee, dec!(30));
        assert_eq!(breakdown.rounding_adjustment, Decimal::ZERO);
        assert_eq!(
            breakdown.notes,
            vec![
                PricingNote::MinimumFareApplied {
                    computed: dec!(23.60),
                    minimum_fare: dec!(40)
                },
                PricingNote::CodMinimumApplied {
                    computed: dec!(10),
                    minimum: dec!(30)
                },
            ]
        );

        // COD above its floor is charged as computed
        let (total, breakdown) = aggregate(&charges(dec!(20), dec!(0), dec!(0)), &o, &cod(dec!(2000)));
        assert_eq!(breakdown.cod_fee, dec!(40));
        assert_eq!(total, dec!(80));
    }

    #[test]
    fn test_prepaid_has_no_cod_fee() {
        let o = Overheads {
            cod_percentage: dec!(2),
            cod_minimum_charge: dec!(30),
            ..Default::default()
        };
        let (total, breakdown) = aggregate(&charges(dec!(50), dec!(12), dec!(10)), &o, &prepaid());
        assert_eq!(total, dec!(72));
        assert_eq!(breakdown.cod_fee, Decimal::ZERO);
        assert!(breakdown.notes.is_empty());
    }

    #[test]
    fn test_scheme_notes_carried_over() {
        let mut c = charges(dec!(50), dec!(0), dec!(0));
        c.notes.push(PricingNote::ZoneRuleMissing {
            zone: shipwise_core::models::Zone::C,
        });
        let (_, breakdown) = aggregate(&c, &Overheads::default(), &prepaid());
        assert_eq!(breakdown.notes.len(), 1);
    }
}
