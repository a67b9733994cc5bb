//! Zone-multiplier scheme
//!
//! The multiplier scales the base price; the reported zone charge is the
//! delta `base × multiplier − base`, left unrounded.

use super::{base_and_weight, EvaluatedCharges, PricingContext, SchemeEvaluator};
use rust_decimal::Decimal;
use shipwise_core::{
    models::{PricingNote, Zone},
    AppResult,
};
use std::collections::BTreeMap;
use tracing::warn;

pub struct ZoneMultiplier<'a> {
    pub multipliers: &'a BTreeMap<Zone, Decimal>,
}

impl SchemeEvaluator for ZoneMultiplier<'_> {
    fn evaluate(&self, ctx: &PricingContext<'_>) -> AppResult<EvaluatedCharges> {
        let mut charges = base_and_weight(ctx)?;

        match self.multipliers.get(&ctx.zone) {
            Some(multiplier) => {
                charges.zone_charge = charges.base_charge * multiplier - charges.base_charge;
            }
            None => {
                warn!(
                    rate_card_id = %ctx.card.id,
                    "No multiplier for {}, zone charge is 0",
                    ctx.zone
                );
                charges
                    .notes
                    .push(PricingNote::ZoneMultiplierMissing { zone: ctx.zone });
            }
        }

        Ok(charges)
    }
}
