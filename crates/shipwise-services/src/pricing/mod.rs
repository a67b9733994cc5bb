//! Zone pricing scheme evaluators
//!
//! Each scheme turns a resolved rate card, a zone and a weight into three
//! unrounded components: base, weight and zone charge. Overheads (GST,
//! fuel, minimum fare, COD) are applied afterwards by the charge aggregator.
//!
//! A missing zone rule or multiplier is not an error: the component is 0
//! and a [`PricingNote`] explains why. A missing base rate or an unpriced
//! zone makes the service ineligible instead.

pub mod additive;
pub mod banded;
pub mod multiplier;

pub use additive::ZoneAdditive;
pub use banded::BandedSlab;
pub use multiplier::ZoneMultiplier;

use rust_decimal::Decimal;
use serde::Serialize;
use shipwise_core::{
    models::{PricingNote, PricingScheme, RateCard, WeightSlab, Zone},
    AppError, AppResult,
};
use tracing::debug;

/// Inputs for pricing one courier service under one rate card
#[derive(Debug, Clone, Copy)]
pub struct PricingContext<'a> {
    pub card: &'a RateCard,
    pub carrier: &'a str,
    pub service_type: &'a str,
    pub zone: Zone,
    pub weight_kg: Decimal,
}

/// Scheme output, never pre-summed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluatedCharges {
    pub base_charge: Decimal,
    pub weight_charge: Decimal,
    pub zone_charge: Decimal,
    /// Transit time from a matching zone rule, overriding the SLA maximum
    pub transit_days: Option<u32>,
    pub notes: Vec<PricingNote>,
}

/// A zone pricing scheme
pub trait SchemeEvaluator {
    fn evaluate(&self, ctx: &PricingContext<'_>) -> AppResult<EvaluatedCharges>;
}

/// Evaluate the card's scheme
pub fn evaluate(ctx: &PricingContext<'_>) -> AppResult<EvaluatedCharges> {
    match &ctx.card.scheme {
        PricingScheme::ZoneAdditive { rules } => ZoneAdditive { rules }.evaluate(ctx),
        PricingScheme::ZoneMultiplier { multipliers } => ZoneMultiplier { multipliers }.evaluate(ctx),
        PricingScheme::BandedSlab(table) => BandedSlab { table }.evaluate(ctx),
    }
}

/// Base price and per-kg charge shared by the additive and multiplier schemes
pub(crate) fn base_and_weight(ctx: &PricingContext<'_>) -> AppResult<EvaluatedCharges> {
    let base = ctx
        .card
        .base_rate_for(ctx.carrier, ctx.service_type, ctx.weight_kg)
        .ok_or_else(|| AppError::NoBaseRate {
            carrier: ctx.carrier.to_string(),
            service_type: ctx.service_type.to_string(),
            weight_kg: ctx.weight_kg,
        })?;

    let mut charges = EvaluatedCharges {
        base_charge: base.base_price,
        ..Default::default()
    };

    match ctx
        .card
        .weight_rule_for(ctx.carrier, ctx.service_type, ctx.weight_kg)
    {
        Some(rule) => {
            debug!(
                "Weight rule {} at {}/kg for {} kg",
                rule.range(),
                rule.price_per_kg,
                ctx.weight_kg
            );
            charges.weight_charge = ctx.weight_kg * rule.price_per_kg;
        }
        None => charges.notes.push(PricingNote::WeightRuleMissing {
            weight_kg: ctx.weight_kg,
        }),
    }

    Ok(charges)
}
