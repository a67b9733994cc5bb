//! Weight slab and rate card validation
//!
//! Slabs are half-open `[min, max)` ranges. Two slabs may share a boundary
//! but never overlap. Nothing here corrects a bad card; every problem is
//! reported back to the caller.

use rust_decimal::Decimal;
use serde::Serialize;
use shipwise_core::{
    models::{PricingScheme, RateCard, RateCardScope, WeightRange, WeightSlab, Zone},
    money::{is_valid_amount, is_valid_percentage, MAX_AMOUNT},
    AppError, AppResult,
};
use std::collections::{BTreeMap, BTreeSet};

/// Check that no two slabs overlap
///
/// Slabs are sorted by lower bound first, so input order does not matter.
///
/// # Errors
///
/// - `AppError::InvalidSlab` for a slab with `min >= max` or a negative `min`
/// - `AppError::OverlappingSlab` naming the first overlapping pair
pub fn validate_non_overlapping<S: WeightSlab>(context: &str, slabs: &[S]) -> AppResult<()> {
    let ranges = sorted_ranges(context, slabs)?;

    for pair in ranges.windows(2) {
        if pair[1].min_weight < pair[0].max_weight {
            return Err(AppError::OverlappingSlab {
                context: context.to_string(),
                first: pair[0],
                second: pair[1],
            });
        }
    }

    Ok(())
}

/// Check that slabs tile `[0, top)` with no gaps and no overlaps
pub fn validate_coverage<S: WeightSlab>(context: &str, slabs: &[S]) -> AppResult<()> {
    validate_non_overlapping(context, slabs)?;
    let ranges = sorted_ranges(context, slabs)?;

    let Some(first) = ranges.first() else {
        return Err(AppError::Validation(format!("{} has no slabs", context)));
    };
    if first.min_weight != Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "{} must start at 0 kg, first slab is {}",
            context, first
        )));
    }

    for pair in ranges.windows(2) {
        if pair[1].min_weight != pair[0].max_weight {
            return Err(AppError::Validation(format!(
                "{} has a gap between {} and {}",
                context, pair[0], pair[1]
            )));
        }
    }

    Ok(())
}

fn sorted_ranges<S: WeightSlab>(context: &str, slabs: &[S]) -> AppResult<Vec<WeightRange>> {
    let mut ranges: Vec<WeightRange> = slabs.iter().map(WeightSlab::range).collect();

    if let Some(bad) = ranges
        .iter()
        .find(|r| r.min_weight >= r.max_weight || r.min_weight < Decimal::ZERO)
    {
        return Err(AppError::InvalidSlab {
            context: context.to_string(),
            range: *bad,
        });
    }

    ranges.sort_by(|a, b| {
        a.min_weight
            .cmp(&b.min_weight)
            .then(a.max_weight.cmp(&b.max_weight))
    });
    Ok(ranges)
}

/// One problem found on a rate card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Field path, e.g. `weight_rules` or `scheme.zones.zoneC`
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    fn from_error(field: impl Into<String>, err: &AppError) -> Self {
        Self {
            field: field.into(),
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }

    fn warning(field: impl Into<String>, code: &str, message: String) -> Self {
        Self {
            field: field.into(),
            code: code.to_string(),
            message,
        }
    }
}

/// Every issue found on a rate card, errors and warnings
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a rate card, collecting every problem
pub fn validate_rate_card(card: &RateCard) -> ValidationResult {
    let (errors, warnings) = inspect(card);
    ValidationResult {
        valid: errors.is_empty(),
        errors: errors
            .iter()
            .map(|(field, err)| ValidationIssue::from_error(field.clone(), err))
            .collect(),
        warnings,
    }
}

/// Validate a rate card, failing with the first error found
///
/// Used on save paths so the caller gets the typed error (for example
/// `OverlappingSlab` with both ranges).
pub fn ensure_valid(card: &RateCard) -> AppResult<()> {
    let (errors, _) = inspect(card);
    match errors.into_iter().next() {
        Some((_, err)) => Err(err),
        None => Ok(()),
    }
}

fn inspect(card: &RateCard) -> (Vec<(String, AppError)>, Vec<ValidationIssue>) {
    let mut errors: Vec<(String, AppError)> = Vec::new();
    let mut warnings = Vec::new();

    if card.name.trim().is_empty() {
        errors.push((
            "name".to_string(),
            AppError::Validation("rate card name is required".to_string()),
        ));
    }

    for (field, value) in [
        ("gst", card.gst),
        ("fuel_surcharge", card.fuel_surcharge),
        ("cod_percentage", card.cod_percentage),
    ] {
        if !is_valid_percentage(value) {
            errors.push((
                field.to_string(),
                AppError::InvalidPercentage {
                    field: field.to_string(),
                    value,
                },
            ));
        }
    }

    for (field, value) in [
        ("cod_minimum_charge", card.cod_minimum_charge),
        ("minimum_fare", card.minimum_fare),
    ] {
        if !is_valid_amount(value) {
            errors.push((field.to_string(), out_of_range(field, value)));
        }
    }

    if let Some(dates) = card.effective_dates {
        if dates.end.is_some_and(|end| end <= dates.start) {
            errors.push((
                "effective_dates".to_string(),
                AppError::Validation("effective end must be after effective start".to_string()),
            ));
        }
    }

    check_base_rates(card, &mut errors);
    check_weight_rules(card, &mut errors);
    check_scheme(card, &mut errors, &mut warnings);

    (errors, warnings)
}

fn out_of_range(field: &str, value: Decimal) -> AppError {
    AppError::Validation(format!(
        "{} must be in [0, {}], got {}",
        field, MAX_AMOUNT, value
    ))
}

fn check_base_rates(card: &RateCard, errors: &mut Vec<(String, AppError)>) {
    let mut groups: BTreeMap<(String, String), Vec<WeightRange>> = BTreeMap::new();
    for rate in &card.base_rates {
        if !is_valid_amount(rate.base_price) {
            errors.push(("base_rates".to_string(), out_of_range("base_price", rate.base_price)));
        }
        groups
            .entry((
                rate.carrier.to_ascii_lowercase(),
                rate.service_type.to_ascii_lowercase(),
            ))
            .or_default()
            .push(rate.range());
    }

    for ((carrier, service_type), ranges) in groups {
        let context = format!("base_rates[{}/{}]", carrier, service_type);
        if let Err(e) = validate_non_overlapping(&context, &ranges) {
            errors.push(("base_rates".to_string(), e));
        }
    }
}

/// No two weight rules may overlap, whatever their carrier/service filter
fn check_weight_rules(card: &RateCard, errors: &mut Vec<(String, AppError)>) {
    for rule in &card.weight_rules {
        if !is_valid_amount(rule.price_per_kg) {
            errors.push(("weight_rules".to_string(), out_of_range("price_per_kg", rule.price_per_kg)));
        }
    }

    if let Err(e) = validate_non_overlapping("weight_rules", &card.weight_rules) {
        errors.push(("weight_rules".to_string(), e));
    }
}

fn check_scheme(
    card: &RateCard,
    errors: &mut Vec<(String, AppError)>,
    warnings: &mut Vec<ValidationIssue>,
) {
    match &card.scheme {
        PricingScheme::ZoneAdditive { rules } => {
            require_base_rates(card, errors);

            let mut seen = BTreeSet::new();
            for rule in rules {
                if !is_valid_amount(rule.additional_price) {
                    errors.push((
                        "scheme.rules".to_string(),
                        out_of_range("additional_price", rule.additional_price),
                    ));
                }
                let key = (
                    rule.zone,
                    rule.carrier.to_ascii_lowercase(),
                    rule.service_type.to_ascii_lowercase(),
                );
                if !seen.insert(key) {
                    errors.push((
                        "scheme.rules".to_string(),
                        AppError::Validation(format!(
                            "duplicate zone rule for {} {}/{}",
                            rule.zone, rule.carrier, rule.service_type
                        )),
                    ));
                }
            }

            let pairs: BTreeSet<(String, String)> = card
                .base_rates
                .iter()
                .map(|r| (r.carrier.clone(), r.service_type.clone()))
                .collect();
            for (carrier, service_type) in pairs {
                let missing: Vec<Zone> = Zone::ALL
                    .into_iter()
                    .filter(|z| !rules.iter().any(|r| r.matches(*z, &carrier, &service_type)))
                    .collect();
                if !missing.is_empty() {
                    warnings.push(ValidationIssue::warning(
                        "scheme.rules",
                        "zone_rule_missing",
                        format!(
                            "{}/{} has no zone rule for {:?}; zone charge will be 0",
                            carrier, service_type, missing
                        ),
                    ));
                }
            }
        }
        PricingScheme::ZoneMultiplier { multipliers } => {
            require_base_rates(card, errors);

            for (zone, multiplier) in multipliers {
                if *multiplier <= Decimal::ZERO || *multiplier > MAX_AMOUNT {
                    errors.push((
                        format!("scheme.multipliers.{}", zone),
                        AppError::Validation(format!(
                            "multiplier for {} must be in (0, {}], got {}",
                            zone, MAX_AMOUNT, multiplier
                        )),
                    ));
                } else if *multiplier < Decimal::ONE {
                    warnings.push(ValidationIssue::warning(
                        format!("scheme.multipliers.{}", zone),
                        "zone_discount",
                        format!("multiplier {} for {} discounts the base price", multiplier, zone),
                    ));
                }
            }

            let missing: Vec<Zone> = Zone::ALL
                .into_iter()
                .filter(|z| !multipliers.contains_key(z))
                .collect();
            if !missing.is_empty() {
                warnings.push(ValidationIssue::warning(
                    "scheme.multipliers",
                    "zone_multiplier_missing",
                    format!("no multiplier for {:?}; zone charge will be 0", missing),
                ));
            }
        }
        PricingScheme::BandedSlab(table) => {
            if !matches!(card.scope, RateCardScope::Service { .. }) {
                errors.push((
                    "scheme".to_string(),
                    AppError::Validation(
                        "banded slab pricing is only allowed on service-scoped rate cards"
                            .to_string(),
                    ),
                ));
            }

            if table.calculation.rounding_unit_kg <= Decimal::ZERO {
                errors.push((
                    "scheme.calculation.rounding_unit_kg".to_string(),
                    AppError::Validation(format!(
                        "rounding unit must be positive, got {}",
                        table.calculation.rounding_unit_kg
                    )),
                ));
            }

            for (zone, band) in &table.zones {
                let field = format!("scheme.zones.{}", zone);
                if let Err(e) = validate_coverage(&field, &band.slabs) {
                    errors.push((field.clone(), e));
                }
                if !is_valid_amount(band.additional_per_kg) {
                    errors.push((field.clone(), out_of_range("additional_per_kg", band.additional_per_kg)));
                }
                if let Some(slab) = band.slabs.iter().find(|s| !is_valid_amount(s.charge)) {
                    errors.push((field, out_of_range("charge", slab.charge)));
                }
            }

            let missing: Vec<Zone> = Zone::ALL
                .into_iter()
                .filter(|z| !table.zones.contains_key(z))
                .collect();
            if !missing.is_empty() {
                warnings.push(ValidationIssue::warning(
                    "scheme.zones",
                    "zone_not_priced",
                    format!("no band for {:?}; those zones cannot be quoted", missing),
                ));
            }
        }
    }
}

fn require_base_rates(card: &RateCard, errors: &mut Vec<(String, AppError)>) {
    if card.base_rates.is_empty() {
        errors.push((
            "base_rates".to_string(),
            AppError::MissingPricingField("base_rates".to_string()),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use shipwise_core::models::{
        BandSlab, BandedSlabTable, BaseRate, EffectiveDates, WeightRule, ZoneBand,
    };
    use uuid::Uuid;

    fn range(min: Decimal, max: Decimal) -> WeightRange {
        WeightRange::new(min, max)
    }

    fn rule(min: Decimal, max: Decimal) -> WeightRule {
        WeightRule {
            min_weight: min,
            max_weight: max,
            price_per_kg: dec!(10),
            carrier: None,
            service_type: None,
        }
    }

    fn valid_card() -> RateCard {
        RateCard {
            name: "Standard".to_string(),
            base_rates: vec![BaseRate {
                carrier: "Delhivery".to_string(),
                service_type: "surface".to_string(),
                base_price: dec!(50),
                min_weight: dec!(0),
                max_weight: dec!(10),
            }],
            weight_rules: vec![rule(dec!(0), dec!(1)), rule(dec!(1), dec!(2))],
            gst: dec!(18),
            ..Default::default()
        }
    }

    #[test]
    fn test_shared_boundary_is_valid() {
        let slabs = vec![range(dec!(0), dec!(1)), range(dec!(1), dec!(2))];
        assert!(validate_non_overlapping("weight_rules", &slabs).is_ok());
    }

    #[test]
    fn test_overlap_reports_both_ranges_after_sorting() {
        let slabs = vec![range(dec!(1), dec!(2)), range(dec!(0), dec!(1.5))];
        match validate_non_overlapping("weight_rules", &slabs) {
            Err(AppError::OverlappingSlab { first, second, .. }) => {
                assert_eq!(first, range(dec!(0), dec!(1.5)));
                assert_eq!(second, range(dec!(1), dec!(2)));
            }
            other => panic!("expected OverlappingSlab, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_range_is_invalid() {
        let slabs = vec![range(dec!(2), dec!(2))];
        assert!(matches!(
            validate_non_overlapping("weight_rules", &slabs),
            Err(AppError::InvalidSlab { .. })
        ));
    }

    #[test]
    fn test_coverage_rejects_gap_and_late_start() {
        let gap = vec![range(dec!(0), dec!(1)), range(dec!(1.5), dec!(2))];
        assert!(matches!(
            validate_coverage("band", &gap),
            Err(AppError::Validation(msg)) if msg.contains("gap")
        ));

        let late = vec![range(dec!(0.5), dec!(1))];
        assert!(validate_coverage("band", &late).is_err());

        let tiled = vec![range(dec!(0), dec!(0.5)), range(dec!(0.5), dec!(1))];
        assert!(validate_coverage("band", &tiled).is_ok());
    }

    #[test]
    fn test_valid_card_passes() {
        let result = validate_rate_card(&valid_card());
        assert!(result.valid, "{:?}", result.errors);
        assert!(ensure_valid(&valid_card()).is_ok());
    }

    #[test]
    fn test_card_errors_are_collected_together() {
        let card = RateCard {
            gst: dec!(120),
            weight_rules: vec![rule(dec!(0), dec!(1.5)), rule(dec!(1), dec!(2))],
            minimum_fare: dec!(-1),
            ..valid_card()
        };

        let result = validate_rate_card(&card);
        assert!(!result.valid);
        let codes: Vec<&str> = result.errors.iter().map(|e| e.code.as_str()).collect();
        assert!(codes.contains(&"invalid_percentage"));
        assert!(codes.contains(&"overlapping_slab"));
        assert!(codes.contains(&"validation_error"));
    }

    #[test]
    fn test_filtered_rule_overlapping_unfiltered_is_rejected() {
        let mut specific = rule(dec!(1), dec!(3));
        specific.carrier = Some("Delhivery".to_string());

        let card = RateCard {
            weight_rules: vec![rule(dec!(0), dec!(5)), specific],
            ..valid_card()
        };
        let result = validate_rate_card(&card);
        assert!(!result.valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.field == "weight_rules" && e.code == "overlapping_slab"));
        assert!(matches!(
            ensure_valid(&card),
            Err(AppError::OverlappingSlab { .. })
        ));
    }

    #[test]
    fn test_filtered_rules_in_disjoint_ranges_are_valid() {
        let mut specific = rule(dec!(2), dec!(5));
        specific.carrier = Some("BlueDart".to_string());
        specific.service_type = Some("air".to_string());

        let card = RateCard {
            weight_rules: vec![rule(dec!(0), dec!(2)), specific],
            ..valid_card()
        };
        assert!(ensure_valid(&card).is_ok());
    }

    #[test]
    fn test_amounts_above_ceiling_are_rejected() {
        let mut card = valid_card();
        card.base_rates[0].base_price = MAX_AMOUNT + Decimal::ONE;
        card.weight_rules[0].price_per_kg = Decimal::MAX;
        card.cod_minimum_charge = Decimal::MAX;

        let result = validate_rate_card(&card);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"base_rates"));
        assert!(fields.contains(&"weight_rules"));
        assert!(fields.contains(&"cod_minimum_charge"));

        let mut multipliers = BTreeMap::new();
        multipliers.insert(Zone::C, Decimal::MAX);
        let card = RateCard {
            scheme: PricingScheme::ZoneMultiplier { multipliers },
            ..valid_card()
        };
        assert!(validate_rate_card(&card)
            .errors
            .iter()
            .any(|e| e.field == "scheme.multipliers.zoneC"));
    }

    #[test]
    fn test_overlapping_base_rates_per_carrier() {
        let mut card = valid_card();
        card.base_rates.push(BaseRate {
            carrier: "DELHIVERY".to_string(),
            service_type: "Surface".to_string(),
            base_price: dec!(60),
            min_weight: dec!(5),
            max_weight: dec!(20),
        });
        assert!(matches!(
            ensure_valid(&card),
            Err(AppError::OverlappingSlab { .. })
        ));
    }

    #[test]
    fn test_additive_requires_base_rates() {
        let card = RateCard {
            base_rates: vec![],
            ..valid_card()
        };
        assert!(matches!(
            ensure_valid(&card),
            Err(AppError::MissingPricingField(_))
        ));
    }

    #[test]
    fn test_banded_slab_rules() {
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
                        min_kg: dec!(0.4),
                        max_kg: dec!(1),
                        charge: dec!(40),
                    },
                ],
                additional_per_kg: dec!(20),
            },
        );
        let table = BandedSlabTable {
            calculation: Default::default(),
            zones,
        };

        let company_card = RateCard {
            name: "Banded".to_string(),
            scheme: PricingScheme::BandedSlab(table.clone()),
            ..Default::default()
        };
        let result = validate_rate_card(&company_card);
        assert!(result.errors.iter().any(|e| e.field == "scheme"));
        assert!(result.errors.iter().any(|e| e.code == "overlapping_slab"));
        assert!(result.warnings.iter().any(|w| w.code == "zone_not_priced"));

        let service_card = RateCard {
            scope: RateCardScope::Service {
                service_id: Uuid::from_u128(1),
            },
            ..company_card
        };
        assert!(!validate_rate_card(&service_card)
            .errors
            .iter()
            .any(|e| e.field == "scheme"));
    }

    #[test]
    fn test_effective_end_before_start() {
        let now = Utc::now();
        let card = RateCard {
            effective_dates: Some(EffectiveDates {
                start: now,
                end: Some(now - Duration::days(1)),
            }),
            ..valid_card()
        };
        assert!(!validate_rate_card(&card).valid);
    }
}
