//! Pricing scheme models
//!
//! Rate cards were extended over time without migrating older ones, so three
//! zone pricing models coexist. A card carries exactly one of them as a
//! tagged variant; stored rows keep the legacy nullable columns and go
//! through [`LegacySchemeFields`] on load.

use super::rate_card::WeightSlab;
use super::zone::Zone;
use crate::error::AppError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Zone pricing scheme of a rate card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum PricingScheme {
    /// Flat additional price per zone, per carrier and service type
    ZoneAdditive { rules: Vec<ZoneRule> },

    /// Multiplier applied to the base price, per zone
    ZoneMultiplier { multipliers: BTreeMap<Zone, Decimal> },

    /// Per-zone weight slabs (service-scoped cards only)
    BandedSlab(BandedSlabTable),
}

impl PricingScheme {
    /// Which variant this is
    pub fn kind(&self) -> SchemeKind {
        match self {
            PricingScheme::ZoneAdditive { .. } => SchemeKind::ZoneAdditive,
            PricingScheme::ZoneMultiplier { .. } => SchemeKind::ZoneMultiplier,
            PricingScheme::BandedSlab(_) => SchemeKind::BandedSlab,
        }
    }
}

impl Default for PricingScheme {
    fn default() -> Self {
        PricingScheme::ZoneAdditive { rules: Vec::new() }
    }
}

/// Discriminant of [`PricingScheme`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeKind {
    ZoneAdditive,
    ZoneMultiplier,
    BandedSlab,
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeKind::ZoneAdditive => write!(f, "zone_additive"),
            SchemeKind::ZoneMultiplier => write!(f, "zone_multiplier"),
            SchemeKind::BandedSlab => write!(f, "banded_slab"),
        }
    }
}

/// Zone-additive rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRule {
    pub zone: Zone,
    pub carrier: String,
    pub service_type: String,
    pub additional_price: Decimal,
    #[serde(default)]
    pub transit_days: Option<u32>,
}

impl ZoneRule {
    /// Returns true if this rule prices `zone` for the carrier/service pair
    pub fn matches(&self, zone: Zone, carrier: &str, service_type: &str) -> bool {
        self.zone == zone
            && self.carrier.eq_ignore_ascii_case(carrier)
            && self.service_type.eq_ignore_ascii_case(service_type)
    }
}

/// How a banded card rounds weight before slab lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    #[default]
    Ceil,
    Floor,
    Nearest,
}

impl RoundingMode {
    /// Round `weight` to a multiple of `unit`
    ///
    /// A non-positive unit leaves the weight untouched. `Nearest` rounds
    /// half-up.
    pub fn apply(&self, weight: Decimal, unit: Decimal) -> Decimal {
        if unit <= Decimal::ZERO {
            return weight;
        }

        let units = weight / unit;
        let rounded = match self {
            RoundingMode::Ceil => units.ceil(),
            RoundingMode::Floor => units.floor(),
            RoundingMode::Nearest => {
                units.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            }
        };

        rounded * unit
    }
}

/// Weight rounding settings of a banded card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabCalculation {
    pub rounding_mode: RoundingMode,
    pub rounding_unit_kg: Decimal,
}

impl Default for SlabCalculation {
    fn default() -> Self {
        Self {
            rounding_mode: RoundingMode::Ceil,
            rounding_unit_kg: Decimal::new(5, 1),
        }
    }
}

/// A weight band with a flat charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSlab {
    pub min_kg: Decimal,
    pub max_kg: Decimal,
    pub charge: Decimal,
}

impl WeightSlab for BandSlab {
    fn lower(&self) -> Decimal {
        self.min_kg
    }

    fn upper(&self) -> Decimal {
        self.max_kg
    }
}

/// Slabs for one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ZoneBand {
    pub slabs: Vec<BandSlab>,
    /// Charged per kg above the top slab boundary
    #[serde(default)]
    pub additional_per_kg: Decimal,
}

impl ZoneBand {
    /// Slab whose `[min_kg, max_kg)` contains `weight`
    pub fn slab_for(&self, weight: Decimal) -> Option<&BandSlab> {
        self.slabs
            .iter()
            .find(|s| weight >= s.min_kg && weight < s.max_kg)
    }

    /// Slab with the highest upper boundary
    pub fn top(&self) -> Option<&BandSlab> {
        self.slabs.iter().max_by(|a, b| a.max_kg.cmp(&b.max_kg))
    }
}

/// Banded-slab pricing table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BandedSlabTable {
    #[serde(default)]
    pub calculation: SlabCalculation,
    pub zones: BTreeMap<Zone, ZoneBand>,
}

/// Scheme columns as stored on legacy rows
///
/// Any combination may be populated in old data. Loading never picks one
/// when more than one is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacySchemeFields {
    pub zone_rules: Option<Vec<ZoneRule>>,
    pub zone_multipliers: Option<BTreeMap<Zone, Decimal>>,
    pub banded_slabs: Option<BandedSlabTable>,
}

impl LegacySchemeFields {
    /// Split a scheme back into storage columns
    pub fn from_scheme(scheme: &PricingScheme) -> Self {
        match scheme {
            PricingScheme::ZoneAdditive { rules } => Self {
                zone_rules: Some(rules.clone()),
                ..Default::default()
            },
            PricingScheme::ZoneMultiplier { multipliers } => Self {
                zone_multipliers: Some(multipliers.clone()),
                ..Default::default()
            },
            PricingScheme::BandedSlab(table) => Self {
                banded_slabs: Some(table.clone()),
                ..Default::default()
            },
        }
    }

    /// Schemes with non-empty data
    pub fn populated(&self) -> Vec<SchemeKind> {
        let mut kinds = Vec::new();
        if self.banded_slabs.as_ref().is_some_and(|t| !t.zones.is_empty()) {
            kinds.push(SchemeKind::BandedSlab);
        }
        if self.zone_multipliers.as_ref().is_some_and(|m| !m.is_empty()) {
            kinds.push(SchemeKind::ZoneMultiplier);
        }
        if self.zone_rules.as_ref().is_some_and(|r| !r.is_empty()) {
            kinds.push(SchemeKind::ZoneAdditive);
        }
        kinds
    }

    /// Schemes whose column is present at all, even if empty
    fn present(&self) -> Vec<SchemeKind> {
        let mut kinds = Vec::new();
        if self.banded_slabs.is_some() {
            kinds.push(SchemeKind::BandedSlab);
        }
        if self.zone_multipliers.is_some() {
            kinds.push(SchemeKind::ZoneMultiplier);
        }
        if self.zone_rules.is_some() {
            kinds.push(SchemeKind::ZoneAdditive);
        }
        kinds
    }

    /// Detect the single populated scheme
    ///
    /// # Errors
    ///
    /// - `AppError::MultipleSchemes` when more than one scheme holds data
    /// - `AppError::MissingPricingField` when no scheme can be identified
    pub fn into_scheme(self, rate_card_id: Uuid) -> Result<PricingScheme, AppError> {
        let populated = self.populated();

        let kind = match populated.as_slice() {
            [single] => *single,
            [] => match self.present().as_slice() {
                [single] => *single,
                _ => {
                    return Err(AppError::MissingPricingField(format!(
                        "pricing scheme (rate card {})",
                        rate_card_id
                    )))
                }
            },
            _ => {
                warn!(
                    rate_card_id = %rate_card_id,
                    schemes = ?populated,
                    "MultipleSchemesWarning: rate card needs an explicit scheme cleanup"
                );
                return Err(AppError::MultipleSchemes {
                    rate_card_id,
                    schemes: populated,
                });
            }
        };

        let scheme = match kind {
            SchemeKind::ZoneAdditive => PricingScheme::ZoneAdditive {
                rules: self.zone_rules.unwrap_or_default(),
            },
            SchemeKind::ZoneMultiplier => PricingScheme::ZoneMultiplier {
                multipliers: self.zone_multipliers.unwrap_or_default(),
            },
            SchemeKind::BandedSlab => {
                PricingScheme::BandedSlab(self.banded_slabs.unwrap_or_default())
            }
        };

        Ok(scheme)
    }
}
