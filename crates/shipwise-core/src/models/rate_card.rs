//! Rate card model
//!
//! A versioned pricing configuration owned by a company, a courier service,
//! or nobody (global). Holds base rates, per-kg weight rules, one zone
//! pricing scheme, and the overheads applied on top (GST, fuel, COD,
//! minimum fare).

use super::scheme::{PricingScheme, SchemeKind};
use super::shipment::ShipmentType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Anything with a `[lower, upper)` weight range
pub trait WeightSlab {
    /// Inclusive lower bound in kg
    fn lower(&self) -> Decimal;

    /// Exclusive upper bound in kg
    fn upper(&self) -> Decimal;

    /// Range as a value, for error reporting
    fn range(&self) -> WeightRange {
        WeightRange::new(self.lower(), self.upper())
    }
}

/// Half-open weight range `[min_weight, max_weight)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightRange {
    pub min_weight: Decimal,
    pub max_weight: Decimal,
}

impl WeightRange {
    pub fn new(min_weight: Decimal, max_weight: Decimal) -> Self {
        Self {
            min_weight,
            max_weight,
        }
    }

    /// Returns true if `weight` falls inside the range
    #[inline]
    pub fn contains(&self, weight: Decimal) -> bool {
        weight >= self.min_weight && weight < self.max_weight
    }
}

impl WeightSlab for WeightRange {
    fn lower(&self) -> Decimal {
        self.min_weight
    }

    fn upper(&self) -> Decimal {
        self.max_weight
    }
}

impl fmt::Display for WeightRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.min_weight, self.max_weight)
    }
}

/// Rate card status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RateCardStatus {
    #[default]
    Draft,
    Active,
    Inactive,
    Expired,
}

impl RateCardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateCardStatus::Draft => "draft",
            RateCardStatus::Active => "active",
            RateCardStatus::Inactive => "inactive",
            RateCardStatus::Expired => "expired",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(RateCardStatus::Draft),
            "active" => Some(RateCardStatus::Active),
            "inactive" => Some(RateCardStatus::Inactive),
            "expired" => Some(RateCardStatus::Expired),
            _ => None,
        }
    }
}

impl fmt::Display for RateCardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a rate card applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateCardScope {
    /// Platform-wide card, used when the company has none
    Global,
    /// Company-wide card covering every carrier it lists base rates for
    #[default]
    Company,
    /// Card bound to a single courier service
    Service { service_id: Uuid },
}

impl RateCardScope {
    /// Resolution preference (lower wins)
    pub fn rank(&self) -> u8 {
        match self {
            RateCardScope::Service { .. } => 0,
            RateCardScope::Company => 1,
            RateCardScope::Global => 2,
        }
    }

    pub fn service_id(&self) -> Option<Uuid> {
        match self {
            RateCardScope::Service { service_id } => Some(*service_id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RateCardScope::Global => "global",
            RateCardScope::Company => "company",
            RateCardScope::Service { .. } => "service",
        }
    }
}

/// Base price for a carrier/service within a weight range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseRate {
    pub carrier: String,
    pub service_type: String,
    pub base_price: Decimal,
    pub min_weight: Decimal,
    pub max_weight: Decimal,
}

impl BaseRate {
    /// Returns true if this rate covers the carrier/service at `weight`
    pub fn matches(&self, carrier: &str, service_type: &str, weight: Decimal) -> bool {
        self.serves(carrier, service_type) && self.range().contains(weight)
    }

    /// Returns true if this rate is for the carrier/service pair at any weight
    pub fn serves(&self, carrier: &str, service_type: &str) -> bool {
        self.carrier.eq_ignore_ascii_case(carrier)
            && self.service_type.eq_ignore_ascii_case(service_type)
    }
}

impl WeightSlab for BaseRate {
    fn lower(&self) -> Decimal {
        self.min_weight
    }

    fn upper(&self) -> Decimal {
        self.max_weight
    }
}

/// Per-kg charge within a weight range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRule {
    pub min_weight: Decimal,
    pub max_weight: Decimal,
    pub price_per_kg: Decimal,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
}

impl WeightRule {
    /// Filter match: `None` on either filter means "any"
    pub fn applies_to(&self, carrier: &str, service_type: &str) -> bool {
        self.carrier
            .as_deref()
            .map_or(true, |c| c.eq_ignore_ascii_case(carrier))
            && self
                .service_type
                .as_deref()
                .map_or(true, |s| s.eq_ignore_ascii_case(service_type))
    }
}

impl WeightSlab for WeightRule {
    fn lower(&self) -> Decimal {
        self.min_weight
    }

    fn upper(&self) -> Decimal {
        self.max_weight
    }
}

/// Validity window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveDates {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl EffectiveDates {
    /// Returns true if `at` falls inside the window
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && self.end.map_or(true, |end| at < end)
    }
}

/// Rate card entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCard {
    /// Unique identifier
    pub id: Uuid,

    /// Owning company (None = global)
    pub company_id: Option<Uuid>,

    /// Resolution scope
    pub scope: RateCardScope,

    /// Display name
    pub name: String,

    /// Lifecycle status
    pub status: RateCardStatus,

    /// Monotonic version, also the optimistic lock token
    pub version: i64,

    /// Free-form category (e.g. "b2c", "heavy")
    pub category: Option<String>,

    /// Forward or reverse shipments
    pub shipment_type: ShipmentType,

    /// Base prices per carrier/service and weight range
    pub base_rates: Vec<BaseRate>,

    /// Per-kg charges, pairwise non-overlapping
    pub weight_rules: Vec<WeightRule>,

    /// Zone pricing scheme
    pub scheme: PricingScheme,

    /// COD fee as a percentage of order value
    pub cod_percentage: Decimal,

    /// Floor for the COD fee
    pub cod_minimum_charge: Decimal,

    /// GST percentage
    pub gst: Decimal,

    /// Fuel surcharge percentage
    pub fuel_surcharge: Decimal,

    /// Floor for the freight total (before COD)
    pub minimum_fare: Decimal,

    /// Validity window (required before activation)
    pub effective_dates: Option<EffectiveDates>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl RateCard {
    /// Returns true if the card's window contains `at`
    pub fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        self.effective_dates.is_some_and(|d| d.contains(at))
    }

    /// Returns true if the card can price the carrier/service
    ///
    /// Service-scoped cards apply only to their own service. Company and
    /// global cards apply to every carrier/service they hold a base rate for.
    pub fn applies_to(&self, service_id: Option<Uuid>, carrier: &str, service_type: &str) -> bool {
        match self.scope {
            RateCardScope::Service {
                service_id: scoped,
            } => service_id == Some(scoped),
            RateCardScope::Company | RateCardScope::Global => self
                .base_rates
                .iter()
                .any(|r| r.serves(carrier, service_type)),
        }
    }

    /// Base rate for the carrier/service at `weight`
    pub fn base_rate_for(&self, carrier: &str, service_type: &str, weight: Decimal) -> Option<&BaseRate> {
        self.base_rates
            .iter()
            .find(|r| r.matches(carrier, service_type, weight))
    }

    /// The weight rule containing `weight` whose filter admits the carrier/service
    ///
    /// Rules never overlap on a valid card, so at most one contains `weight`.
    pub fn weight_rule_for(&self, carrier: &str, service_type: &str, weight: Decimal) -> Option<&WeightRule> {
        self.weight_rules
            .iter()
            .find(|r| r.range().contains(weight) && r.applies_to(carrier, service_type))
    }

    /// Which pricing scheme this card uses
    pub fn scheme_kind(&self) -> SchemeKind {
        self.scheme.kind()
    }

    /// Effective start, for resolution ordering
    pub fn effective_start(&self) -> Option<DateTime<Utc>> {
        self.effective_dates.map(|d| d.start)
    }
}

impl Default for RateCard {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            company_id: None,
            scope: RateCardScope::Company,
            name: String::new(),
            status: RateCardStatus::Draft,
            version: 1,
            category: None,
            shipment_type: ShipmentType::Forward,
            base_rates: Vec::new(),
            weight_rules: Vec::new(),
            scheme: PricingScheme::default(),
            cod_percentage: Decimal::ZERO,
            cod_minimum_charge: Decimal::ZERO,
            gst: Decimal::ZERO,
            fuel_surcharge: Decimal::ZERO,
            minimum_fare: Decimal::ZERO,
            effective_dates: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Active rate cards visible to one company, read at one instant
///
/// Quoting resolves every service of a shipment against the same snapshot
/// so a concurrent activation cannot mix card versions in one comparison.
#[derive(Debug, Clone)]
pub struct RateCardSnapshot {
    /// Company the snapshot was read for
    pub company_id: Uuid,

    /// Instant the snapshot is valid for
    pub as_of: DateTime<Utc>,

    /// Cards that loaded cleanly
    pub cards: Vec<RateCard>,

    /// Cards skipped at load time because their scheme is ambiguous
    pub quarantined: Vec<Uuid>,
}

impl RateCardSnapshot {
    pub fn new(company_id: Uuid, as_of: DateTime<Utc>, cards: Vec<RateCard>) -> Self {
        Self {
            company_id,
            as_of,
            cards,
            quarantined: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn base_rate(carrier: &str, min: Decimal, max: Decimal, price: Decimal) -> BaseRate {
        BaseRate {
            carrier: carrier.to_string(),
            service_type: "surface".to_string(),
            base_price: price,
            min_weight: min,
            max_weight: max,
        }
    }

    #[test]
    fn test_weight_range_is_half_open() {
        let range = WeightRange::new(dec!(1), dec!(2));
        assert!(range.contains(dec!(1)));
        assert!(range.contains(dec!(1.999)));
        assert!(!range.contains(dec!(2)));
        assert_eq!(range.to_string(), "[1, 2)");
    }

    #[test]
    fn test_effective_window() {
        let now = Utc::now();
        let card = RateCard {
            effective_dates: Some(EffectiveDates {
                start: now - Duration::hours(1),
                end: Some(now + Duration::hours(1)),
            }),
            ..Default::default()
        };

        assert!(card.is_effective_at(now));
        assert!(!card.is_effective_at(now + Duration::hours(1)));
        assert!(!card.is_effective_at(now - Duration::hours(2)));

        let undated = RateCard::default();
        assert!(!undated.is_effective_at(now));
    }

    #[test]
    fn test_base_rate_lookup() {
        let card = RateCard {
            base_rates: vec![
                base_rate("Delhivery", dec!(0), dec!(0.5), dec!(40)),
                base_rate("Delhivery", dec!(0.5), dec!(5), dec!(50)),
                base_rate("BlueDart", dec!(0), dec!(5), dec!(70)),
            ],
            ..Default::default()
        };

        let rate = card.base_rate_for("delhivery", "surface", dec!(1.2)).unwrap();
        assert_eq!(rate.base_price, dec!(50));
        assert!(card.base_rate_for("Delhivery", "surface", dec!(5)).is_none());
        assert!(card.applies_to(None, "BlueDart", "surface"));
        assert!(!card.applies_to(None, "Ekart", "surface"));
    }

    #[test]
    fn test_service_scope_applies_only_to_its_service() {
        let service_id = Uuid::from_u128(7);
        let card = RateCard {
            scope: RateCardScope::Service { service_id },
            ..Default::default()
        };

        assert!(card.applies_to(Some(service_id), "Any", "any"));
        assert!(!card.applies_to(Some(Uuid::from_u128(8)), "Any", "any"));
        assert!(!card.applies_to(None, "Any", "any"));
    }

    #[test]
    fn test_weight_rule_honours_filter() {
        let card = RateCard {
            weight_rules: vec![
                WeightRule {
                    min_weight: dec!(0),
                    max_weight: dec!(1),
                    price_per_kg: dec!(10),
                    carrier: None,
                    service_type: None,
                },
                WeightRule {
                    min_weight: dec!(1),
                    max_weight: dec!(2),
                    price_per_kg: dec!(14),
                    carrier: Some("BlueDart".to_string()),
                    service_type: Some("air".to_string()),
                },
            ],
            ..Default::default()
        };

        let rule = card.weight_rule_for("Delhivery", "surface", dec!(0.5)).unwrap();
        assert_eq!(rule.price_per_kg, dec!(10));

        let rule = card.weight_rule_for("bluedart", "AIR", dec!(1.5)).unwrap();
        assert_eq!(rule.price_per_kg, dec!(14));

        assert!(card.weight_rule_for("Delhivery", "surface", dec!(1.5)).is_none());
        assert!(card.weight_rule_for("BlueDart", "air", dec!(2)).is_none());
    }

    #[test]
    fn test_scope_rank_and_serde() {
        assert!(RateCardScope::Service { service_id: Uuid::nil() }.rank() < RateCardScope::Company.rank());
        assert!(RateCardScope::Company.rank() < RateCardScope::Global.rank());

        let value = serde_json::to_value(RateCardScope::Company).unwrap();
        assert_eq!(value["kind"], "company");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(RateCardStatus::parse("ACTIVE"), Some(RateCardStatus::Active));
        assert_eq!(RateCardStatus::parse("unknown"), None);
        assert_eq!(RateCardStatus::Expired.to_string(), "expired");
    }
}
