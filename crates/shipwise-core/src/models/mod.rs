//! Domain models for the Shipwise rate engine
//!
//! This module contains all the core domain models used throughout the engine.

pub mod audit;
pub mod courier;
pub mod policy;
pub mod quote;
pub mod rate_card;
pub mod scheme;
pub mod shipment;
pub mod zone;

pub use audit::{LifecycleAction, VersionHistoryBuilder, VersionHistoryEntry};
pub use courier::{CourierService, ServiceConstraints, ServiceStatus, Sla};
pub use policy::{AutoPriority, SelectionMode, SellerCourierPolicy};
pub use quote::{ChargeBreakdown, EtaDays, IneligibleReason, PricingNote, Quote, QuoteSet};
pub use rate_card::{
    BaseRate, EffectiveDates, RateCard, RateCardScope, RateCardSnapshot, RateCardStatus,
    WeightRange, WeightRule, WeightSlab,
};
pub use scheme::{
    BandSlab, BandedSlabTable, LegacySchemeFields, PricingScheme, RoundingMode, SchemeKind,
    SlabCalculation, ZoneBand, ZoneRule,
};
pub use shipment::{PaymentMode, Shipment, ShipmentType};
pub use zone::Zone;
