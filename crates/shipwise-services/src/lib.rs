//! Business logic services for the Shipwise rate engine
//!
//! This crate contains the rate computation and courier selection engine
//! plus the rate card lifecycle operations around it.
//!
//! # Architecture
//!
//! Pricing and selection are pure functions over loaded data; the services
//! wrap them with repository access:
//! - Each service owns its dependencies as `Arc<dyn Trait>` handles
//! - One rate card snapshot is read per quoting request
//! - All operations are instrumented with tracing
//! - Comprehensive error handling with AppError
//!
//! # Modules
//!
//! - `slab` - Weight slab and rate card validation
//! - `resolver` - Picks the rate card that prices a courier service
//! - `pricing` - Evaluators for the three zone pricing schemes
//! - `charges` - GST, fuel, minimum fare and COD on top of the scheme charges
//! - `collector` - `QuoteService`, one quote per courier service
//! - `selection` - Seller policy filters and ranking strategies
//! - `lifecycle` - Versioned, audited rate card mutations

pub mod charges;
pub mod collector;
pub mod lifecycle;
pub mod pricing;
pub mod resolver;
pub mod selection;
pub mod slab;

pub use charges::{aggregate, Overheads};
pub use collector::QuoteService;
pub use lifecycle::{
    AdjustmentDirection, BulkFailure, BulkResult, BulkSuccess, LifecycleManager, PriceAdjustment,
};
pub use pricing::{evaluate, EvaluatedCharges, PricingContext, SchemeEvaluator};
pub use resolver::{resolve_rate_card, RateQuery};
pub use selection::{
    select, ExcludedQuote, ExclusionReason, RankedQuote, RankingStrategy, SelectionOutcome,
    SelectionResult, SelectionService,
};
pub use slab::{
    ensure_valid, validate_coverage, validate_non_overlapping, validate_rate_card,
    ValidationIssue, ValidationResult,
};

/// Business logic constants
pub mod constants {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Actor recorded when the caller does not identify itself
    pub const DEFAULT_ACTOR: &str = "system";

    /// Suffix appended to the name of a cloned rate card
    pub const CLONE_NAME_SUFFIX: &str = " (Copy)";

    /// Smallest bulk price adjustment, in percent
    pub const MIN_BULK_ADJUSTMENT_PERCENT: Decimal = dec!(1);

    /// Largest bulk price adjustment, in percent
    pub const MAX_BULK_ADJUSTMENT_PERCENT: Decimal = dec!(100);

    /// Largest number of shipments quoted in one bulk request
    pub const MAX_BULK_SHIPMENTS: usize = 500;
}
