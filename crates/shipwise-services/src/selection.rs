//! Courier selection
//!
//! Applies a seller's courier policy to a quote set: block lists, allow
//! lists, eligibility, then ranking by the policy's priority. The selection
//! mode decides whether the result is a plain list, a list with a
//! recommendation, or a binding automatic choice.
//!
//! An empty result is reported as [`SelectionOutcome::NoEligibleCourier`],
//! not as an error.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shipwise_core::{
    config::PricingConfig,
    models::{AutoPriority, Quote, SelectionMode, SellerCourierPolicy},
    money::percent_factor,
    traits::SellerPolicyRepository,
    AppResult,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// A quote with its position in the ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedQuote {
    /// 1 = best
    pub rank: usize,
    pub recommended: bool,
    pub quote: Quote,
}

/// Why a quote was removed before ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    ServiceBlocked,
    ProviderBlocked,
    NotInAllowList,
    Ineligible,
    EstimatedPrice,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExclusionReason::ServiceBlocked => "service_blocked",
            ExclusionReason::ProviderBlocked => "provider_blocked",
            ExclusionReason::NotInAllowList => "not_in_allow_list",
            ExclusionReason::Ineligible => "ineligible",
            ExclusionReason::EstimatedPrice => "estimated_price",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedQuote {
    pub service_id: Uuid,
    pub carrier: String,
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOutcome {
    /// Ranked list, the seller picks
    ManualChoice,
    /// Ranked list with rank 1 flagged
    Recommended,
    /// Rank 1 is the binding choice
    AutoSelected,
    NoEligibleCourier,
}

/// Result of applying a policy to a quote set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub seller_id: Uuid,
    pub mode: SelectionMode,
    pub priority: AutoPriority,
    pub strategy: String,
    pub outcome: SelectionOutcome,
    pub ranked: Vec<RankedQuote>,
    /// Set only in `auto` mode
    pub selected: Option<RankedQuote>,
    pub excluded: Vec<ExcludedQuote>,
    pub decided_at: DateTime<Utc>,
}

/// Orders eligible quotes, best first
pub trait RankingStrategy: Send + Sync + fmt::Debug {
    fn rank(&self, quotes: Vec<Quote>) -> Vec<Quote>;

    fn name(&self) -> &'static str;
}

fn price_key(q: &Quote) -> (Decimal, u32, Uuid) {
    (q.total, q.eta_days.max, q.service_id)
}

fn speed_key(q: &Quote) -> (u32, Decimal, Uuid) {
    (q.eta_days.max, q.total, q.service_id)
}

/// Cheapest first
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceFirst;

impl RankingStrategy for PriceFirst {
    fn rank(&self, mut quotes: Vec<Quote>) -> Vec<Quote> {
        quotes.sort_by_key(price_key);
        quotes
    }

    fn name(&self) -> &'static str {
        "price"
    }
}

/// Fastest first
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedFirst;

impl RankingStrategy for SpeedFirst {
    fn rank(&self, mut quotes: Vec<Quote>) -> Vec<Quote> {
        quotes.sort_by_key(speed_key);
        quotes
    }

    fn name(&self) -> &'static str {
        "speed"
    }
}

/// Fastest among the quotes within `delta_percent` of the cheapest
///
/// Quotes inside the band come first in speed order, the rest follow in
/// price order.
#[derive(Debug, Clone, Copy)]
pub struct Balanced {
    pub delta_percent: Decimal,
}

impl RankingStrategy for Balanced {
    fn rank(&self, quotes: Vec<Quote>) -> Vec<Quote> {
        let Some(cheapest) = quotes.iter().map(|q| q.total).min() else {
            return quotes;
        };
        let threshold = cheapest * percent_factor(self.delta_percent);

        let (mut band, mut rest): (Vec<_>, Vec<_>) =
            quotes.into_iter().partition(|q| q.total <= threshold);
        debug!(
            "Balanced threshold {}: {} in band, {} outside",
            threshold,
            band.len(),
            rest.len()
        );

        band.sort_by_key(speed_key);
        rest.sort_by_key(price_key);
        band.extend(rest);
        band
    }

    fn name(&self) -> &'static str {
        "balanced"
    }
}

/// Strategy for a policy's priority
pub fn strategy_for(priority: AutoPriority, delta_percent: Decimal) -> Box<dyn RankingStrategy> {
    match priority {
        AutoPriority::Price => Box::new(PriceFirst),
        AutoPriority::Speed => Box::new(SpeedFirst),
        AutoPriority::Balanced => Box::new(Balanced { delta_percent }),
    }
}

fn exclusion(policy: &SellerCourierPolicy, quote: &Quote) -> Option<ExclusionReason> {
    let provider_blocked = SellerCourierPolicy::provider_in(&policy.blocked_providers, &quote.carrier);
    let service_allowed = policy.allowed_service_ids.contains(&quote.service_id);

    if policy.blocked_service_ids.contains(&quote.service_id) {
        return Some(ExclusionReason::ServiceBlocked);
    }
    if provider_blocked && !service_allowed {
        return Some(ExclusionReason::ProviderBlocked);
    }
    if policy.has_allow_list()
        && !service_allowed
        && !SellerCourierPolicy::provider_in(&policy.allowed_providers, &quote.carrier)
    {
        return Some(ExclusionReason::NotInAllowList);
    }
    if !quote.eligible {
        return Some(ExclusionReason::Ineligible);
    }
    if policy.selection_mode == SelectionMode::Auto && quote.estimated {
        return Some(ExclusionReason::EstimatedPrice);
    }
    None
}

/// Apply a policy to quotes
pub fn select(policy: &SellerCourierPolicy, quotes: &[Quote]) -> SelectionResult {
    let strategy = strategy_for(policy.auto_priority, policy.balanced_delta_percent);

    let mut kept = Vec::with_capacity(quotes.len());
    let mut excluded = Vec::new();
    for quote in quotes {
        match exclusion(policy, quote) {
            Some(reason) => excluded.push(ExcludedQuote {
                service_id: quote.service_id,
                carrier: quote.carrier.clone(),
                reason,
            }),
            None => kept.push(quote.clone()),
        }
    }

    let mut ranked: Vec<RankedQuote> = strategy
        .rank(kept)
        .into_iter()
        .enumerate()
        .map(|(i, quote)| RankedQuote {
            rank: i + 1,
            recommended: false,
            quote,
        })
        .collect();

    let mut selected = None;
    let outcome = if ranked.is_empty() {
        SelectionOutcome::NoEligibleCourier
    } else {
        match policy.selection_mode {
            SelectionMode::ManualOnly => SelectionOutcome::ManualChoice,
            SelectionMode::ManualWithRecommendation => {
                ranked[0].recommended = true;
                SelectionOutcome::Recommended
            }
            SelectionMode::Auto => {
                ranked.truncate(1);
                ranked[0].recommended = true;
                selected = Some(ranked[0].clone());
                SelectionOutcome::AutoSelected
            }
        }
    };

    SelectionResult {
        seller_id: policy.seller_id,
        mode: policy.selection_mode,
        priority: policy.auto_priority,
        strategy: strategy.name().to_string(),
        outcome,
        ranked,
        selected,
        excluded,
        decided_at: Utc::now(),
    }
}

/// Selection backed by stored seller policies
pub struct SelectionService {
    policies: Arc<dyn SellerPolicyRepository>,
    defaults: PricingConfig,
}

impl SelectionService {
    pub fn new(policies: Arc<dyn SellerPolicyRepository>, defaults: PricingConfig) -> Self {
        Self { policies, defaults }
    }

    /// Seller's active policy, or the configured default
    pub async fn effective_policy(&self, seller_id: Uuid) -> AppResult<SellerCourierPolicy> {
        match self.policies.find_by_seller(seller_id).await? {
            Some(policy) if policy.is_active => Ok(policy),
            _ => {
                debug!("No active policy for seller {}, using defaults", seller_id);
                Ok(SellerCourierPolicy::fallback(
                    seller_id,
                    self.defaults.default_selection_mode,
                    self.defaults.default_auto_priority,
                    self.defaults.default_balanced_delta_percent,
                ))
            }
        }
    }

    /// Rank quotes for a seller
    #[instrument(skip(self, quotes), fields(quotes = quotes.len()))]
    pub async fn select_courier(
        &self,
        seller_id: Uuid,
        quotes: &[Quote],
    ) -> AppResult<SelectionResult> {
        let policy = self.effective_policy(seller_id).await?;
        let result = select(&policy, quotes);

        info!(
            outcome = ?result.outcome,
            strategy = %result.strategy,
            "Selection for seller {}: {} ranked, {} excluded",
            seller_id,
            result.ranked.len(),
            result.excluded.len()
        );
        Ok(result)
    }
}
