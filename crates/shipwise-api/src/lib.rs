//! API layer for the Shipwise rate engine
//!
//! HTTP handlers for quoting, courier selection and rate card lifecycle.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod dto;
pub mod handlers;

use shipwise_services::{LifecycleManager, QuoteService, SelectionService};
use std::sync::Arc;

pub use dto::{Actor, ApiResponse, PaginationParams, ACTOR_HEADER};
pub use handlers::{configure_api, configure_quotes, configure_rate_cards, health_check};

/// Services shared by every handler, registered as `web::Data<AppState>`
#[derive(Clone)]
pub struct AppState {
    pub quotes: Arc<QuoteService>,
    pub selection: Arc<SelectionService>,
    pub lifecycle: Arc<LifecycleManager>,
}
