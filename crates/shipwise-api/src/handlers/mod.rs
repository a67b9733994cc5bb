//! HTTP request handlers

pub mod health;
pub mod quote;
pub mod rate_card;

use actix_web::web;

pub use health::health_check;
pub use quote::configure as configure_quotes;
pub use rate_card::configure as configure_rate_cards;

/// Mount every route under `/api/v1`
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            // Quoting and courier selection
            .configure(configure_quotes)
            // Rate card lifecycle
            .configure(configure_rate_cards),
    );
}
