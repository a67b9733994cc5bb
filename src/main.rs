//! Shipwise rate engine server
//!
//! Serves quoting, courier selection and rate card lifecycle over HTTP,
//! backed by PostgreSQL.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use shipwise_api::{configure_api, AppState};
use shipwise_core::AppConfig;
use shipwise_db::{
    create_pool, run_migrations, PgAuditSink, PgCourierServiceRepository, PgRateCardRepository,
    PgSellerPolicyRepository,
};
use shipwise_services::{LifecycleManager, QuoteService, SelectionService};
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
///
/// `LOG_FORMAT=json` switches to structured output.
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "shipwise_rates={},shipwise_api={},shipwise_services={},shipwise_db={},actix_web=info,sqlx=warn",
            log_level, log_level, log_level, log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    if env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!(
        "Starting Shipwise rate engine v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = AppConfig::load().context("Failed to load configuration")?;

    info!("Connecting to database...");
    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;
    run_migrations(&pool)
        .await
        .context("Failed to apply migrations")?;

    let rate_cards = Arc::new(PgRateCardRepository::new(pool.clone()));
    let state = AppState {
        quotes: Arc::new(QuoteService::new(
            Arc::new(PgCourierServiceRepository::new(pool.clone())),
            rate_cards.clone(),
            config.pricing.clone(),
        )),
        selection: Arc::new(SelectionService::new(
            Arc::new(PgSellerPolicyRepository::new(pool.clone())),
            config.pricing.clone(),
        )),
        lifecycle: Arc::new(LifecycleManager::new(
            rate_cards,
            Arc::new(PgAuditSink::new(pool)),
        )),
    };

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    let cors_origins = config.server.cors_origins.clone();
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        let cors_origins_inner = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let Ok(origin_str) = origin.to_str() else {
                    return false;
                };
                cors_origins_inner
                    .split(',')
                    .any(|o| o.trim() == origin_str)
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "OPTIONS"])
            .allowed_headers(vec![
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::HeaderName::from_static("x-actor"),
            ])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_query",
                        "message": error_message,
                        "status": 400
                    })),
                )
                .into()
            }))
            .app_data(web::JsonConfig::default().limit(2 * 1024 * 1024).error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_json",
                        "message": error_message,
                        "status": 400
                    })),
                )
                .into()
            }))
            // Middleware
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_api)
            // Root redirect to health
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
