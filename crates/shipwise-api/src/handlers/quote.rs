//! Quote and courier selection handlers

use crate::dto::quote::{BulkQuoteRequest, QuoteRequest, SelectRequest};
use crate::dto::ApiResponse;
use crate::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use shipwise_core::AppError;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Quote every active courier service for one shipment
///
/// POST /api/v1/quotes
#[instrument(skip(state, req), fields(seller_id = %req.seller_id))]
pub async fn compute_quotes(
    state: web::Data<AppState>,
    req: web::Json<QuoteRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Quote request validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let req = req.into_inner();
    let as_of = req.as_of.unwrap_or_else(Utc::now);
    let set = state
        .quotes
        .compute_quotes(&req.shipment, req.seller_id, as_of)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(set)))
}

/// Quote many shipments in one call
///
/// POST /api/v1/quotes/bulk
#[instrument(skip(state, req), fields(seller_id = %req.seller_id, count = req.shipments.len()))]
pub async fn compute_quotes_bulk(
    state: web::Data<AppState>,
    req: web::Json<BulkQuoteRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Bulk quote validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let req = req.into_inner();
    let as_of = req.as_of.unwrap_or_else(Utc::now);
    let sets = state
        .quotes
        .compute_quotes_bulk(&req.shipments, req.seller_id, as_of)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(sets)))
}

/// Rank quotes against the seller's courier policy
///
/// POST /api/v1/quotes/select
///
/// Accepts precomputed quotes, or a shipment which is quoted first.
#[instrument(skip(state, req), fields(seller_id = %req.seller_id))]
pub async fn select_courier(
    state: web::Data<AppState>,
    req: web::Json<SelectRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Select request validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let req = req.into_inner();
    let quotes = match (req.quotes, req.shipment) {
        (Some(quotes), _) => quotes,
        (None, Some(shipment)) => {
            debug!("Quoting shipment before selection");
            let as_of = req.as_of.unwrap_or_else(Utc::now);
            state
                .quotes
                .compute_quotes(&shipment, req.seller_id, as_of)
                .await?
                .quotes
        }
        (None, None) => {
            return Err(AppError::InvalidInput(
                "Either quotes or shipment is required".to_string(),
            ))
        }
    };

    let result = state.selection.select_courier(req.seller_id, &quotes).await?;
    info!(outcome = ?result.outcome, "Courier selection done");

    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}

/// Configure quote routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/quotes")
            .route("", web::post().to(compute_quotes))
            .route("/bulk", web::post().to(compute_quotes_bulk))
            .route("/select", web::post().to(select_courier)),
    );
}
