//! Rate card handlers
//!
//! HTTP handlers for rate card lifecycle endpoints. Every mutation is
//! attributed to the caller named in the `X-Actor` header.

use crate::dto::rate_card::{
    BulkAdjustRequest, CloneRequest, RateCardRequest, RateCardResponse, RateCardReviseRequest,
};
use crate::dto::{Actor, ApiResponse, PaginationParams};
use crate::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use shipwise_core::AppError;
use shipwise_services::validate_rate_card;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Create a rate card draft
///
/// POST /api/v1/rate-cards
#[instrument(skip(state, actor, req), fields(actor = %actor.as_str()))]
pub async fn create_rate_card(
    state: web::Data<AppState>,
    actor: Actor,
    req: web::Json<RateCardRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Rate card creation validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let card = req.into_inner().into_rate_card(Uuid::nil());
    let created = state.lifecycle.create(card, actor.as_str()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        RateCardResponse::from(created),
        "Rate card draft created",
    )))
}

/// Check a rate card without storing it
///
/// POST /api/v1/rate-cards/validate
#[instrument(skip(req))]
pub async fn validate_rate_card_request(
    req: web::Json<RateCardRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Rate card validation request malformed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let card = req.into_inner().into_rate_card(Uuid::nil());
    let result = validate_rate_card(&card);
    debug!(
        valid = result.valid,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        "Validated rate card"
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}

/// GET /api/v1/rate-cards/{id}
#[instrument(skip(state))]
pub async fn get_rate_card(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let card = state.lifecycle.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(RateCardResponse::from(card))))
}

/// Replace a card's content
///
/// PUT /api/v1/rate-cards/{id}
#[instrument(skip(state, actor, req), fields(actor = %actor.as_str()))]
pub async fn revise_rate_card(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
    req: web::Json<RateCardReviseRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Rate card revision validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let req = req.into_inner();
    let card = req.card.into_rate_card(path.into_inner());
    let revised = state
        .lifecycle
        .revise(card, req.expected_version, actor.as_str())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        RateCardResponse::from(revised),
        "Rate card revised",
    )))
}

/// POST /api/v1/rate-cards/{id}/activate
#[instrument(skip(state, actor), fields(actor = %actor.as_str()))]
pub async fn activate_rate_card(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let card = state
        .lifecycle
        .activate(path.into_inner(), actor.as_str())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(RateCardResponse::from(card))))
}

/// POST /api/v1/rate-cards/{id}/deactivate
#[instrument(skip(state, actor), fields(actor = %actor.as_str()))]
pub async fn deactivate_rate_card(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let card = state
        .lifecycle
        .deactivate(path.into_inner(), actor.as_str())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(RateCardResponse::from(card))))
}

/// Copy a card into a new draft
///
/// POST /api/v1/rate-cards/{id}/clone
#[instrument(skip(state, actor, req), fields(actor = %actor.as_str()))]
pub async fn clone_rate_card(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
    req: Option<web::Json<CloneRequest>>,
) -> Result<HttpResponse, AppError> {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    req.validate().map_err(|e| {
        warn!("Clone request validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let copy = state
        .lifecycle
        .clone_card(path.into_inner(), req.name, actor.as_str())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        RateCardResponse::from(copy),
        "Rate card cloned",
    )))
}

/// GET /api/v1/rate-cards/{id}/history
#[instrument(skip(state))]
pub async fn rate_card_history(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let history = state.lifecycle.history(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(history)))
}

/// Expire every active card whose window has closed
///
/// POST /api/v1/rate-cards/expire-lapsed
#[instrument(skip(state, actor), fields(actor = %actor.as_str()))]
pub async fn expire_lapsed_rate_cards(
    state: web::Data<AppState>,
    actor: Actor,
) -> Result<HttpResponse, AppError> {
    let result = state
        .lifecycle
        .expire_lapsed(Utc::now(), actor.as_str())
        .await?;

    info!(
        expired = result.succeeded.len(),
        failed = result.failed.len(),
        "Expired lapsed rate cards"
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}

/// List a company's rate cards
///
/// GET /api/v1/companies/{company_id}/rate-cards
#[instrument(skip(state, query))]
pub async fn list_company_rate_cards(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let page = state
        .lifecycle
        .list(path.into_inner(), &query.to_pagination())
        .await?;

    let response = query.paginate(
        page.data.into_iter().map(RateCardResponse::from).collect(),
        page.pagination.total,
    );
    Ok(HttpResponse::Ok().json(response))
}

/// Scale prices on many cards of one company
///
/// POST /api/v1/companies/{company_id}/rate-cards/bulk-adjust
#[instrument(skip(state, actor, req), fields(actor = %actor.as_str()))]
pub async fn bulk_adjust_prices(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
    req: web::Json<BulkAdjustRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Bulk adjust validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let result = state
        .lifecycle
        .bulk_adjust_price(
            path.into_inner(),
            &req.rate_card_ids,
            req.adjustment(),
            actor.as_str(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}

/// Configure rate card routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rate-cards")
            .route("", web::post().to(create_rate_card))
            .route("/validate", web::post().to(validate_rate_card_request))
            .route("/expire-lapsed", web::post().to(expire_lapsed_rate_cards))
            .route("/{id}", web::get().to(get_rate_card))
            .route("/{id}", web::put().to(revise_rate_card))
            .route("/{id}/activate", web::post().to(activate_rate_card))
            .route("/{id}/deactivate", web::post().to(deactivate_rate_card))
            .route("/{id}/clone", web::post().to(clone_rate_card))
            .route("/{id}/history", web::get().to(rate_card_history)),
    )
    .service(
        web::scope("/companies/{company_id}/rate-cards")
            .route("", web::get().to(list_company_rate_cards))
            .route("/bulk-adjust", web::post().to(bulk_adjust_prices)),
    );
}
