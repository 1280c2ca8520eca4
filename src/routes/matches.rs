use actix_web::{web, HttpResponse};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::MatchError;
use crate::models::{
    BlockRequest, HealthResponse, ListMatchesQuery, PairingStatus, RecommendationsQuery,
    ScheduleDateRequest, SwipeRequest, VirtualDateStatusRequest,
};
use crate::routes::auth::AuthenticatedUser;
use crate::services::MatchService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MatchService>,
}

type HandlerResult = Result<HttpResponse, MatchError>;

/// Configure all match-related routes
///
/// Fixed segments are registered before `/matches/{id}` so they are not
/// captured as ids.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/swipe", web::post().to(swipe))
        .route("/matches", web::get().to(list_matches))
        .route("/matches/stats", web::get().to(match_stats))
        .route("/matches/recommendations", web::get().to(recommendations))
        .route("/matches/{id}", web::get().to(match_detail))
        .route("/matches/{id}/unmatch", web::post().to(unmatch))
        .route("/matches/{id}/schedule-date", web::post().to(schedule_date))
        .route("/matches/{id}/virtual-date/status", web::post().to(virtual_date_status))
        .route("/matches/{id}/messages", web::post().to(record_message))
        .route("/users/block", web::post().to(block_user));
}

fn validated<T: Validate>(value: &T) -> Result<(), MatchError> {
    value.validate().map_err(|errors| {
        tracing::info!("Validation failed: {}", errors);
        MatchError::Validation(errors.to_string())
    })
}

fn pairing_id(raw: &str) -> Result<Uuid, MatchError> {
    Uuid::parse_str(raw).map_err(|_| MatchError::Validation(format!("Invalid match id '{}'", raw)))
}

/// GET /api/v1/health
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = state.service.health_check().await.unwrap_or(false);
    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// POST /api/v1/matches/swipe
///
/// Request body:
/// ```json
/// { "userId": "string", "action": "like" | "super-like" | "pass" }
/// ```
async fn swipe(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<SwipeRequest>,
) -> HandlerResult {
    validated(&*req)?;

    let result = state.service.swipe(&user.id, &req.user_id, &req.action).await?;

    let message = if result.is_new_match {
        "It's a match!"
    } else {
        "Swipe recorded"
    };
    tracing::debug!("{} {} {}: {}", user.id, req.action, req.user_id, result.status.as_str());

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "result": result,
    })))
}

/// GET /api/v1/matches?status=matched&page=1&limit=20
///
/// `status=all` lists every status.
async fn list_matches(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<ListMatchesQuery>,
) -> HandlerResult {
    validated(&*query)?;

    let status = match query.status.as_str() {
        "all" => None,
        raw => Some(raw.parse::<PairingStatus>().map_err(MatchError::Validation)?),
    };

    let response = state
        .service
        .list_matches(&user.id, status, query.page, query.limit)
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v1/matches/stats
async fn match_stats(state: web::Data<AppState>, user: AuthenticatedUser) -> HandlerResult {
    let stats = state.service.match_stats(&user.id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// GET /api/v1/matches/recommendations?limit=10&excludeUserIds=a,b
async fn recommendations(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<RecommendationsQuery>,
) -> HandlerResult {
    let response = state
        .service
        .recommend(&user.id, query.exclude_ids(), query.limit.map(usize::from))
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v1/matches/{id}
async fn match_detail(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> HandlerResult {
    let id = pairing_id(&path)?;
    let view = state.service.get_pairing_detail(id, &user.id).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// POST /api/v1/matches/{id}/unmatch
async fn unmatch(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> HandlerResult {
    let id = pairing_id(&path)?;
    state.service.unmatch(id, &user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Unmatched successfully" })))
}

/// POST /api/v1/matches/{id}/schedule-date
async fn schedule_date(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<ScheduleDateRequest>,
) -> HandlerResult {
    let id = pairing_id(&path)?;
    validated(&*req)?;
    let scheduled_at = req
        .scheduled_at
        .ok_or_else(|| MatchError::Validation("scheduledAt is required".to_string()))?;

    let view = state
        .service
        .schedule_virtual_date(id, &user.id, scheduled_at, &req.activity)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Virtual date scheduled successfully!",
        "match": view,
    })))
}

/// POST /api/v1/matches/{id}/virtual-date/status
async fn virtual_date_status(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    req: web::Json<VirtualDateStatusRequest>,
) -> HandlerResult {
    let id = pairing_id(&path)?;
    let view = state
        .service
        .update_virtual_date_status(id, &user.id, req.status)
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// POST /api/v1/matches/{id}/messages
async fn record_message(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> HandlerResult {
    let id = pairing_id(&path)?;
    let view = state.service.record_message(id, &user.id).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// POST /api/v1/users/block
async fn block_user(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<BlockRequest>,
) -> HandlerResult {
    validated(&*req)?;
    let removed = state.service.block_user(&user.id, &req.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "User blocked",
        "removedPairing": removed,
    })))
}
