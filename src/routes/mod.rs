// Route exports
pub mod auth;
pub mod matches;

use actix_web::{error, web, HttpRequest};

use crate::error::MatchError;

pub use auth::{AuthenticatedUser, Claims, JwtVerifier};
pub use matches::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure),
    );
}

/// Malformed JSON bodies get the same error shape as domain failures
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    MatchError::Validation(format!("Invalid JSON: {}", err)).into()
}

pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    MatchError::Validation(format!("Invalid query: {}", err)).into()
}
