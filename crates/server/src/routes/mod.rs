//! API route handlers
//!
//! - `health`: liveness, readiness, and Prometheus metrics
//! - `homologate`: vehicle homologation queries and catalog statistics

pub mod health;
pub mod homologate;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info (GET /, no authentication)
///
/// ```json
/// {
///   "name": "Homologador Server",
///   "version": "0.1.0",
///   "api_version": "v1",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Homologador Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/homologate",
            "/api/v1/homologate/flat",
            "/api/v1/catalog/stats",
            "/homologar",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
