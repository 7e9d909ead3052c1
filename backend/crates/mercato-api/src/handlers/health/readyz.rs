//! Readiness probe handler

use crate::models::ApiResponse;
use actix_web::http::StatusCode;
use actix_web::{web, Responder};
use mercato_core::AppContext;
use serde_json::json;
use std::sync::Arc;

/// GET /readyz
///
/// Ready while the schema registry is open. Reports the number of compiled
/// models and the cache counters.
pub async fn readyz_handler(app_context: web::Data<Arc<AppContext>>) -> impl Responder {
    if app_context.is_shut_down() {
        return ApiResponse::failure(
            StatusCode::SERVICE_UNAVAILABLE,
            "schema registry is shut down",
            Vec::new(),
        )
        .into_response();
    }

    let registry = app_context.schema_registry();
    ApiResponse::ok(
        json!({
            "status": "ready",
            "models": registry.cache().len(),
            "cache": registry.cache().stats(),
            "uptime_seconds": app_context.uptime_seconds(),
        }),
        "ready",
    )
    .into_response()
}
