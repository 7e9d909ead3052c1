//! Liveness probe handler

use crate::models::ApiResponse;
use actix_web::{HttpResponse, Responder};
use serde_json::json;

/// GET /healthz
///
/// Returns 200 whenever the process is serving requests.
pub async fn healthz_handler() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::ok(
        json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
        }),
        "ok",
    ))
}
