//! HTTP request handlers
//!
//! - `health`: liveness and readiness probes
//! - `schemas`: schema administration (`/schemas`)
//! - `documents`: CRUD on dynamic models (`/{modelName}`)

pub mod documents;
pub mod health;
pub mod schemas;

use crate::models::ApiResponse;
use actix_web::HttpResponse;
use mercato_core::MercatoError;

/// Envelope for a failed operation. Server-side failures are logged as errors.
pub(crate) fn error_response(operation: &str, err: MercatoError) -> HttpResponse {
    let response = ApiResponse::from_error(&err);
    if response.status().is_server_error() {
        log::error!("{} failed: {}", operation, err);
    } else {
        log::debug!("{} rejected: {}", operation, err);
    }
    response.into_response()
}
