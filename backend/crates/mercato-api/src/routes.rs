//! API routes configuration
//!
//! Fixed paths are registered before the dynamic `/{modelName}` catch-all,
//! so `/schemas` and the probes are never treated as model names.

use crate::handlers::{documents, health, schemas};
use crate::models::{ApiResponse, ErrorDetail};
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::web;

/// Configure API routes for Mercato
///
/// - GET /healthz, GET /readyz
/// - GET|POST /schemas, GET|PUT|DELETE /schemas/{modelName}
/// - GET|POST /{modelName}, GET|PUT|DELETE /{modelName}/{id}
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthz", web::get().to(health::healthz_handler))
        .route("/readyz", web::get().to(health::readyz_handler))
        .service(
            web::resource("/schemas")
                .route(web::get().to(schemas::list_schemas_handler))
                .route(web::post().to(schemas::create_schema_handler)),
        )
        .service(
            web::resource("/schemas/{model_name}")
                .route(web::get().to(schemas::get_schema_handler))
                .route(web::put().to(schemas::update_schema_handler))
                .route(web::delete().to(schemas::delete_schema_handler)),
        )
        .service(
            web::resource("/{model_name}")
                .route(web::get().to(documents::list_documents_handler))
                .route(web::post().to(documents::create_document_handler)),
        )
        .service(
            web::resource("/{model_name}/{id}")
                .route(web::get().to(documents::get_document_handler))
                .route(web::put().to(documents::update_document_handler))
                .route(web::delete().to(documents::delete_document_handler)),
        );
}

/// JSON body settings: size limit plus enveloped 400s for unreadable bodies.
pub fn json_config(max_body_size: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(max_body_size)
        .error_handler(|err, _req| {
            let response = ApiResponse::failure(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", err),
                vec![ErrorDetail {
                    path: "body".to_string(),
                    message: err.to_string(),
                }],
            );
            InternalError::from_response(err, response.into_response()).into()
        })
}

/// Enveloped 400s for malformed query strings.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = ApiResponse::failure(
            StatusCode::BAD_REQUEST,
            format!("Invalid query string: {}", err),
            Vec::new(),
        );
        InternalError::from_response(err, response.into_response()).into()
    })
}
