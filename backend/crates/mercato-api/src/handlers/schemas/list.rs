use crate::handlers::error_response;
use crate::models::ApiResponse;
use actix_web::{web, HttpResponse};
use mercato_core::AppContext;
use std::sync::Arc;

/// GET /schemas
pub async fn list_schemas_handler(app_context: web::Data<Arc<AppContext>>) -> HttpResponse {
    match app_context.schema_registry().list_schemas().await {
        Ok(definitions) => {
            let message = format!("{} schema(s)", definitions.len());
            ApiResponse::ok(definitions, message).into_response()
        }
        Err(e) => error_response("List schemas", e),
    }
}
