use crate::handlers::error_response;
use crate::models::ApiResponse;
use actix_web::{web, HttpResponse};
use mercato_core::AppContext;
use std::sync::Arc;

/// GET /schemas/{modelName}
pub async fn get_schema_handler(
    app_context: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
) -> HttpResponse {
    let model_name = path.into_inner();
    match app_context.schema_registry().get_schema(&model_name).await {
        Ok(definition) => ApiResponse::ok(definition, "ok").into_response(),
        Err(e) => error_response("Get schema", e),
    }
}
