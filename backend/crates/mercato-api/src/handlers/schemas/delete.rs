use crate::handlers::error_response;
use crate::models::ApiResponse;
use actix_web::{web, HttpResponse};
use mercato_core::AppContext;
use serde_json::Value;
use std::sync::Arc;

/// DELETE /schemas/{modelName}
///
/// Succeeds whether or not the definition existed. Documents already stored
/// in the model's collection are kept.
pub async fn delete_schema_handler(
    app_context: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
) -> HttpResponse {
    let model_name = path.into_inner();
    match app_context.schema_registry().delete_schema(&model_name).await {
        Ok(()) => {
            ApiResponse::ok(Value::Null, format!("Schema '{}' deleted", model_name)).into_response()
        }
        Err(e) => error_response("Delete schema", e),
    }
}
