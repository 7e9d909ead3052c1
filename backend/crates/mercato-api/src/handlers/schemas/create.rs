use crate::handlers::error_response;
use crate::models::{ApiResponse, CreateSchemaRequest};
use actix_web::{web, HttpResponse};
use mercato_core::AppContext;
use std::sync::Arc;

/// POST /schemas
///
/// Body: `{"modelName": "Widget", "fields": {...}, "options": {...}}`
pub async fn create_schema_handler(
    app_context: web::Data<Arc<AppContext>>,
    body: web::Json<CreateSchemaRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    let registry = app_context.schema_registry();
    match registry
        .create_schema(&request.model_name, &request.fields, &request.options)
        .await
    {
        Ok(definition) => {
            let message = format!("Schema '{}' created", definition.model_name);
            ApiResponse::ok(definition, message).into_response()
        }
        Err(e) => error_response("Create schema", e),
    }
}
