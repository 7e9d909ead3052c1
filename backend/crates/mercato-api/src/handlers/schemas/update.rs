use crate::handlers::error_response;
use crate::models::{ApiResponse, UpdateSchemaRequest};
use actix_web::{web, HttpResponse};
use mercato_core::AppContext;
use std::sync::Arc;

/// PUT /schemas/{modelName}
///
/// Body: `{"fields": {...}, "options": {...}, "modelName": "NewName"}`; a
/// `modelName` different from the path renames the model.
pub async fn update_schema_handler(
    app_context: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
    body: web::Json<UpdateSchemaRequest>,
) -> HttpResponse {
    let current = path.into_inner();
    let request = body.into_inner();
    let registry = app_context.schema_registry();
    match registry
        .update_schema(
            &current,
            &request.fields,
            &request.options,
            request.model_name.as_deref(),
        )
        .await
    {
        Ok(definition) => {
            let message = if definition.model_name.as_str() == current {
                format!("Schema '{}' updated", current)
            } else {
                format!("Schema '{}' renamed to '{}'", current, definition.model_name)
            };
            ApiResponse::ok(definition, message).into_response()
        }
        Err(e) => error_response("Update schema", e),
    }
}
