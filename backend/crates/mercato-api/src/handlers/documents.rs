//! Dynamic document handlers
//!
//! ## Endpoints
//! - GET /{modelName}?limit=N - list documents
//! - POST /{modelName} - create a document
//! - GET /{modelName}/{id} - read one document
//! - PUT /{modelName}/{id} - update a document
//! - DELETE /{modelName}/{id} - delete a document
//!
//! Each request resolves its model through the schema registry, which serves
//! the cached handle or compiles one from the persisted definition.

use crate::handlers::error_response;
use crate::models::{ApiResponse, ListQuery};
use actix_web::{web, HttpResponse};
use mercato_core::AppContext;
use serde_json::Value;
use std::sync::Arc;

/// GET /{modelName}
pub async fn list_documents_handler(
    app_context: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> HttpResponse {
    let model_name = path.into_inner();
    let limits = &app_context.config().limits;
    let limit = query.effective_limit(limits.default_query_limit, limits.max_query_limit);

    let model = match app_context.schema_registry().model(&model_name).await {
        Ok(model) => model,
        Err(e) => return error_response("List documents", e),
    };
    match model.find_all(Some(limit)).await {
        Ok(documents) => {
            let message = format!("{} document(s)", documents.len());
            ApiResponse::ok(documents, message).into_response()
        }
        Err(e) => error_response("List documents", e),
    }
}

/// POST /{modelName}
pub async fn create_document_handler(
    app_context: web::Data<Arc<AppContext>>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> HttpResponse {
    let model_name = path.into_inner();
    let model = match app_context.schema_registry().model(&model_name).await {
        Ok(model) => model,
        Err(e) => return error_response("Create document", e),
    };
    match model.create(body.into_inner()).await {
        Ok(document) => {
            ApiResponse::ok(document, format!("{} created", model.model_name())).into_response()
        }
        Err(e) => error_response("Create document", e),
    }
}

/// GET /{modelName}/{id}
pub async fn get_document_handler(
    app_context: web::Data<Arc<AppContext>>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (model_name, id) = path.into_inner();
    let model = match app_context.schema_registry().model(&model_name).await {
        Ok(model) => model,
        Err(e) => return error_response("Get document", e),
    };
    match model.find_by_id(&id).await {
        Ok(document) => ApiResponse::ok(document, "ok").into_response(),
        Err(e) => error_response("Get document", e),
    }
}

/// PUT /{modelName}/{id}
pub async fn update_document_handler(
    app_context: web::Data<Arc<AppContext>>,
    path: web::Path<(String, String)>,
    body: web::Json<Value>,
) -> HttpResponse {
    let (model_name, id) = path.into_inner();
    let model = match app_context.schema_registry().model(&model_name).await {
        Ok(model) => model,
        Err(e) => return error_response("Update document", e),
    };
    match model.update_by_id(&id, body.into_inner()).await {
        Ok(document) => {
            ApiResponse::ok(document, format!("{} updated", model.model_name())).into_response()
        }
        Err(e) => error_response("Update document", e),
    }
}

/// DELETE /{modelName}/{id}
pub async fn delete_document_handler(
    app_context: web::Data<Arc<AppContext>>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (model_name, id) = path.into_inner();
    let model = match app_context.schema_registry().model(&model_name).await {
        Ok(model) => model,
        Err(e) => return error_response("Delete document", e),
    };
    match model.delete_by_id(&id).await {
        Ok(document) => {
            ApiResponse::ok(document, format!("{} deleted", model.model_name())).into_response()
        }
        Err(e) => error_response("Delete document", e),
    }
}
