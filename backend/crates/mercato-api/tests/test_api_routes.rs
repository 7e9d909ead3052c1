//! End-to-end HTTP tests for schema administration and dynamic documents.

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use mercato_api::models::ApiResponse;
use mercato_api::routes::{configure_routes, json_config, query_config};
use mercato_core::test_helpers::{test_app_context, test_app_context_with};
use mercato_core::AppContext;
use mercato_store::test_utils::memory_backend;
use mercato_store::{Partition, StorageBackend};
use serde_json::{json, Value};
use std::sync::Arc;

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::clone(&$ctx)))
                .app_data(json_config(1024 * 1024))
                .app_data(query_config())
                .configure(configure_routes),
        )
        .await
    };
}

async fn create_widget_schema(ctx: &Arc<AppContext>) {
    ctx.schema_registry()
        .create_schema(
            "Widget",
            &json!({"name": {"type": "string", "required": true}, "qty": "number"}),
            &json!({"timestamps": true}),
        )
        .await
        .unwrap();
}

#[actix_web::test]
async fn test_schema_lifecycle() {
    let ctx = test_app_context().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/schemas")
        .set_json(json!({
            "modelName": "Brand",
            "fields": {"name": {"type": "string", "required": true}},
            "options": {"timestamps": true}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: ApiResponse = test::read_body_json(resp).await;
    assert!(!body.error);
    assert_eq!(body.data["modelName"], json!("Brand"));
    assert_eq!(body.data["options"]["timestamps"], json!(true));

    // Duplicate
    let req = test::TestRequest::post()
        .uri("/schemas")
        .set_json(json!({"modelName": "Brand", "fields": {"name": "string"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Read
    let req = test::TestRequest::get().uri("/schemas/Brand").to_request();
    let body: ApiResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.data["fields"]["name"]["required"], json!(true));

    // Rename
    let req = test::TestRequest::put()
        .uri("/schemas/Brand")
        .set_json(json!({"fields": {"name": "string"}, "modelName": "Maker"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: ApiResponse = test::read_body_json(resp).await;
    assert_eq!(body.message, "Schema 'Brand' renamed to 'Maker'");

    let req = test::TestRequest::get().uri("/schemas").to_request();
    let body: ApiResponse = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&Value> = body
        .data
        .as_array()
        .unwrap()
        .iter()
        .map(|d| &d["modelName"])
        .collect();
    assert_eq!(names, vec![&json!("Maker")]);

    // Delete twice
    for _ in 0..2 {
        let req = test::TestRequest::delete().uri("/schemas/Maker").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get().uri("/schemas/Maker").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_invalid_descriptor_is_rejected() {
    let ctx = test_app_context().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/schemas")
        .set_json(json!({"modelName": "Gadget", "fields": {"size": {"type": "bigint"}}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse = test::read_body_json(resp).await;
    assert_eq!(body.errors.len(), 1);
    assert_eq!(body.errors[0].path, "size");
}

#[actix_web::test]
async fn test_route_segment_model_name_is_400() {
    let ctx = test_app_context().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/schemas")
        .set_json(json!({"modelName": "readyz", "fields": {"name": "string"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse = test::read_body_json(resp).await;
    assert!(body.message.contains("reserved"));
}

#[actix_web::test]
async fn test_collection_collision_is_400() {
    let backend = memory_backend();
    backend.create_partition(&Partition::new("widgets")).unwrap();
    let ctx = test_app_context_with(backend).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/schemas")
        .set_json(json!({"modelName": "Widget", "fields": {"name": "string"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse = test::read_body_json(resp).await;
    assert!(body.message.contains("widgets"));
}

#[actix_web::test]
async fn test_document_crud() {
    let ctx = test_app_context().await;
    create_widget_schema(&ctx).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/Widget")
        .set_json(json!({"name": "foo", "qty": "3"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: ApiResponse = test::read_body_json(resp).await;
    let id = body.data["_id"].as_str().unwrap().to_string();
    assert_eq!(body.data["qty"], json!(3));
    assert!(body.data["createdAt"].is_string());

    let req = test::TestRequest::get()
        .uri(&format!("/Widget/{}", id))
        .to_request();
    let body: ApiResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.data["name"], json!("foo"));

    let req = test::TestRequest::put()
        .uri(&format!("/Widget/{}", id))
        .set_json(json!({"qty": 4}))
        .to_request();
    let body: ApiResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.data["qty"], json!(4));
    assert_eq!(body.data["__v"], json!(1));

    let req = test::TestRequest::put()
        .uri(&format!("/Widget/{}", id))
        .set_json(json!({"qty": 5, "__v": 0}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::delete()
        .uri(&format!("/Widget/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/Widget/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_validation_errors_are_listed() {
    let ctx = test_app_context().await;
    create_widget_schema(&ctx).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/Widget")
        .set_json(json!({"qty": "lots", "color": "red"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse = test::read_body_json(resp).await;
    let paths: Vec<&str> = body.errors.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["name", "qty", "color"]);
}

#[actix_web::test]
async fn test_unknown_model_is_404() {
    let ctx = test_app_context().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/Ghost").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ApiResponse = test::read_body_json(resp).await;
    assert!(body.error);
    assert_eq!(body.status_code, 404);
}

#[actix_web::test]
async fn test_list_limit_is_capped() {
    let ctx = test_app_context().await;
    create_widget_schema(&ctx).await;
    let widgets = ctx.schema_registry().model("Widget").await.unwrap();
    for i in 0..5 {
        widgets
            .create(json!({"name": format!("w{}", i)}))
            .await
            .unwrap();
    }
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/Widget?limit=2").to_request();
    let body: ApiResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.data.as_array().unwrap().len(), 2);

    let req = test::TestRequest::get().uri("/Widget").to_request();
    let body: ApiResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.data.as_array().unwrap().len(), 5);

    let req = test::TestRequest::get().uri("/Widget?limit=many").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_readyz_after_shutdown() {
    let ctx = test_app_context().await;
    create_widget_schema(&ctx).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/readyz").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: ApiResponse = test::read_body_json(resp).await;
    assert_eq!(body.data["models"], json!(1));

    ctx.shutdown();

    let req = test::TestRequest::get().uri("/readyz").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let req = test::TestRequest::get().uri("/Widget").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
