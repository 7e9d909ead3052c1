//! Document operations through handles resolved by the registry.

use mercato_core::test_helpers::test_app_context;
use mercato_core::{MercatoError, StorageFailureKind};
use serde_json::{json, Value};

#[tokio::test]
async fn test_widget_timestamps_scenario() {
    let ctx = test_app_context().await;
    let registry = ctx.schema_registry();
    registry
        .create_schema(
            "Widget",
            &json!({"name": {"type": "string", "required": true}}),
            &json!({"timestamps": true}),
        )
        .await
        .unwrap();

    let widget = registry.model("Widget").await.unwrap();
    let doc = widget.create(json!({"name": "foo"})).await.unwrap();
    assert_eq!(doc["name"], json!("foo"));
    assert!(doc["createdAt"].is_string());
    assert!(doc["updatedAt"].is_string());
    assert!(doc["_id"].is_string());

    let err = widget.create(json!({})).await.unwrap_err();
    assert_eq!(err.failure_kind(), Some(StorageFailureKind::Validation));
    match err {
        MercatoError::StorageFailure { issues, .. } => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].path, "name");
            assert_eq!(issues[0].message, "Path `name` is required.");
        }
        other => panic!("expected StorageFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_crud_lifecycle() {
    let ctx = test_app_context().await;
    let registry = ctx.schema_registry();
    registry
        .create_schema(
            "Category",
            &json!({
                "title": {"type": "string", "required": true, "maxLength": 40},
                "slug": {"type": "string", "unique": true, "match": "^[a-z0-9-]+$"},
                "parent": {"type": "objectId", "ref": "Category"}
            }),
            &Value::Null,
        )
        .await
        .unwrap();
    let categories = registry.model("Category").await.unwrap();
    assert_eq!(categories.collection().name(), "categories");

    let root = categories
        .create(json!({"title": "Lighting", "slug": "lighting"}))
        .await
        .unwrap();
    let root_id = root["_id"].as_str().unwrap().to_string();

    let child = categories
        .create(json!({"title": "Lamps", "slug": "lamps", "parent": root_id}))
        .await
        .unwrap();
    let child_id = child["_id"].as_str().unwrap().to_string();

    let err = categories
        .create(json!({"title": "Again", "slug": "lamps"}))
        .await
        .unwrap_err();
    assert_eq!(err.failure_kind(), Some(StorageFailureKind::UniqueViolation));

    assert_eq!(categories.find_all(None).await.unwrap().len(), 2);
    assert_eq!(categories.find_by_id(&child_id).await.unwrap(), child);

    let updated = categories
        .update_by_id(&child_id, json!({"title": "Desk lamps", "__v": 0}))
        .await
        .unwrap();
    assert_eq!(updated["title"], json!("Desk lamps"));
    assert_eq!(updated["slug"], json!("lamps"));
    assert_eq!(updated["__v"], json!(1));

    let removed = categories.delete_by_id(&child_id).await.unwrap();
    assert_eq!(removed, updated);
    let err = categories.find_by_id(&child_id).await.unwrap_err();
    assert!(matches!(
        err,
        MercatoError::DocumentNotFound { ref model_name, .. } if model_name == "Category"
    ));
}

#[tokio::test]
async fn test_documents_survive_recompile() {
    let ctx = test_app_context().await;
    let registry = ctx.schema_registry();
    registry
        .create_schema("Review", &json!({"rating": "number"}), &Value::Null)
        .await
        .unwrap();
    let doc = registry
        .model("Review")
        .await
        .unwrap()
        .create(json!({"rating": 4}))
        .await
        .unwrap();

    registry
        .update_schema(
            "Review",
            &json!({"rating": "number", "body": {"type": "string", "default": ""}}),
            &Value::Null,
            None,
        )
        .await
        .unwrap();

    let reviews = registry.model("Review").await.unwrap();
    let id = doc["_id"].as_str().unwrap();
    assert_eq!(reviews.find_by_id(id).await.unwrap(), doc);

    let updated = reviews.update_by_id(id, json!({"rating": "5"})).await.unwrap();
    assert_eq!(updated["rating"], json!(5));
    assert_eq!(updated["body"], json!(""));
}

#[tokio::test]
async fn test_strict_and_non_strict_models() {
    let ctx = test_app_context().await;
    let registry = ctx.schema_registry();
    registry
        .create_schema("Note", &json!({"text": "string"}), &Value::Null)
        .await
        .unwrap();
    registry
        .create_schema("Event", &json!({"kind": "string"}), &json!({"strict": false}))
        .await
        .unwrap();

    let notes = registry.model("Note").await.unwrap();
    let err = notes
        .create(json!({"text": "hi", "color": "red"}))
        .await
        .unwrap_err();
    assert_eq!(err.failure_kind(), Some(StorageFailureKind::Validation));

    let events = registry.model("Event").await.unwrap();
    let doc = events
        .create(json!({"kind": "click", "meta": {"x": 1}}))
        .await
        .unwrap();
    assert_eq!(doc["meta"], json!({"x": 1}));
    let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["_id", "kind", "meta", "__v"]);
}

#[tokio::test]
async fn test_update_after_field_removed() {
    let ctx = test_app_context().await;
    let registry = ctx.schema_registry();
    registry
        .create_schema("Item", &json!({"title": "string", "stock": "number"}), &Value::Null)
        .await
        .unwrap();
    let doc = registry
        .model("Item")
        .await
        .unwrap()
        .create(json!({"title": "a", "stock": 3}))
        .await
        .unwrap();
    let id = doc["_id"].as_str().unwrap();

    registry
        .update_schema("Item", &json!({"title": "string"}), &Value::Null, None)
        .await
        .unwrap();
    let items = registry.model("Item").await.unwrap();

    let updated = items.update_by_id(id, json!({"title": "b"})).await.unwrap();
    assert_eq!(updated["title"], json!("b"));
    assert!(updated.get("stock").is_none());
    assert_eq!(updated["__v"], json!(1));

    // A removed field sent by the caller is still rejected.
    let err = items
        .update_by_id(id, json!({"stock": 4}))
        .await
        .unwrap_err();
    assert_eq!(err.failure_kind(), Some(StorageFailureKind::Validation));
}

#[tokio::test]
async fn test_update_after_timestamps_disabled() {
    let ctx = test_app_context().await;
    let registry = ctx.schema_registry();
    registry
        .create_schema("Coupon", &json!({"code": "string"}), &json!({"timestamps": true}))
        .await
        .unwrap();
    let doc = registry
        .model("Coupon")
        .await
        .unwrap()
        .create(json!({"code": "SPRING"}))
        .await
        .unwrap();
    assert!(doc["createdAt"].is_string());
    let id = doc["_id"].as_str().unwrap();

    registry
        .update_schema("Coupon", &json!({"code": "string"}), &Value::Null, None)
        .await
        .unwrap();
    let coupons = registry.model("Coupon").await.unwrap();

    let updated = coupons
        .update_by_id(id, json!({"code": "SUMMER"}))
        .await
        .unwrap();
    assert_eq!(updated["code"], json!("SUMMER"));
    assert!(updated.get("createdAt").is_none());
    assert!(updated.get("updatedAt").is_none());
}

#[tokio::test]
async fn test_update_after_versioning_disabled() {
    let ctx = test_app_context().await;
    let registry = ctx.schema_registry();
    registry
        .create_schema("Banner", &json!({"text": "string"}), &Value::Null)
        .await
        .unwrap();
    let doc = registry
        .model("Banner")
        .await
        .unwrap()
        .create(json!({"text": "Sale"}))
        .await
        .unwrap();
    assert_eq!(doc["__v"], json!(0));
    let id = doc["_id"].as_str().unwrap();

    registry
        .update_schema(
            "Banner",
            &json!({"text": "string"}),
            &json!({"versioned": false}),
            None,
        )
        .await
        .unwrap();
    let banners = registry.model("Banner").await.unwrap();

    let updated = banners
        .update_by_id(id, json!({"text": "Clearance"}))
        .await
        .unwrap();
    assert_eq!(updated["text"], json!("Clearance"));
    assert!(updated.get("__v").is_none());
}

#[tokio::test]
async fn test_non_strict_update_keeps_undeclared_stored_fields() {
    let ctx = test_app_context().await;
    let registry = ctx.schema_registry();
    registry
        .create_schema(
            "Event",
            &json!({"kind": "string"}),
            &json!({"strict": false, "timestamps": true}),
        )
        .await
        .unwrap();
    let doc = registry
        .model("Event")
        .await
        .unwrap()
        .create(json!({"kind": "click", "meta": {"x": 1}}))
        .await
        .unwrap();
    let id = doc["_id"].as_str().unwrap();

    registry
        .update_schema("Event", &json!({"kind": "string"}), &json!({"strict": false}), None)
        .await
        .unwrap();
    let events = registry.model("Event").await.unwrap();

    let updated = events
        .update_by_id(id, json!({"kind": "view"}))
        .await
        .unwrap();
    assert_eq!(updated["meta"], json!({"x": 1}));
    assert!(updated.get("createdAt").is_none());
}
