//! Compiled model handle and its document operations.
//!
//! A `CompiledModel` is built once from a field map and options and then shared
//! (`ModelHandle = Arc<CompiledModel>`) by every request against that model
//! name. It owns the validated descriptor table, so document operations never
//! look at caller-controlled schema JSON.
//!
//! Documents are stored as JSON objects in the model's collection partition,
//! keyed by `_id`. Field order of a stored document is `_id`, declared fields
//! sorted by name, undeclared fields (non-strict models), `createdAt`,
//! `updatedAt`, `__v`.

use super::validator::{cast_document, compile_fields, retain_declared, CompiledField};
use crate::error::{MercatoError, Result, StorageFailureKind, ValidationIssue};
use chrono::{DateTime, Utc};
use mercato_commons::models::schemas::cast::{cast_scalar, format_date};
use mercato_commons::{
    DocumentFields, DocumentId, FieldMap, FieldType, ModelName, SchemaOptions, StorageKey,
};
use mercato_store::{Partition, StorageBackend, StorageBackendAsync};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to a compiled model.
pub type ModelHandle = Arc<CompiledModel>;

/// Source of process-unique generation numbers.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// A dynamic model compiled from its field descriptors.
pub struct CompiledModel {
    model_name: ModelName,
    collection: Partition,
    descriptors: FieldMap,
    options: SchemaOptions,
    fields: BTreeMap<String, CompiledField>,
    generation: u64,
    compiled_at: DateTime<Utc>,
    backend: Arc<dyn StorageBackend>,
    /// Serializes unique checks with the write that follows them.
    write_lock: tokio::sync::Mutex<()>,
}

impl fmt::Debug for CompiledModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledModel")
            .field("model_name", &self.model_name)
            .field("collection", &self.collection)
            .field("generation", &self.generation)
            .field("compiled_at", &self.compiled_at)
            .finish()
    }
}

impl CompiledModel {
    /// Compiles a handle for `model_name` writing into the collection derived
    /// from `options`.
    pub fn compile(
        model_name: ModelName,
        descriptors: &FieldMap,
        options: &SchemaOptions,
        backend: Arc<dyn StorageBackend>,
    ) -> Result<Self> {
        let fields = compile_fields("", descriptors)?;
        let collection = Partition::new(options.collection_for(&model_name));
        Ok(Self {
            model_name,
            collection,
            descriptors: descriptors.clone(),
            options: options.clone(),
            fields,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            compiled_at: Utc::now(),
            backend,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn model_name(&self) -> &ModelName {
        &self.model_name
    }

    /// Collection partition documents are written into.
    pub fn collection(&self) -> &Partition {
        &self.collection
    }

    /// Field descriptors this handle was compiled from.
    pub fn fields(&self) -> &FieldMap {
        &self.descriptors
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Process-unique compile counter; a recompiled model always differs.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn compiled_at(&self) -> DateTime<Utc> {
        self.compiled_at
    }

    /// Validates and stores a new document. Returns the stored document.
    pub async fn create(&self, body: Value) -> Result<Value> {
        let input = self.expect_object(body)?;
        let mut issues = Vec::new();

        let id = self.resolve_id(input.get(DocumentFields::ID), &mut issues);
        let fields = cast_document(&self.fields, &self.options, &input, &mut issues);
        let id = match id {
            Some(id) if issues.is_empty() => id,
            _ => return Err(MercatoError::validation(self.model_name.as_str(), issues)),
        };

        let now = format_date(&Utc::now());
        let doc = self.assemble(&id, fields, &now, &now, 0);

        let _guard = self.write_lock.lock().await;
        self.check_unique(&doc, None).await?;

        let bytes = encode(&doc)?;
        let inserted = self
            .backend
            .put_if_absent_async(&self.collection, &id.storage_key(), &bytes)
            .await?;
        if !inserted {
            return Err(MercatoError::StorageFailure {
                kind: StorageFailureKind::UniqueViolation,
                message: format!(
                    "{} with _id '{}' already exists in '{}'",
                    self.model_name, id, self.collection
                ),
                issues: vec![ValidationIssue::new(
                    DocumentFields::ID,
                    format!("Path `_id` must be unique; value `{}` already exists.", id),
                )],
            });
        }

        log::debug!(
            "[{}] Created document {} in '{}'",
            self.model_name,
            id,
            self.collection
        );
        Ok(Value::Object(doc))
    }

    /// Returns up to `limit` documents in storage-key order.
    pub async fn find_all(&self, limit: Option<usize>) -> Result<Vec<Value>> {
        let rows = self
            .backend
            .scan_async(&self.collection, None, None, limit)
            .await?;
        rows.into_iter()
            .map(|(_, bytes)| decode(&bytes).map(Value::Object))
            .collect()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Value> {
        self.load(id).await.map(Value::Object)
    }

    /// Applies the fields present in `body` to a stored document.
    ///
    /// The merged document is validated as a whole. `_id` and `createdAt`
    /// are kept, `updatedAt` refreshed and `__v` incremented.
    pub async fn update_by_id(&self, id: &str, body: Value) -> Result<Value> {
        let input = self.expect_object(body)?;

        let _guard = self.write_lock.lock().await;
        let stored = self.load(id).await?;

        if let Some(supplied) = input.get(DocumentFields::ID) {
            if supplied.as_str() != Some(id) {
                return Err(MercatoError::validation(
                    self.model_name.as_str(),
                    vec![ValidationIssue::new(
                        DocumentFields::ID,
                        "Performing an update on the path '_id' would modify the immutable field '_id'",
                    )],
                ));
            }
        }

        let version = version_of(&stored);
        if self.options.versioned {
            if let Some(supplied) = input.get(DocumentFields::VERSION) {
                if supplied.as_u64() != Some(version) {
                    return Err(MercatoError::storage(
                        StorageFailureKind::VersionConflict,
                        format!(
                            "No matching document found for id \"{}\" version {}",
                            id, supplied
                        ),
                    ));
                }
            }
        }

        let mut merged = self.merge_base(stored.clone());
        for (key, value) in input {
            merged.insert(key, value);
        }

        let mut issues = Vec::new();
        let fields = cast_document(&self.fields, &self.options, &merged, &mut issues);
        if !issues.is_empty() {
            return Err(MercatoError::validation(self.model_name.as_str(), issues));
        }

        let now = format_date(&Utc::now());
        let created = stored
            .get(DocumentFields::CREATED_AT)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| now.clone());
        let doc_id = DocumentId::from(id);
        let doc = self.assemble(&doc_id, fields, &created, &now, version + 1);

        self.check_unique(&doc, Some(&doc_id)).await?;
        let bytes = encode(&doc)?;
        self.backend
            .put_async(&self.collection, &doc_id.storage_key(), &bytes)
            .await?;

        log::debug!(
            "[{}] Updated document {} in '{}'",
            self.model_name,
            id,
            self.collection
        );
        Ok(Value::Object(doc))
    }

    /// Removes a document and returns it.
    pub async fn delete_by_id(&self, id: &str) -> Result<Value> {
        let _guard = self.write_lock.lock().await;
        let stored = self.load(id).await?;
        self.backend
            .delete_async(&self.collection, &DocumentId::from(id).storage_key())
            .await?;
        log::debug!(
            "[{}] Deleted document {} from '{}'",
            self.model_name,
            id,
            self.collection
        );
        Ok(Value::Object(stored))
    }

    /// Stored document reduced to what the current descriptors still accept.
    ///
    /// Managed fields are reassigned by `assemble`. Under `strict`, fields a
    /// schema update removed are dropped instead of failing validation.
    fn merge_base(&self, mut stored: Map<String, Value>) -> Map<String, Value> {
        stored.retain(|key, _| !DocumentFields::is_reserved(key));
        if self.options.strict {
            retain_declared(&self.fields, &mut stored);
        }
        stored
    }

    fn expect_object(&self, body: Value) -> Result<Map<String, Value>> {
        match body {
            Value::Object(map) => Ok(map),
            other => Err(MercatoError::validation(
                self.model_name.as_str(),
                vec![ValidationIssue::new(
                    "document",
                    format!("expected a JSON object, got {}", json_kind(&other)),
                )],
            )),
        }
    }

    fn resolve_id(
        &self,
        supplied: Option<&Value>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<DocumentId> {
        match supplied {
            Some(value) if !value.is_null() => match cast_scalar(FieldType::ObjectId, value) {
                Ok(Value::String(id)) => Some(DocumentId::from(id)),
                Ok(_) => None,
                Err(msg) => {
                    issues.push(ValidationIssue::new(DocumentFields::ID, msg));
                    None
                }
            },
            _ if self.options.identity_field => Some(DocumentId::generate()),
            _ => {
                issues.push(ValidationIssue::new(
                    DocumentFields::ID,
                    "document must have an _id before saving",
                ));
                None
            }
        }
    }

    fn assemble(
        &self,
        id: &DocumentId,
        fields: Map<String, Value>,
        created_at: &str,
        updated_at: &str,
        version: u64,
    ) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert(DocumentFields::ID.to_string(), Value::String(id.to_string()));
        doc.extend(fields);
        if self.options.timestamps {
            doc.insert(
                DocumentFields::CREATED_AT.to_string(),
                Value::String(created_at.to_string()),
            );
            doc.insert(
                DocumentFields::UPDATED_AT.to_string(),
                Value::String(updated_at.to_string()),
            );
        }
        if self.options.versioned {
            doc.insert(DocumentFields::VERSION.to_string(), Value::from(version));
        }
        doc
    }

    async fn load(&self, id: &str) -> Result<Map<String, Value>> {
        let key = DocumentId::from(id).storage_key();
        match self.backend.get_async(&self.collection, &key).await? {
            Some(bytes) => decode(&bytes),
            None => Err(MercatoError::DocumentNotFound {
                model_name: self.model_name.to_string(),
                id: id.to_string(),
            }),
        }
    }

    /// Rejects `doc` when a `unique` field collides with another document.
    async fn check_unique(
        &self,
        doc: &Map<String, Value>,
        exclude: Option<&DocumentId>,
    ) -> Result<()> {
        let unique: Vec<(&str, &Value)> = self
            .descriptors
            .iter()
            .filter(|(_, d)| d.unique)
            .filter_map(|(name, _)| doc.get(name).map(|v| (name.as_str(), v)))
            .filter(|(_, v)| !v.is_null())
            .collect();
        if unique.is_empty() {
            return Ok(());
        }

        let rows = self
            .backend
            .scan_async(&self.collection, None, None, None)
            .await?;
        let skip = exclude.map(|id| id.storage_key());

        let mut issues = Vec::new();
        for (key, bytes) in rows {
            if skip.as_deref() == Some(key.as_slice()) {
                continue;
            }
            let other = decode(&bytes)?;
            for (name, value) in &unique {
                let already = issues.iter().any(|i: &ValidationIssue| i.path == *name);
                if !already && other.get(*name) == Some(*value) {
                    issues.push(ValidationIssue::new(
                        *name,
                        format!(
                            "Path `{}` must be unique; value `{}` already exists.",
                            name, value
                        ),
                    ));
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            let summary = issues
                .iter()
                .map(|i| i.path.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Err(MercatoError::StorageFailure {
                kind: StorageFailureKind::UniqueViolation,
                message: format!("duplicate key in '{}': {}", self.collection, summary),
                issues,
            })
        }
    }
}

fn version_of(doc: &Map<String, Value>) -> u64 {
    doc.get(DocumentFields::VERSION)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

fn encode(doc: &Map<String, Value>) -> Result<Vec<u8>> {
    serde_json::to_vec(doc).map_err(|e| {
        MercatoError::storage(
            StorageFailureKind::Backend,
            format!("Failed to encode document: {}", e),
        )
    })
}

fn decode(bytes: &[u8]) -> Result<Map<String, Value>> {
    serde_json::from_slice(bytes).map_err(|e| {
        MercatoError::storage(
            StorageFailureKind::Backend,
            format!("Failed to decode stored document: {}", e),
        )
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercato_commons::FieldDescriptor;
    use mercato_store::test_utils::memory_backend;
    use serde_json::json;

    async fn model(fields: Value, options: Value) -> CompiledModel {
        let backend = memory_backend();
        let fields = FieldDescriptor::parse_map("", &fields).unwrap();
        let options = SchemaOptions::parse(&options).unwrap();
        let name = ModelName::new("Product").unwrap();
        let model = CompiledModel::compile(name, &fields, &options, backend.clone()).unwrap();
        backend.create_partition(model.collection()).unwrap();
        model
    }

    #[tokio::test]
    async fn test_create_assigns_managed_fields() {
        let model = model(
            json!({"title": {"type": "string", "required": true}, "price": "number"}),
            json!({"timestamps": true}),
        )
        .await;
        let doc = model
            .create(json!({"title": "Lamp", "price": "19.5"}))
            .await
            .unwrap();

        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["_id", "price", "title", "createdAt", "updatedAt", "__v"]);
        assert_eq!(doc["price"], json!(19.5));
        assert_eq!(doc["__v"], json!(0));
        assert!(DocumentId::is_generated_form(doc["_id"].as_str().unwrap()));
        assert_eq!(doc["createdAt"], doc["updatedAt"]);
        assert_eq!(model.collection().name(), "products");
    }

    #[tokio::test]
    async fn test_create_requires_id_without_identity_field() {
        let model = model(json!({"sku": "string"}), json!({"identityField": false})).await;

        let err = model.create(json!({"sku": "A"})).await.unwrap_err();
        assert_eq!(err.failure_kind(), Some(StorageFailureKind::Validation));
        assert!(err.to_string().contains("document must have an _id before saving"));

        let doc = model.create(json!({"_id": "sku-1", "sku": "A"})).await.unwrap();
        assert_eq!(doc["_id"], json!("sku-1"));

        let err = model.create(json!({"_id": "sku-1", "sku": "B"})).await.unwrap_err();
        assert_eq!(err.failure_kind(), Some(StorageFailureKind::UniqueViolation));
    }

    #[tokio::test]
    async fn test_create_rejects_non_object() {
        let model = model(json!({"sku": "string"}), Value::Null).await;
        let err = model.create(json!(["a"])).await.unwrap_err();
        assert_eq!(err.failure_kind(), Some(StorageFailureKind::Validation));
    }

    #[tokio::test]
    async fn test_unique_fields() {
        let model = model(json!({"sku": {"type": "string", "unique": true}}), Value::Null).await;
        let first = model.create(json!({"sku": "A"})).await.unwrap();
        model.create(json!({"sku": "B"})).await.unwrap();

        let err = model.create(json!({"sku": "A"})).await.unwrap_err();
        assert_eq!(err.failure_kind(), Some(StorageFailureKind::UniqueViolation));

        // Re-saving the same value on the owning document is fine.
        let id = first["_id"].as_str().unwrap();
        model.update_by_id(id, json!({"sku": "A"})).await.unwrap();

        let err = model.update_by_id(id, json!({"sku": "B"})).await.unwrap_err();
        assert_eq!(err.failure_kind(), Some(StorageFailureKind::UniqueViolation));
    }

    #[tokio::test]
    async fn test_update_merges_and_versions() {
        let model = model(
            json!({"title": {"type": "string", "required": true}, "stock": "number"}),
            json!({"timestamps": true}),
        )
        .await;
        let doc = model.create(json!({"title": "Lamp", "stock": 3})).await.unwrap();
        let id = doc["_id"].as_str().unwrap().to_string();

        let updated = model.update_by_id(&id, json!({"stock": "5"})).await.unwrap();
        assert_eq!(updated["title"], json!("Lamp"));
        assert_eq!(updated["stock"], json!(5));
        assert_eq!(updated["__v"], json!(1));
        assert_eq!(updated["createdAt"], doc["createdAt"]);

        let err = model
            .update_by_id(&id, json!({"stock": 1, "__v": 0}))
            .await
            .unwrap_err();
        assert_eq!(err.failure_kind(), Some(StorageFailureKind::VersionConflict));

        let err = model.update_by_id(&id, json!({"title": ""})).await.unwrap_err();
        assert_eq!(err.failure_kind(), Some(StorageFailureKind::Validation));

        let err = model.update_by_id(&id, json!({"_id": "other"})).await.unwrap_err();
        assert_eq!(err.failure_kind(), Some(StorageFailureKind::Validation));

        assert_eq!(model.find_by_id(&id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_find_and_delete() {
        let model = model(json!({"title": "string"}), json!({"versioned": false})).await;
        for title in ["a", "b", "c"] {
            model.create(json!({"title": title})).await.unwrap();
        }

        let all = model.find_all(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|d| d.get("__v").is_none()));
        assert_eq!(model.find_all(Some(2)).await.unwrap().len(), 2);

        let id = all[0]["_id"].as_str().unwrap().to_string();
        let deleted = model.delete_by_id(&id).await.unwrap();
        assert_eq!(deleted, all[0]);

        let err = model.find_by_id(&id).await.unwrap_err();
        assert!(matches!(err, MercatoError::DocumentNotFound { .. }));
        let err = model.delete_by_id(&id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_generations_are_unique() {
        let a = model(json!({"title": "string"}), Value::Null).await;
        let b = model(json!({"title": "string"}), Value::Null).await;
        assert_ne!(a.generation(), b.generation());
    }
}
