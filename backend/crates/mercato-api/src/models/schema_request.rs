//! Schema administration request bodies

use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /schemas`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchemaRequest {
    pub model_name: String,
    pub fields: Value,
    #[serde(default)]
    pub options: Value,
}

/// Body of `PUT /schemas/{modelName}`. A `modelName` different from the path
/// renames the model.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSchemaRequest {
    pub fields: Value,
    #[serde(default)]
    pub options: Value,
    #[serde(default)]
    pub model_name: Option<String>,
}
