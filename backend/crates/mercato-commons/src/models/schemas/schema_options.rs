//! Per-model options recognized by the compiled model.

use crate::errors::DescriptorError;
use crate::models::ModelName;
use crate::pluralize::collection_name_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum length of an explicit collection name.
const MAX_COLLECTION_NAME_LEN: usize = 128;

/// Options of a dynamic model.
///
/// Serialized in camelCase. Any key outside this set is rejected when parsing
/// caller input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SchemaOptions {
    /// Maintain `createdAt` / `updatedAt` on every document
    #[serde(default)]
    pub timestamps: bool,

    /// Replaces the pluralized collection name verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,

    /// Reject fields not declared in the field map
    #[serde(default = "default_true")]
    pub strict: bool,

    /// Maintain the `__v` optimistic version counter
    #[serde(default = "default_true")]
    pub versioned: bool,

    /// Generate `_id` automatically
    #[serde(default = "default_true")]
    pub identity_field: bool,

    /// Strip empty nested objects before writing
    #[serde(default = "default_true")]
    pub minimize_empty: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            timestamps: false,
            collection_name: None,
            strict: true,
            versioned: true,
            identity_field: true,
            minimize_empty: true,
        }
    }
}

impl SchemaOptions {
    /// Parses options from caller JSON. `null` means all defaults.
    pub fn parse(value: &Value) -> Result<Self, DescriptorError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        if !value.is_object() {
            return Err(DescriptorError::new("options", "options must be a JSON object"));
        }
        let options: Self = serde_json::from_value(value.clone())
            .map_err(|e| DescriptorError::new("options", e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Collection a model named `model` writes into under these options.
    pub fn collection_for(&self, model: &ModelName) -> String {
        match &self.collection_name {
            Some(name) => name.clone(),
            None => collection_name_for(model),
        }
    }

    /// Checks the explicit collection name, if any.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if let Some(name) = &self.collection_name {
            if name.is_empty() || name.len() > MAX_COLLECTION_NAME_LEN {
                return Err(DescriptorError::new(
                    "options.collectionName",
                    format!("must be 1-{} characters", MAX_COLLECTION_NAME_LEN),
                ));
            }
            if !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(DescriptorError::new(
                    "options.collectionName",
                    "may only contain letters, digits, '_' and '-'",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = SchemaOptions::parse(&json!({})).unwrap();
        assert_eq!(options, SchemaOptions::default());
        assert!(!options.timestamps);
        assert!(options.strict);
        assert!(options.versioned);
        assert!(options.identity_field);
        assert!(options.minimize_empty);

        assert_eq!(SchemaOptions::parse(&Value::Null).unwrap(), SchemaOptions::default());
    }

    #[test]
    fn test_camel_case_keys() {
        let options = SchemaOptions::parse(&json!({
            "timestamps": true,
            "collectionName": "legacy_items",
            "identityField": false,
            "minimizeEmpty": false
        }))
        .unwrap();
        assert!(options.timestamps);
        assert_eq!(options.collection_name.as_deref(), Some("legacy_items"));
        assert!(!options.identity_field);
        assert!(!options.minimize_empty);
    }

    #[test]
    fn test_rejects_unknown_and_invalid() {
        let err = SchemaOptions::parse(&json!({"autoIndex": true})).unwrap_err();
        assert_eq!(err.path, "options");
        assert!(err.message.contains("autoIndex"));

        assert!(SchemaOptions::parse(&json!({"strict": "yes"})).is_err());
        assert!(SchemaOptions::parse(&json!({"collectionName": ""})).is_err());
        assert!(SchemaOptions::parse(&json!({"collectionName": "a/b"})).is_err());
        assert!(SchemaOptions::parse(&json!([])).is_err());
    }
}
