//! Persisted schema definition of a dynamic model.

use super::field_descriptor::{FieldDescriptor, FieldMap};
use super::schema_options::SchemaOptions;
use crate::constants::DocumentFields;
use crate::errors::DescriptorError;
use crate::models::ModelName;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named field map plus options, with registry-maintained timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    pub model_name: ModelName,
    pub fields: FieldMap,
    #[serde(default)]
    pub options: SchemaOptions,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SchemaDefinition {
    /// Builds a fresh definition stamped with the current time.
    pub fn new(
        model_name: ModelName,
        fields: FieldMap,
        options: SchemaOptions,
    ) -> Result<Self, DescriptorError> {
        Self::check_managed_fields(&fields, &options)?;
        options.validate()?;
        let now = Utc::now();
        Ok(Self {
            model_name,
            fields,
            options,
            created_at: now,
            updated_at: now,
        })
    }

    /// Parses the `fields` and `options` JSON of a create or update request.
    pub fn parse_parts(
        fields: &Value,
        options: &Value,
    ) -> Result<(FieldMap, SchemaOptions), DescriptorError> {
        let fields = FieldDescriptor::parse_map("", fields)?;
        let options = SchemaOptions::parse(options)?;
        Self::check_managed_fields(&fields, &options)?;
        Ok((fields, options))
    }

    fn check_managed_fields(
        fields: &FieldMap,
        options: &SchemaOptions,
    ) -> Result<(), DescriptorError> {
        if !options.timestamps {
            return Ok(());
        }
        for managed in [DocumentFields::CREATED_AT, DocumentFields::UPDATED_AT] {
            if fields.contains_key(managed) {
                return Err(DescriptorError::new(
                    managed,
                    "field is maintained automatically when 'timestamps' is enabled",
                ));
            }
        }
        Ok(())
    }

    /// Storage collection the model writes into.
    pub fn collection_name(&self) -> String {
        self.options.collection_for(&self.model_name)
    }

    /// Returns the definition with new fields, options and (optionally) name.
    ///
    /// `createdAt` is kept; `updatedAt` always moves forward, even when the
    /// clock has not.
    pub fn updated(
        &self,
        model_name: ModelName,
        fields: FieldMap,
        options: SchemaOptions,
    ) -> Result<Self, DescriptorError> {
        Self::check_managed_fields(&fields, &options)?;
        options.validate()?;
        let now = Utc::now();
        let updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
        Ok(Self {
            model_name,
            fields,
            options,
            created_at: self.created_at,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn widget() -> SchemaDefinition {
        let (fields, options) =
            SchemaDefinition::parse_parts(&json!({"name": "string"}), &Value::Null).unwrap();
        SchemaDefinition::new(ModelName::new("Widget").unwrap(), fields, options).unwrap()
    }

    #[test]
    fn test_collection_name() {
        let mut def = widget();
        assert_eq!(def.collection_name(), "widgets");

        def.options.collection_name = Some("LegacyWidgets".to_string());
        assert_eq!(def.collection_name(), "LegacyWidgets");
    }

    #[test]
    fn test_updated_keeps_created_and_advances_updated() {
        let def = widget();
        let (fields, options) = SchemaDefinition::parse_parts(
            &json!({"name": "string", "price": "number"}),
            &json!({"timestamps": true}),
        )
        .unwrap();
        let next = def
            .updated(def.model_name.clone(), fields.clone(), options.clone())
            .unwrap();
        assert_eq!(next.created_at, def.created_at);
        assert!(next.updated_at > def.updated_at);
        assert_eq!(next.fields, fields);
        assert_eq!(next.options, options);
    }

    #[test]
    fn test_timestamp_fields_cannot_be_declared() {
        let err = SchemaDefinition::parse_parts(
            &json!({"createdAt": "date"}),
            &json!({"timestamps": true}),
        )
        .unwrap_err();
        assert_eq!(err.path, "createdAt");

        assert!(
            SchemaDefinition::parse_parts(&json!({"createdAt": "date"}), &json!({})).is_ok()
        );
    }

    #[test]
    fn test_serde_shape() {
        let def = widget();
        let value = serde_json::to_value(&def).unwrap();
        assert_eq!(value["modelName"], json!("Widget"));
        assert_eq!(value["fields"]["name"], json!({"type": "string"}));
        assert_eq!(value["options"]["strict"], json!(true));
        assert!(value["createdAt"].is_string());

        let back: SchemaDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(back, def);
    }
}
