//! Closed set of field types a dynamic model may declare.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported field types.
///
/// Serialized with the canonical tags used in schema JSON (`"string"`,
/// `"objectId"`, ...). Parsing from caller input is case-insensitive so
/// `"String"` and `"ObjectId"` are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    /// Identity reference to another document
    ObjectId,
    /// Homogeneous array, element descriptor in `of`
    Array,
    /// Nested object, member descriptors in `fields`
    Object,
}

impl FieldType {
    /// All supported types, in documentation order.
    pub const ALL: [FieldType; 7] = [
        FieldType::String,
        FieldType::Number,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::ObjectId,
        FieldType::Array,
        FieldType::Object,
    ];

    /// Parses a type tag, case-insensitively. Returns `None` for unknown tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "string" => Some(FieldType::String),
            "number" => Some(FieldType::Number),
            "boolean" => Some(FieldType::Boolean),
            "date" => Some(FieldType::Date),
            "objectid" => Some(FieldType::ObjectId),
            "array" => Some(FieldType::Array),
            "object" => Some(FieldType::Object),
            _ => None,
        }
    }

    /// Canonical tag for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::ObjectId => "objectId",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    /// Scalar types hold a single JSON value (no `of` / `fields`).
    #[inline]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldType::Array | FieldType::Object)
    }

    /// Lists the accepted tags, for error messages.
    pub fn supported_tags() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
