//! Field descriptors: the validated, persisted description of one model field.

use super::cast::{cast_scalar, parse_date};
use super::field_type::FieldType;
use crate::constants::DocumentFields;
use crate::errors::DescriptorError;
use crate::models::ModelName;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field name → descriptor. Ordered so persisted definitions are stable.
pub type FieldMap = BTreeMap<String, FieldDescriptor>;

/// Keys accepted in the object form of a descriptor.
const DESCRIPTOR_KEYS: &[&str] = &[
    "type",
    "required",
    "default",
    "unique",
    "enum",
    "min",
    "max",
    "minLength",
    "maxLength",
    "match",
    "ref",
    "of",
    "fields",
];

/// Description of a single field of a dynamic model.
///
/// Always built through [`FieldDescriptor::parse`] (or deserialized from a
/// definition that was), so every instance satisfies the cross-key rules:
/// `of` only on arrays, `fields` only on objects, bounds consistent, defaults
/// and enum values already cast to the field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,

    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// Lower bound (numbers, dates)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,

    /// Upper bound (numbers, dates)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    /// Regular expression a string value must match
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Target model of an identity reference
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<ModelName>,

    /// Element descriptor of an array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub of: Option<Box<FieldDescriptor>>,

    /// Member descriptors of a nested object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldMap>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl FieldDescriptor {
    /// A bare descriptor of the given type with no constraints.
    pub fn of_type(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            default: None,
            unique: false,
            enum_values: None,
            min: None,
            max: None,
            min_length: None,
            max_length: None,
            pattern: None,
            reference: None,
            of: None,
            fields: None,
        }
    }

    /// Parses a field map from caller JSON. `prefix` is the dotted path of the
    /// enclosing object (empty at the top level).
    pub fn parse_map(prefix: &str, value: &Value) -> Result<FieldMap, DescriptorError> {
        let obj = value.as_object().ok_or_else(|| {
            DescriptorError::new(
                if prefix.is_empty() { "fields" } else { prefix },
                "field map must be a JSON object",
            )
        })?;

        let mut fields = FieldMap::new();
        for (name, raw) in obj {
            let path = join_path(prefix, name);
            validate_field_name(&path, name)?;
            fields.insert(name.clone(), Self::parse(&path, raw)?);
        }
        Ok(fields)
    }

    /// Parses one descriptor.
    ///
    /// Accepts the shorthand forms `"string"` and `["string"]` (array of) as
    /// well as the full object form.
    pub fn parse(path: &str, value: &Value) -> Result<Self, DescriptorError> {
        match value {
            Value::String(tag) => Ok(Self::of_type(parse_tag(path, tag)?)),
            Value::Array(items) => {
                let [element] = items.as_slice() else {
                    return Err(DescriptorError::new(
                        path,
                        "array shorthand must contain exactly one element descriptor",
                    ));
                };
                let mut descriptor = Self::of_type(FieldType::Array);
                descriptor.of = Some(Box::new(Self::parse(&join_path(path, "of"), element)?));
                Ok(descriptor)
            }
            Value::Object(obj) => Self::parse_object(path, obj),
            _ => Err(DescriptorError::new(
                path,
                "descriptor must be a type name, a one-element array or an object",
            )),
        }
    }

    fn parse_object(path: &str, obj: &Map<String, Value>) -> Result<Self, DescriptorError> {
        if let Some(unknown) = obj.keys().find(|k| !DESCRIPTOR_KEYS.contains(&k.as_str())) {
            return Err(DescriptorError::new(
                path,
                format!("unknown descriptor key '{}'", unknown),
            ));
        }

        let field_type = match obj.get("type") {
            Some(Value::String(tag)) => parse_tag(path, tag)?,
            Some(_) => return Err(DescriptorError::new(path, "'type' must be a string")),
            None => return Err(DescriptorError::new(path, "missing 'type'")),
        };

        let mut d = Self::of_type(field_type);
        d.required = bool_key(path, obj, "required")?;
        d.unique = bool_key(path, obj, "unique")?;

        if d.unique && !field_type.is_scalar() {
            return Err(DescriptorError::new(
                path,
                "'unique' is only supported on scalar fields",
            ));
        }

        // Container members first: defaults on arrays are cast through `of`.
        match (field_type, obj.get("of"), obj.get("fields")) {
            (FieldType::Array, Some(of), None) => {
                d.of = Some(Box::new(Self::parse(&join_path(path, "of"), of)?));
            }
            (FieldType::Array, None, _) => {
                return Err(DescriptorError::new(path, "array fields require 'of'"));
            }
            (FieldType::Array, Some(_), Some(_)) => {
                return Err(DescriptorError::new(
                    path,
                    "'fields' is only valid on object fields",
                ));
            }
            (FieldType::Object, Some(_), _) => {
                return Err(DescriptorError::new(path, "'of' is only valid on array fields"));
            }
            (FieldType::Object, None, Some(fields)) => {
                d.fields = Some(Self::parse_map(path, fields)?);
            }
            (FieldType::Object, _, None) => {
                return Err(DescriptorError::new(path, "object fields require 'fields'"));
            }
            (_, None, None) => {}
            (_, Some(_), _) => {
                return Err(DescriptorError::new(path, "'of' is only valid on array fields"));
            }
            (_, _, Some(_)) => {
                return Err(DescriptorError::new(
                    path,
                    "'fields' is only valid on object fields",
                ));
            }
        }

        if let Some(values) = obj.get("enum") {
            if !matches!(field_type, FieldType::String | FieldType::Number) {
                return Err(DescriptorError::new(
                    path,
                    "'enum' is only supported on string and number fields",
                ));
            }
            let values = values
                .as_array()
                .ok_or_else(|| DescriptorError::new(path, "'enum' must be an array"))?;
            if values.is_empty() {
                return Err(DescriptorError::new(path, "'enum' cannot be empty"));
            }
            let cast = values
                .iter()
                .map(|v| cast_scalar(field_type, v))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| DescriptorError::new(path, format!("invalid enum value: {}", e)))?;
            d.enum_values = Some(cast);
        }

        d.min = bound_key(path, obj, "min", field_type)?;
        d.max = bound_key(path, obj, "max", field_type)?;
        if let (Some(min), Some(max)) = (&d.min, &d.max) {
            if compare_bounds(field_type, min, max) == Some(std::cmp::Ordering::Greater) {
                return Err(DescriptorError::new(path, "'min' is greater than 'max'"));
            }
        }

        d.min_length = length_key(path, obj, "minLength", field_type)?;
        d.max_length = length_key(path, obj, "maxLength", field_type)?;
        if let (Some(min), Some(max)) = (d.min_length, d.max_length) {
            if min > max {
                return Err(DescriptorError::new(
                    path,
                    "'minLength' is greater than 'maxLength'",
                ));
            }
        }

        if let Some(pattern) = obj.get("match") {
            if field_type != FieldType::String {
                return Err(DescriptorError::new(
                    path,
                    "'match' is only supported on string fields",
                ));
            }
            let pattern = pattern
                .as_str()
                .ok_or_else(|| DescriptorError::new(path, "'match' must be a string"))?;
            regex::Regex::new(pattern).map_err(|e| {
                DescriptorError::new(path, format!("invalid 'match' pattern: {}", e))
            })?;
            d.pattern = Some(pattern.to_string());
        }

        if let Some(reference) = obj.get("ref") {
            if field_type != FieldType::ObjectId {
                return Err(DescriptorError::new(
                    path,
                    "'ref' is only supported on objectId fields",
                ));
            }
            let target = reference
                .as_str()
                .ok_or_else(|| DescriptorError::new(path, "'ref' must be a string"))?;
            d.reference = Some(
                ModelName::new(target)
                    .map_err(|e| DescriptorError::new(path, format!("invalid 'ref': {}", e)))?,
            );
        }

        if let Some(default) = obj.get("default") {
            d.default = Some(d.cast_default(path, default)?);
        }

        Ok(d)
    }

    fn cast_default(&self, path: &str, value: &Value) -> Result<Value, DescriptorError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let invalid = |e: String| DescriptorError::new(path, format!("invalid 'default': {}", e));
        match self.field_type {
            FieldType::Array => {
                let items = value
                    .as_array()
                    .ok_or_else(|| invalid("expected an array".to_string()))?;
                let element = self.of.as_deref();
                let cast = items
                    .iter()
                    .map(|item| match element {
                        Some(el) if el.field_type.is_scalar() => {
                            cast_scalar(el.field_type, item)
                        }
                        _ => Ok(item.clone()),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(invalid)?;
                Ok(Value::Array(cast))
            }
            FieldType::Object => {
                if value.is_object() {
                    Ok(value.clone())
                } else {
                    Err(invalid("expected an object".to_string()))
                }
            }
            scalar => {
                let cast = cast_scalar(scalar, value).map_err(invalid)?;
                if let Some(allowed) = &self.enum_values {
                    if !allowed.contains(&cast) {
                        return Err(invalid(format!("{} is not in 'enum'", cast)));
                    }
                }
                Ok(cast)
            }
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn validate_field_name(path: &str, name: &str) -> Result<(), DescriptorError> {
    if name.is_empty() {
        return Err(DescriptorError::new(path, "field name cannot be empty"));
    }
    if name.starts_with('$') || name.contains('.') {
        return Err(DescriptorError::new(
            path,
            "field names cannot start with '$' or contain '.'",
        ));
    }
    if name == DocumentFields::ID || name == DocumentFields::VERSION {
        return Err(DescriptorError::new(
            path,
            format!("'{}' is managed by the model and cannot be declared", name),
        ));
    }
    Ok(())
}

fn parse_tag(path: &str, tag: &str) -> Result<FieldType, DescriptorError> {
    FieldType::from_tag(tag).ok_or_else(|| {
        DescriptorError::new(
            path,
            format!(
                "unknown field type '{}' (supported: {})",
                tag,
                FieldType::supported_tags()
            ),
        )
    })
}

fn bool_key(path: &str, obj: &Map<String, Value>, key: &str) -> Result<bool, DescriptorError> {
    match obj.get(key) {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(DescriptorError::new(path, format!("'{}' must be a boolean", key))),
    }
}

fn bound_key(
    path: &str,
    obj: &Map<String, Value>,
    key: &str,
    field_type: FieldType,
) -> Result<Option<Value>, DescriptorError> {
    let Some(raw) = obj.get(key) else {
        return Ok(None);
    };
    match field_type {
        FieldType::Number => match raw {
            Value::Number(_) => Ok(Some(raw.clone())),
            _ => Err(DescriptorError::new(path, format!("'{}' must be a number", key))),
        },
        FieldType::Date => cast_scalar(FieldType::Date, raw)
            .map(Some)
            .map_err(|e| DescriptorError::new(path, format!("invalid '{}': {}", key, e))),
        _ => Err(DescriptorError::new(
            path,
            format!("'{}' is only supported on number and date fields", key),
        )),
    }
}

fn length_key(
    path: &str,
    obj: &Map<String, Value>,
    key: &str,
    field_type: FieldType,
) -> Result<Option<u64>, DescriptorError> {
    let Some(raw) = obj.get(key) else {
        return Ok(None);
    };
    if field_type != FieldType::String {
        return Err(DescriptorError::new(
            path,
            format!("'{}' is only supported on string fields", key),
        ));
    }
    raw.as_u64().map(Some).ok_or_else(|| {
        DescriptorError::new(path, format!("'{}' must be a non-negative integer", key))
    })
}

/// Orders two bound values of the given type. `None` when incomparable.
pub fn compare_bounds(field_type: FieldType, a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match field_type {
        FieldType::Number => a.as_f64()?.partial_cmp(&b.as_f64()?),
        FieldType::Date => Some(parse_date(a)?.cmp(&parse_date(b)?)),
        _ => None,
    }
}
