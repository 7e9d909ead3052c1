//! Document casting and validation against a compiled field table.
//!
//! Every problem in a document is collected before reporting, so a caller gets
//! one `ValidationIssue` per offending path rather than the first failure only.

use crate::error::{MercatoError, ValidationIssue};
use mercato_commons::models::schemas::cast::cast_scalar;
use mercato_commons::models::schemas::field_descriptor::compare_bounds;
use mercato_commons::{DocumentFields, FieldDescriptor, FieldMap, FieldType, SchemaOptions};
use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A field descriptor with its pattern compiled and children resolved.
#[derive(Debug, Clone)]
pub(crate) struct CompiledField {
    pub descriptor: FieldDescriptor,
    pattern: Option<Regex>,
    element: Option<Box<CompiledField>>,
    members: Option<BTreeMap<String, CompiledField>>,
}

impl CompiledField {
    fn compile(path: &str, descriptor: &FieldDescriptor) -> Result<Self, MercatoError> {
        let pattern = match &descriptor.pattern {
            Some(p) => Some(Regex::new(p).map_err(|e| {
                mercato_commons::DescriptorError::new(path, format!("invalid 'match': {}", e))
            })?),
            None => None,
        };
        let element = match &descriptor.of {
            Some(of) => Some(Box::new(Self::compile(&format!("{}.of", path), of)?)),
            None => None,
        };
        let members = match &descriptor.fields {
            Some(fields) => Some(compile_fields(path, fields)?),
            None => None,
        };
        Ok(Self {
            descriptor: descriptor.clone(),
            pattern,
            element,
            members,
        })
    }
}

/// Compiles a field map. `prefix` is the dotted path of the enclosing object.
pub(crate) fn compile_fields(
    prefix: &str,
    fields: &FieldMap,
) -> Result<BTreeMap<String, CompiledField>, MercatoError> {
    fields
        .iter()
        .map(|(name, descriptor)| {
            let path = join(prefix, name);
            CompiledField::compile(&path, descriptor).map(|f| (name.clone(), f))
        })
        .collect()
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Casts and validates the caller fields of `input`.
///
/// Managed fields (`_id`, `__v`, timestamps) are skipped; the caller sets
/// them. Returns the cast document, declared fields first sorted by name,
/// followed by undeclared fields when `strict` is off.
pub(crate) fn cast_document(
    fields: &BTreeMap<String, CompiledField>,
    options: &SchemaOptions,
    input: &Map<String, Value>,
    issues: &mut Vec<ValidationIssue>,
) -> Map<String, Value> {
    let mut out = cast_object("", fields, options.strict, input, issues, |name| {
        name == DocumentFields::ID
            || (options.versioned && name == DocumentFields::VERSION)
            || (options.timestamps
                && (name == DocumentFields::CREATED_AT || name == DocumentFields::UPDATED_AT))
    });
    if options.minimize_empty {
        minimize(&mut out);
    }
    out
}

fn cast_object(
    prefix: &str,
    fields: &BTreeMap<String, CompiledField>,
    strict: bool,
    input: &Map<String, Value>,
    issues: &mut Vec<ValidationIssue>,
    is_managed: impl Fn(&str) -> bool,
) -> Map<String, Value> {
    let mut out = Map::new();

    for (name, field) in fields {
        let path = join(prefix, name);
        let raw = match input.get(name) {
            Some(v) if !v.is_null() => Some(v.clone()),
            _ => default_for(field),
        };

        let value = match raw {
            Some(v) => cast_value(&path, field, &v, strict, issues),
            None => None,
        };

        if field.descriptor.required && is_blank(value.as_ref()) {
            // A failed cast has already been reported for this path.
            if !issues.iter().any(|i| i.path == path) {
                issues.push(ValidationIssue::new(
                    &path,
                    format!("Path `{}` is required.", path),
                ));
            }
            continue;
        }

        if let Some(v) = value {
            out.insert(name.clone(), v);
        }
    }

    for (name, value) in input {
        if fields.contains_key(name) || is_managed(name) {
            continue;
        }
        if strict {
            let path = join(prefix, name);
            issues.push(ValidationIssue::new(
                &path,
                format!("Field `{}` is not in schema and strict mode is enabled.", path),
            ));
        } else {
            out.insert(name.clone(), value.clone());
        }
    }

    out
}

/// Drops keys `fields` no longer declares, including inside nested objects
/// and arrays of objects.
pub(crate) fn retain_declared(
    fields: &BTreeMap<String, CompiledField>,
    doc: &mut Map<String, Value>,
) {
    doc.retain(|name, _| fields.contains_key(name));
    for (name, field) in fields {
        if let Some(value) = doc.get_mut(name) {
            retain_in_value(field, value);
        }
    }
}

fn retain_in_value(field: &CompiledField, value: &mut Value) {
    match value {
        Value::Object(obj) => {
            if let Some(members) = &field.members {
                retain_declared(members, obj);
            }
        }
        Value::Array(items) => {
            if let Some(element) = field.element.as_deref() {
                for item in items {
                    retain_in_value(element, item);
                }
            }
        }
        _ => {}
    }
}

fn default_for(field: &CompiledField) -> Option<Value> {
    match &field.descriptor.default {
        Some(Value::Null) | None => {
            if field.descriptor.field_type == FieldType::Array {
                Some(Value::Array(Vec::new()))
            } else {
                None
            }
        }
        Some(v) => Some(v.clone()),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn cast_value(
    path: &str,
    field: &CompiledField,
    value: &Value,
    strict: bool,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Value> {
    match field.descriptor.field_type {
        FieldType::Array => {
            let Some(items) = value.as_array() else {
                issues.push(ValidationIssue::new(
                    path,
                    format!("Cast to array failed for value {}", value),
                ));
                return None;
            };
            let Some(element) = field.element.as_deref() else {
                return Some(value.clone());
            };
            let before = issues.len();
            let cast: Vec<Value> = items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    let item_path = format!("{}.{}", path, i);
                    if item.is_null() {
                        return Some(Value::Null);
                    }
                    cast_value(&item_path, element, item, strict, issues)
                })
                .collect();
            (issues.len() == before).then_some(Value::Array(cast))
        }
        FieldType::Object => {
            let Some(obj) = value.as_object() else {
                issues.push(ValidationIssue::new(
                    path,
                    format!("Cast to object failed for value {}", value),
                ));
                return None;
            };
            let members = field.members.as_ref()?;
            let before = issues.len();
            let cast = cast_object(path, members, strict, obj, issues, |_| false);
            (issues.len() == before).then_some(Value::Object(cast))
        }
        scalar => match cast_scalar(scalar, value) {
            Ok(cast) => {
                let before = issues.len();
                check_scalar(path, field, &cast, issues);
                (issues.len() == before).then_some(cast)
            }
            Err(msg) => {
                issues.push(ValidationIssue::new(path, msg));
                None
            }
        },
    }
}

fn check_scalar(
    path: &str,
    field: &CompiledField,
    value: &Value,
    issues: &mut Vec<ValidationIssue>,
) {
    let d = &field.descriptor;

    if let Some(allowed) = &d.enum_values {
        if !allowed.contains(value) {
            issues.push(ValidationIssue::new(
                path,
                format!("`{}` is not a valid enum value for path `{}`.", display(value), path),
            ));
        }
    }

    if let Some(min) = &d.min {
        if compare_bounds(d.field_type, value, min) == Some(Ordering::Less) {
            issues.push(ValidationIssue::new(
                path,
                format!(
                    "Path `{}` ({}) is less than minimum allowed value ({}).",
                    path,
                    display(value),
                    display(min)
                ),
            ));
        }
    }

    if let Some(max) = &d.max {
        if compare_bounds(d.field_type, value, max) == Some(Ordering::Greater) {
            issues.push(ValidationIssue::new(
                path,
                format!(
                    "Path `{}` ({}) is more than maximum allowed value ({}).",
                    path,
                    display(value),
                    display(max)
                ),
            ));
        }
    }

    if let Value::String(s) = value {
        let len = s.chars().count() as u64;
        if let Some(min) = d.min_length {
            if len < min {
                issues.push(ValidationIssue::new(
                    path,
                    format!(
                        "Path `{}` (`{}`) is shorter than the minimum allowed length ({}).",
                        path, s, min
                    ),
                ));
            }
        }
        if let Some(max) = d.max_length {
            if len > max {
                issues.push(ValidationIssue::new(
                    path,
                    format!(
                        "Path `{}` (`{}`) is longer than the maximum allowed length ({}).",
                        path, s, max
                    ),
                ));
            }
        }
        if let Some(re) = &field.pattern {
            if !re.is_match(s) {
                issues.push(ValidationIssue::new(
                    path,
                    format!("Path `{}` is invalid ({}).", path, s),
                ));
            }
        }
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Removes empty nested objects, innermost first.
pub(crate) fn minimize(obj: &mut Map<String, Value>) {
    obj.retain(|_, value| {
        if let Value::Object(inner) = value {
            minimize(inner);
            !inner.is_empty()
        } else {
            true
        }
    });
}
