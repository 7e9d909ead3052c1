//! Schema description types for dynamic models.
//!
//! A [`SchemaDefinition`] is what the registry persists. Its field map is made of
//! [`FieldDescriptor`]s whose [`FieldType`] comes from a closed set; anything the
//! parser does not recognize is rejected before it can be compiled into a model.

pub mod cast;
pub mod field_descriptor;
pub mod field_type;
pub mod schema_definition;
pub mod schema_options;

pub use field_descriptor::{FieldDescriptor, FieldMap};
pub use field_type::FieldType;
pub use schema_definition::SchemaDefinition;
pub use schema_options::SchemaOptions;
