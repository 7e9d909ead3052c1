//! # mercato-commons
//!
//! Domain types shared by every Mercato crate.
//!
//! ## Contents
//!
//! - **Model identity**: [`ModelName`] and [`DocumentId`]
//! - **Schema description**: [`FieldType`], [`FieldDescriptor`], [`SchemaOptions`],
//!   [`SchemaDefinition`]
//! - **Storage naming**: [`collection_name_for`] derives the collection a model
//!   writes into, [`StorageKey`] turns typed ids into storage bytes
//!
//! This crate has no I/O. Parsing of caller-supplied schema JSON happens here so
//! that only the closed set of field types can ever reach a compiled model.

pub mod constants;
pub mod errors;
pub mod models;
pub mod pluralize;
pub mod storage_key;

pub use constants::{DocumentFields, SYSTEM_SCHEMAS_PARTITION};
pub use errors::{CommonError, DescriptorError};
pub use models::schemas::{
    FieldDescriptor, FieldMap, FieldType, SchemaDefinition, SchemaOptions,
};
pub use models::{DocumentId, ModelName};
pub use pluralize::collection_name_for;
pub use storage_key::StorageKey;
