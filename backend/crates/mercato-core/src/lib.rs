// Mercato Core Library
//
// Runtime-defined document models: the schema registry that persists their
// definitions, the model cache that holds compiled handles, and the document
// operations those handles expose.

pub mod app_context;
pub mod error;
pub mod schema_registry;
pub mod test_helpers;

pub use app_context::AppContext;
pub use error::{MercatoError, Result, StorageFailureKind, ValidationIssue};
pub use schema_registry::{CacheStats, CompiledModel, ModelCache, ModelHandle, SchemaRegistry};
