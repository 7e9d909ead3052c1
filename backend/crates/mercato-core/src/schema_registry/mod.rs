//! Schema Registry module for Mercato Core
//!
//! Persists dynamic model definitions and keeps the compiled model cache
//! consistent with them.

pub mod compiled_model;
pub mod model_cache;
pub mod persistence;
pub mod registry;
mod validator;

pub use compiled_model::{CompiledModel, ModelHandle};
pub use model_cache::{CacheStats, ModelCache};
pub use persistence::SchemaDefinitionStore;
pub use registry::SchemaRegistry;
