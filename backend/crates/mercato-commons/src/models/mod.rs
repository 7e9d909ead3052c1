//! Domain models shared across crates.

pub mod document_id;
pub mod model_name;
pub mod schemas;

pub use document_id::DocumentId;
pub use model_name::ModelName;
