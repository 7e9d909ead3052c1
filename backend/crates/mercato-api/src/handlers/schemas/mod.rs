//! Schema administration handlers
//!
//! ## Endpoints
//! - GET /schemas - list every definition
//! - POST /schemas - create a model
//! - GET /schemas/{modelName} - read one definition
//! - PUT /schemas/{modelName} - replace fields/options, optionally rename
//! - DELETE /schemas/{modelName} - delete a definition (idempotent)

mod create;
mod delete;
mod get;
mod list;
mod update;

pub use create::create_schema_handler;
pub use delete::delete_schema_handler;
pub use get::get_schema_handler;
pub use list::list_schemas_handler;
pub use update::update_schema_handler;
