//! API data models
//!
//! Request bodies and the response envelope shared by every endpoint.

pub mod api_response;
pub mod list_query;
pub mod schema_request;

pub use api_response::{ApiResponse, ErrorDetail};
pub use list_query::ListQuery;
pub use schema_request::{CreateSchemaRequest, UpdateSchemaRequest};
