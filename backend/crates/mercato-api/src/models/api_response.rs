//! Response envelope
//!
//! Every endpoint answers with the same shape:
//!
//! ```json
//! {
//!   "error": false,
//!   "data": {"_id": "0190...", "name": "foo"},
//!   "errors": [],
//!   "status_code": 200,
//!   "message": "Widget created"
//! }
//! ```
//!
//! On failure `error` is true, `data` is null and `errors` lists one entry per
//! rejected field when the failure was a document validation.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use mercato_core::{MercatoError, StorageFailureKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub error: bool,
    pub data: Value,
    pub errors: Vec<ErrorDetail>,
    pub status_code: u16,
    pub message: String,
}

/// One field-level problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub path: String,
    pub message: String,
}

impl ApiResponse {
    /// 200 response carrying `data`.
    pub fn ok(data: impl Serialize, message: impl Into<String>) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                error: false,
                data,
                errors: Vec::new(),
                status_code: StatusCode::OK.as_u16(),
                message: message.into(),
            },
            Err(e) => Self::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode response: {}", e),
                Vec::new(),
            ),
        }
    }

    pub fn failure(status: StatusCode, message: impl Into<String>, errors: Vec<ErrorDetail>) -> Self {
        Self {
            error: true,
            data: Value::Null,
            errors,
            status_code: status.as_u16(),
            message: message.into(),
        }
    }

    /// Maps a core error to its status code and envelope.
    pub fn from_error(err: &MercatoError) -> Self {
        let errors = match err {
            MercatoError::StorageFailure { issues, .. } => issues
                .iter()
                .map(|i| ErrorDetail {
                    path: i.path.clone(),
                    message: i.message.clone(),
                })
                .collect(),
            MercatoError::InvalidFieldDescriptor(e) => vec![ErrorDetail {
                path: e.path.clone(),
                message: e.message.clone(),
            }],
            _ => Vec::new(),
        };
        Self::failure(status_for(err), err.to_string(), errors)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn into_response(self) -> HttpResponse {
        HttpResponse::build(self.status()).json(self)
    }
}

/// HTTP status for each error kind.
pub fn status_for(err: &MercatoError) -> StatusCode {
    match err {
        MercatoError::DefinitionNotFound(_) | MercatoError::DocumentNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        MercatoError::DuplicateDefinition(_)
        | MercatoError::CollectionCollision { .. }
        | MercatoError::InvalidFieldDescriptor(_)
        | MercatoError::InvalidModelName(_) => StatusCode::BAD_REQUEST,
        MercatoError::StorageFailure { kind, .. } => match kind {
            StorageFailureKind::Validation | StorageFailureKind::UniqueViolation => {
                StatusCode::BAD_REQUEST
            }
            StorageFailureKind::VersionConflict => StatusCode::CONFLICT,
            StorageFailureKind::Backend => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

impl From<MercatoError> for ApiResponse {
    fn from(err: MercatoError) -> Self {
        Self::from_error(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercato_core::ValidationIssue;
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&MercatoError::DefinitionNotFound("A".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&MercatoError::DuplicateDefinition("A".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&MercatoError::storage(StorageFailureKind::VersionConflict, "v")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&MercatoError::storage(StorageFailureKind::Backend, "io")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_envelope() {
        let err = MercatoError::validation(
            "Widget",
            vec![ValidationIssue::new("name", "Path `name` is required.")],
        );
        let body = serde_json::to_value(ApiResponse::from_error(&err)).unwrap();
        assert_eq!(
            body,
            json!({
                "error": true,
                "data": null,
                "errors": [{"path": "name", "message": "Path `name` is required."}],
                "status_code": 400,
                "message": "Validation failure: Widget validation failed: name: Path `name` is required."
            })
        );
    }

    #[test]
    fn test_success_envelope() {
        let body = serde_json::to_value(ApiResponse::ok(json!({"a": 1}), "done")).unwrap();
        assert_eq!(body["error"], json!(false));
        assert_eq!(body["data"], json!({"a": 1}));
        assert_eq!(body["status_code"], json!(200));
        assert_eq!(body["errors"], json!([]));
    }
}
