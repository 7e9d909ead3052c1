// Error types module
use mercato_commons::{CommonError, DescriptorError};
use mercato_store::StorageError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MercatoError>;

/// Main error type for Mercato
#[derive(Error, Debug, Clone)]
pub enum MercatoError {
    #[error("Schema definition already exists: {0}")]
    DuplicateDefinition(String),

    #[error("Collection '{collection}' already exists (model '{model_name}')")]
    CollectionCollision {
        model_name: String,
        collection: String,
    },

    #[error("Schema definition not found: {0}")]
    DefinitionNotFound(String),

    #[error("Document not found: {model_name}/{id}")]
    DocumentNotFound { model_name: String, id: String },

    #[error("{kind} failure: {message}")]
    StorageFailure {
        kind: StorageFailureKind,
        message: String,
        /// Per-field problems, for validation failures
        issues: Vec<ValidationIssue>,
    },

    #[error("Invalid field descriptor {0}")]
    InvalidFieldDescriptor(#[from] DescriptorError),

    #[error("Invalid model name: {0}")]
    InvalidModelName(String),
}

/// What kind of storage-side failure a `StorageFailure` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageFailureKind {
    /// The document does not satisfy the model's field descriptors
    Validation,
    /// A `unique` field or `_id` already exists in the collection
    UniqueViolation,
    /// The supplied `__v` does not match the stored document
    VersionConflict,
    /// Underlying I/O or serialization failure
    Backend,
}

impl fmt::Display for StorageFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StorageFailureKind::Validation => "Validation",
            StorageFailureKind::UniqueViolation => "Unique constraint",
            StorageFailureKind::VersionConflict => "Version conflict",
            StorageFailureKind::Backend => "Storage",
        };
        f.write_str(label)
    }
}

/// One rejected field of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl MercatoError {
    /// Validation failure carrying every issue found in one document.
    pub fn validation(model_name: &str, issues: Vec<ValidationIssue>) -> Self {
        let summary = issues
            .iter()
            .map(|i| format!("{}: {}", i.path, i.message))
            .collect::<Vec<_>>()
            .join(", ");
        MercatoError::StorageFailure {
            kind: StorageFailureKind::Validation,
            message: format!("{} validation failed: {}", model_name, summary),
            issues,
        }
    }

    pub fn storage(kind: StorageFailureKind, message: impl Into<String>) -> Self {
        MercatoError::StorageFailure {
            kind,
            message: message.into(),
            issues: Vec::new(),
        }
    }

    /// Failure kind, when this is a `StorageFailure`.
    pub fn failure_kind(&self) -> Option<StorageFailureKind> {
        match self {
            MercatoError::StorageFailure { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MercatoError::DefinitionNotFound(_) | MercatoError::DocumentNotFound { .. }
        )
    }
}

impl From<StorageError> for MercatoError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UniqueConstraintViolation(msg) => {
                MercatoError::storage(StorageFailureKind::UniqueViolation, msg)
            }
            other => MercatoError::storage(StorageFailureKind::Backend, other.to_string()),
        }
    }
}

impl From<CommonError> for MercatoError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::InvalidInput(msg) => MercatoError::InvalidModelName(msg),
            CommonError::NotFound(msg) => MercatoError::DefinitionNotFound(msg),
            CommonError::AlreadyExists(msg) => MercatoError::DuplicateDefinition(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_mapping() {
        let err: MercatoError = StorageError::IoError("disk full".to_string()).into();
        assert_eq!(err.failure_kind(), Some(StorageFailureKind::Backend));
        assert_eq!(err.to_string(), "Storage failure: I/O error: disk full");

        let err: MercatoError = StorageError::UniqueConstraintViolation("_id".to_string()).into();
        assert_eq!(err.failure_kind(), Some(StorageFailureKind::UniqueViolation));
    }

    #[test]
    fn test_validation_message_lists_issues() {
        let err = MercatoError::validation(
            "Widget",
            vec![
                ValidationIssue::new("name", "Path `name` is required."),
                ValidationIssue::new("price", "Cast to number failed for value \"x\""),
            ],
        );
        assert_eq!(err.failure_kind(), Some(StorageFailureKind::Validation));
        assert_eq!(
            err.to_string(),
            "Validation failure: Widget validation failed: name: Path `name` is required., \
             price: Cast to number failed for value \"x\""
        );
    }

    #[test]
    fn test_descriptor_error_display() {
        let err: MercatoError = DescriptorError::new("price", "unknown field type 'money'").into();
        assert_eq!(
            err.to_string(),
            "Invalid field descriptor 'price': unknown field type 'money'"
        );
        assert!(!err.is_not_found());
    }
}
