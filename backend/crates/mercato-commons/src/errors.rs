//! Shared error types for Mercato.
//!
//! These carry no external dependencies so every crate can return them.

use std::fmt;

/// Common error type for validation of shared domain values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Invalid input provided to a constructor or parser
    InvalidInput(String),

    /// Resource not found
    NotFound(String),

    /// Resource already exists
    AlreadyExists(String),
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommonError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CommonError::NotFound(msg) => write!(f, "Not found: {}", msg),
            CommonError::AlreadyExists(msg) => write!(f, "Already exists: {}", msg),
        }
    }
}

impl std::error::Error for CommonError {}

/// Rejection of a caller-supplied field descriptor or schema option.
///
/// `path` is the dotted location of the offending descriptor (`address.city`,
/// `tags.of`), or `options` for option errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorError {
    pub path: String,
    pub message: String,
}

impl DescriptorError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.path, self.message)
    }
}

impl std::error::Error for DescriptorError {}
