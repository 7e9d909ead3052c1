//! Type-safe wrapper for dynamic model names.

use crate::errors::CommonError;
use crate::storage_key::StorageKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum accepted length of a model name.
pub const MAX_MODEL_NAME_LEN: usize = 64;

/// Path segments taken by fixed HTTP routes. A model under one of these names
/// could never be dispatched to its document routes.
pub const RESERVED_MODEL_NAMES: &[&str] = &["schemas", "healthz", "readyz"];

/// Name of a dynamic model.
///
/// Unlike collection names, model names are case-sensitive: `Widget` and
/// `widget` are distinct definitions (they do, however, derive the same
/// collection and therefore collide at creation time).
///
/// A valid name starts with an ASCII letter followed by ASCII alphanumerics or
/// `_`, because it is used verbatim as a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelName(String);

impl ModelName {
    /// Validates and wraps a model name.
    pub fn new(name: impl Into<String>) -> Result<Self, CommonError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), CommonError> {
        if name.is_empty() {
            return Err(CommonError::InvalidInput(
                "model name cannot be empty".to_string(),
            ));
        }
        if name.len() > MAX_MODEL_NAME_LEN {
            return Err(CommonError::InvalidInput(format!(
                "model name '{}' exceeds {} characters",
                name, MAX_MODEL_NAME_LEN
            )));
        }
        let mut chars = name.chars();
        if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Err(CommonError::InvalidInput(format!(
                "model name '{}' must start with a letter",
                name
            )));
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CommonError::InvalidInput(format!(
                "model name '{}' may only contain letters, digits and '_'",
                name
            )));
        }
        if RESERVED_MODEL_NAMES.contains(&name) {
            return Err(CommonError::InvalidInput(format!(
                "model name '{}' is reserved",
                name
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ModelName {
    type Error = CommonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ModelName {
    type Error = CommonError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ModelName> for String {
    fn from(name: ModelName) -> Self {
        name.0
    }
}

impl AsRef<str> for ModelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl StorageKey for ModelName {
    fn storage_key(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    fn from_storage_key(bytes: &[u8]) -> Result<Self, String> {
        let raw = String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())?;
        Self::new(raw).map_err(|e| e.to_string())
    }
}
