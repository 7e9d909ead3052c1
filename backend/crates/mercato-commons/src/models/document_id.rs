//! Identity of a dynamic document.

use crate::storage_key::StorageKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a stored document (the `_id` field).
///
/// Generated ids are UUID v7 strings, so storage-key order follows insertion
/// time. Caller-supplied ids (models with `identityField: false`) may be any
/// non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh time-ordered id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Returns true when the id has the generated (UUID) form.
    pub fn is_generated_form(value: &str) -> bool {
        uuid::Uuid::parse_str(value).is_ok()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl StorageKey for DocumentId {
    fn storage_key(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    fn from_storage_key(bytes: &[u8]) -> Result<Self, String> {
        String::from_utf8(bytes.to_vec())
            .map(Self)
            .map_err(|e| e.to_string())
    }
}
