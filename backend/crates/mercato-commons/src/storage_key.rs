//! Storage key trait for type-safe key serialization.
//!
//! Every key used with an `EntityStore` implements this trait so the byte form
//! written to the storage engine is explicit rather than derived from `AsRef`.
//! Keys are plain UTF-8, so lexicographic byte order equals string order.

/// Trait for keys that can be serialized for storage.
pub trait StorageKey: Clone + Send + Sync + 'static {
    /// Serialize the key to storage bytes.
    fn storage_key(&self) -> Vec<u8>;

    /// Rebuild the key from storage bytes.
    fn from_storage_key(bytes: &[u8]) -> Result<Self, String>;
}

impl StorageKey for String {
    fn storage_key(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn from_storage_key(bytes: &[u8]) -> Result<Self, String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| format!("invalid utf-8 key: {}", e))
    }
}
