//! Well-known names used across crates.

/// Partition holding every persisted `SchemaDefinition`, keyed by model name.
pub const SYSTEM_SCHEMAS_PARTITION: &str = "system_schemas";

/// Reserved document field names managed by the model layer, not the caller.
pub struct DocumentFields;

impl DocumentFields {
    /// Identity field
    pub const ID: &'static str = "_id";
    /// Optimistic version counter
    pub const VERSION: &'static str = "__v";
    /// Creation timestamp (when `timestamps` is enabled)
    pub const CREATED_AT: &'static str = "createdAt";
    /// Last update timestamp (when `timestamps` is enabled)
    pub const UPDATED_AT: &'static str = "updatedAt";

    /// Returns true when `name` is one of the managed fields.
    pub fn is_reserved(name: &str) -> bool {
        matches!(
            name,
            Self::ID | Self::VERSION | Self::CREATED_AT | Self::UPDATED_AT
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_fields() {
        assert!(DocumentFields::is_reserved("_id"));
        assert!(DocumentFields::is_reserved("__v"));
        assert!(DocumentFields::is_reserved("createdAt"));
        assert!(!DocumentFields::is_reserved("name"));
    }
}
