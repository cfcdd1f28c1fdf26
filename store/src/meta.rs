//! Metadata storage trait.

use crate::StoreError;

/// Trait for storing database metadata (schema version and similar).
///
/// A generic key-value store for internal bookkeeping that doesn't belong
/// in any domain-specific store.
pub trait MetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// `StoreError::NotFound` if the key is absent.
    fn get_meta(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Get the current database schema version; 0 for a fresh database.
    fn get_schema_version(&self) -> Result<u32, StoreError>;

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;
}
