//! Asset catalog collaborator.
//!
//! The protocol only moves asset *indices* around. What an index stands
//! for (name, artwork) lives in an external catalog; an index the catalog
//! does not know is a normal condition, not an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tradepost_types::AssetIndex;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub index: AssetIndex,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Resolves asset indices to metadata.
pub trait CatalogResolver: Send + Sync {
    fn resolve(&self, index: AssetIndex) -> Option<AssetMetadata>;

    /// Size of the index space; valid indices are `0..catalog_size()`.
    fn catalog_size(&self) -> u32;
}

/// An in-process catalog: every index in range resolves, either to an
/// explicit entry or to a generated placeholder name.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    size: u32,
    entries: HashMap<AssetIndex, AssetMetadata>,
}

impl StaticCatalog {
    /// A catalog of `size` assets named `Asset #0`, `Asset #1`, ...
    pub fn numbered(size: u32) -> Self {
        Self {
            size,
            entries: HashMap::new(),
        }
    }

    /// Override the metadata for one index.
    pub fn with_entry(mut self, metadata: AssetMetadata) -> Self {
        self.entries.insert(metadata.index, metadata);
        self
    }
}

impl CatalogResolver for StaticCatalog {
    fn resolve(&self, index: AssetIndex) -> Option<AssetMetadata> {
        if index.get() >= self.size {
            return None;
        }
        Some(self.entries.get(&index).cloned().unwrap_or(AssetMetadata {
            index,
            name: format!("Asset {index}"),
            image_url: None,
        }))
    }

    fn catalog_size(&self) -> u32 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_catalog_resolves_in_range_only() {
        let catalog = StaticCatalog::numbered(3);
        assert_eq!(catalog.resolve(AssetIndex::new(2)).unwrap().name, "Asset #2");
        assert!(catalog.resolve(AssetIndex::new(3)).is_none());
        assert_eq!(catalog.catalog_size(), 3);
    }

    #[test]
    fn explicit_entry_wins() {
        let catalog = StaticCatalog::numbered(5).with_entry(AssetMetadata {
            index: AssetIndex::new(1),
            name: "Golden Owl".into(),
            image_url: Some("https://img.example/owl.png".into()),
        });
        assert_eq!(catalog.resolve(AssetIndex::new(1)).unwrap().name, "Golden Owl");
        assert_eq!(catalog.resolve(AssetIndex::new(0)).unwrap().name, "Asset #0");
    }
}
