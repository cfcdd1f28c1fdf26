//! Asset index type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An index into the external asset catalog; the tradable unit.
///
/// The catalog is owned elsewhere and may grow or shrink, so an index that
/// the catalog cannot resolve is a normal condition, not a protocol fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetIndex(u32);

impl AssetIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Big-endian key bytes, so LMDB iteration order matches numeric order.
    pub fn to_be_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for AssetIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for AssetIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
