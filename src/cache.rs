//! Memoizes minified artifacts using the artifact identity as the key.
use std::sync::Arc;

use dashmap::DashMap;

use crate::source::Asset;

pub(crate) type Identity = usize;

pub(crate) fn identity(asset: &Asset) -> Identity {
    Arc::as_ptr(asset) as *const () as usize
}

/// Side table from artifact identity to its replacement.
///
/// Entries keep the keyed artifact alive so an identity is never
/// reused by another allocation while it is cached.
#[derive(Debug, Default)]
pub struct TransformCache {
    entries: DashMap<Identity, (Asset, Asset)>,
}

impl TransformCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Default::default()
    }

    /// Replacement recorded for an artifact.
    pub fn get(&self, asset: &Asset) -> Option<Asset> {
        self.entries
            .get(&identity(asset))
            .map(|entry| entry.value().1.clone())
    }

    /// Record the replacement for an artifact.
    ///
    /// The replacement is also registered under its own identity so
    /// meeting it again resolves to itself. An existing entry is kept.
    pub fn put(&self, original: &Asset, result: &Asset) {
        self.entries
            .entry(identity(original))
            .or_insert_with(|| (original.clone(), result.clone()));
        self.entries
            .entry(identity(result))
            .or_insert_with(|| (result.clone(), result.clone()));
    }

    /// Determine if an artifact has a recorded replacement.
    pub fn contains(&self, asset: &Asset) -> bool {
        self.entries.contains_key(&identity(asset))
    }

    /// Number of recorded identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Determine if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
