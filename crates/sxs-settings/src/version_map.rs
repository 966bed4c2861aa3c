use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sxs_core::VersionKey;

/// Last known project path per exact editor version.
///
/// Sorted storage keeps the serialized form stable across saves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionPathMap {
    paths: BTreeMap<String, String>,
}

impl VersionPathMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &VersionKey) -> Option<&str> {
        self.paths.get(&key.to_string()).map(String::as_str)
    }

    /// Inserts or overwrites; returns the previous path for the key.
    pub fn upsert(&mut self, key: &VersionKey, path: impl Into<String>) -> Option<String> {
        self.paths.insert(key.to_string(), path.into())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FromIterator<(String, String)> for VersionPathMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}
