//! File table: filename → shard placement
//!
//! Entries are created once, before any shard bytes leave the coordinator,
//! and are never updated or removed. The table lives in memory for the
//! lifetime of the process.

use crate::common::{Error, Result};
use crate::coordinator::registry::NodeId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Placement of one file's shards
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementEntry {
    /// `nodes[i]` holds shard `i`
    pub nodes: Vec<NodeId>,
    /// Number of shards actually written (1 for payloads shorter than K)
    pub shards: usize,
    /// Payload size in bytes
    pub size: u64,
}

impl PlacementEntry {
    /// `(shard index, node)` pairs that carry data, in index order
    pub fn shard_nodes(&self) -> impl Iterator<Item = (usize, &NodeId)> {
        self.nodes.iter().take(self.shards).enumerate()
    }
}

#[derive(Default)]
pub struct FileTable {
    files: RwLock<HashMap<String, PlacementEntry>>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &str) -> Option<PlacementEntry> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(filename)
            .cloned()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a placement for `filename` unless one already exists.
    ///
    /// The existence check runs under the read lock first and is repeated
    /// under the write lock, so of two concurrent reservations for the same
    /// new name exactly one succeeds. `place` is only called while the write
    /// lock is held and after the name is known to be free; if it fails, no
    /// entry is created.
    pub fn reserve<F>(&self, filename: &str, place: F) -> Result<PlacementEntry>
    where
        F: FnOnce() -> Result<PlacementEntry>,
    {
        if self.contains(filename) {
            return Err(Error::DuplicateFileName(filename.to_string()));
        }

        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        if files.contains_key(filename) {
            return Err(Error::DuplicateFileName(filename.to_string()));
        }
        let entry = place()?;
        files.insert(filename.to_string(), entry.clone());
        Ok(entry)
    }
}
