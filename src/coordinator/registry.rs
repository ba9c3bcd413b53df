//! Registry of storage nodes known to the coordinator
//!
//! Nodes are never removed: the registry keeps an insertion-ordered sequence
//! of ids (walked by the placement cursor) and an id-keyed map of addresses,
//! both behind one read-write lock together with the rotation cursor.

use crate::common::{validate_node_id, Result};
use crate::coordinator::placement;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Fixed-width storage node identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_node_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One registered storage node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub addr: SocketAddr,
}

/// Outcome of a registration call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Admitted,
    AlreadyPresent,
}

/// Point-in-time view of the registry
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    pub order: Vec<NodeId>,
    pub addrs: HashMap<NodeId, SocketAddr>,
}

struct RegistryInner {
    order: Vec<NodeId>,
    nodes: HashMap<NodeId, NodeRecord>,
    cursor: usize,
    rng: StdRng,
}

pub struct NodeRegistry {
    inner: RwLock<RegistryInner>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Registry whose placement strides come from `rng` (seed it for tests).
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                order: Vec::new(),
                nodes: HashMap::new(),
                cursor: 0,
                rng,
            }),
        }
    }

    // Entries are append-only, so a poisoned lock still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a node. Re-registering a known id is a successful no-op and
    /// keeps the address recorded first.
    pub fn register(&self, id: NodeId, addr: SocketAddr) -> Registration {
        if self.read().nodes.contains_key(&id) {
            tracing::warn!(
                node_id = %id,
                "node already registered, ignoring repeated register request"
            );
            return Registration::AlreadyPresent;
        }

        let mut inner = self.write();
        if inner.nodes.contains_key(&id) {
            return Registration::AlreadyPresent;
        }
        inner.order.push(id.clone());
        inner.nodes.insert(id.clone(), NodeRecord { id: id.clone(), addr });
        tracing::info!(node_id = %id, addr = %addr, "node registered");
        Registration::Admitted
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn address(&self, id: &NodeId) -> Option<SocketAddr> {
        self.read().nodes.get(id).map(|n| n.addr)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.read();
        RegistrySnapshot {
            order: inner.order.clone(),
            addrs: inner.nodes.iter().map(|(id, n)| (id.clone(), n.addr)).collect(),
        }
    }

    /// Registered nodes in registration order
    pub fn nodes(&self) -> Vec<NodeRecord> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.nodes.get(id).cloned())
            .collect()
    }

    /// Choose `k` nodes for a new file and advance the rotation cursor.
    ///
    /// Runs entirely under the write lock so concurrent placements never reuse
    /// a starting index.
    pub fn reserve_placement(&self, k: usize) -> Result<Vec<NodeId>> {
        let mut inner = self.write();
        let size = inner.order.len();
        let stride = placement::draw_stride(&mut inner.rng, size);
        let (cursor, picked) = placement::place(&inner.order, inner.cursor, stride, k)?;
        inner.cursor = cursor;
        Ok(picked)
    }

    pub fn cursor(&self) -> usize {
        self.read().cursor
    }
}
