//! Write and read orchestration
//!
//! Writes reserve a placement for the filename, split the payload and fan the
//! shards out to their nodes: K-1 shards on spawned tasks, the last one on the
//! calling task. A write succeeds only if every shard transfer succeeds. On
//! failure nothing is rolled back: the placement entry stays and shards that
//! made it to their nodes stay there.
//!
//! Reads fetch shards one after another in index order and stop at the first
//! failure.

use crate::common::{check_file_name, shard_name, Error, Result};
use crate::coordinator::metadata::{FileTable, PlacementEntry};
use crate::coordinator::node_client::NodeClient;
use crate::coordinator::registry::{NodeId, NodeRegistry};
use crate::coordinator::shard::split_payload;
use crate::coordinator::SHARD_COUNT;
use bytes::{Bytes, BytesMut};
use std::net::SocketAddr;
use std::sync::Arc;

pub struct Orchestrator {
    registry: Arc<NodeRegistry>,
    files: Arc<FileTable>,
    client: NodeClient,
}

/// One shard on its way to a node
struct ShardTransfer {
    index: usize,
    node: NodeId,
    addr: SocketAddr,
    name: String,
    data: Bytes,
}

impl Orchestrator {
    pub fn new(registry: Arc<NodeRegistry>, files: Arc<FileTable>, client: NodeClient) -> Self {
        Self {
            registry,
            files,
            client,
        }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn files(&self) -> &Arc<FileTable> {
        &self.files
    }

    fn address_of(&self, id: &NodeId) -> Result<SocketAddr> {
        self.registry
            .address(id)
            .ok_or_else(|| Error::Internal(format!("placed node {} is not registered", id)))
    }

    /// Store `payload` under `filename`.
    pub async fn write(&self, filename: &str, payload: Bytes) -> Result<()> {
        check_file_name(filename)?;

        let shards = split_payload(&payload, SHARD_COUNT);
        let entry = self.files.reserve(filename, || {
            let nodes = self.registry.reserve_placement(SHARD_COUNT)?;
            Ok(PlacementEntry {
                nodes,
                shards: shards.len(),
                size: payload.len() as u64,
            })
        })?;

        tracing::debug!(
            filename,
            size = payload.len(),
            shards = entry.shards,
            nodes = ?entry.nodes,
            "placement reserved"
        );

        let mut transfers = Vec::with_capacity(shards.len());
        for ((index, node), data) in entry.shard_nodes().zip(shards) {
            transfers.push(ShardTransfer {
                index,
                node: node.clone(),
                addr: self.address_of(node)?,
                name: shard_name(filename, index),
                data,
            });
        }
        let total = transfers.len();

        // The last shard is sent from this task, the rest fan out.
        let own = transfers.pop();
        let handles: Vec<_> = transfers
            .into_iter()
            .map(|t| {
                let client = self.client.clone();
                tokio::spawn(async move { send_shard(&client, t).await })
            })
            .collect();

        let own_result = match own {
            Some(t) => send_shard(&self.client, t).await,
            None => Ok(()),
        };

        let mut results: Vec<Result<()>> = futures_util::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| Err(Error::Internal(format!("shard task failed: {}", e))))
            })
            .collect();
        results.push(own_result);

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            tracing::error!(filename, failed, total, "cant save file");
            return Err(Error::PartialWrite { failed, total });
        }

        tracing::info!(filename, size = payload.len(), shards = total, "file stored");
        Ok(())
    }

    /// Reassemble the file stored under `filename`.
    pub async fn read(&self, filename: &str) -> Result<Bytes> {
        check_file_name(filename)?;

        let entry = self
            .files
            .get(filename)
            .ok_or_else(|| Error::NotFound(filename.to_string()))?;

        let mut buf = BytesMut::with_capacity(entry.size as usize);
        for (index, node) in entry.shard_nodes() {
            let addr = self.address_of(node)?;
            let name = shard_name(filename, index);
            let data = self.client.get_shard(addr, &name).await.map_err(|e| {
                tracing::error!(
                    shard = index,
                    node = %node,
                    addr = %addr,
                    error = %e,
                    "load shard"
                );
                Error::ShardFetch {
                    shard: index,
                    node: addr.to_string(),
                    reason: e.to_string(),
                }
            })?;
            buf.extend_from_slice(&data);
        }

        Ok(buf.freeze())
    }
}

async fn send_shard(client: &NodeClient, t: ShardTransfer) -> Result<()> {
    let size = t.data.len();
    client.put_shard(t.addr, &t.name, t.data).await.map_err(|e| {
        tracing::error!(
            shard = t.index,
            shard_size = size,
            node = %t.node,
            addr = %t.addr,
            error = %e,
            "save shard"
        );
        Error::ShardTransfer {
            shard: t.index,
            node: t.addr.to_string(),
            reason: e.to_string(),
        }
    })
}
