//! Coordinator implementation
//!
//! The coordinator is responsible for:
//! - Node registry (storage node announcements)
//! - Placement decisions (rotating cursor, randomized stride)
//! - Write orchestration (K-way split, concurrent fan-out)
//! - Read orchestration (sequential fan-in)

pub mod http;
pub mod metadata;
pub mod node_client;
pub mod orchestrator;
pub mod placement;
pub mod registry;
pub mod server;
pub mod shard;

pub use server::Coordinator;

/// Shards per file, and the number of registered nodes required to admit a write
pub const SHARD_COUNT: usize = 5;
