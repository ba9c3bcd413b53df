//! # minifs
//!
//! A minimal distributed flat-file store:
//! - One coordinator accepts whole files over HTTP
//! - Each file is split into 5 contiguous shards
//! - Shards are spread over independently registered storage nodes
//! - Reads fetch the shards back in order and concatenate them
//!
//! ## Architecture
//!
//! ```text
//!            PUT/GET /?filename=...
//!                     │
//! ┌───────────────────▼─────────────────────┐
//! │              Coordinator                │
//! │  - node registry (POST /register)       │
//! │  - placement: rotating cursor + stride  │
//! │  - file table: name → 5 nodes           │
//! └───────────┬─────────────────────────────┘
//!             │ PUT/GET /?filename=<name>.NN
//!   ┌─────────┴──────────┬──────────────┐
//!   │                    │              │
//! ┌─▼──────────┐   ┌─────▼──────┐   ┌──▼───────────┐
//! │ Node 0001  │   │ Node 0002  │   │ Node 0003 …  │
//! │ (dir/)     │   │ (dir/)     │   │ (dir/)       │
//! └────────────┘   └────────────┘   └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start a coordinator
//! ```bash
//! minifs-coord serve --bind 127.0.0.1:8888
//! ```
//!
//! ### Start storage nodes (at least 5)
//! ```bash
//! minifs-volume --id 0001 --addr 127.0.0.1:8101 \
//!   --data-dir ./node-1 --coordinator http://127.0.0.1:8888
//! ```
//!
//! ### Use the CLI
//! ```bash
//! minifs put report.pdf --file ./report.pdf
//! minifs get report.pdf --output ./copy.pdf
//! minifs status
//! ```

pub mod client;
pub mod common;
pub mod coordinator;
pub mod volume;

// Re-export commonly used types
pub use client::FileClient;
pub use common::{Config, Error, Instance, LifecycleState, Result};
pub use coordinator::{Coordinator, SHARD_COUNT};
pub use volume::VolumeServer;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
