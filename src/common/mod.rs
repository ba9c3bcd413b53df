//! Common utilities and types shared across minifs

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod tracing_middleware;
pub mod utils;

pub use config::{Config, CoordinatorConfig, VolumeConfig};
pub use error::{Error, Result};
pub use lifecycle::{Instance, LifecycleState};
pub use utils::{check_file_name, encode_key, format_bytes, shard_name, validate_node_id, NODE_ID_LEN};
