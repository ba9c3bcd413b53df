//! Storage node implementation
//!
//! A storage node keeps opaque named blobs in one local directory and knows
//! nothing about files, shard indices or placements. On start it announces
//! itself to the coordinator once.

pub mod blob;
pub mod http;
pub mod server;

pub use server::VolumeServer;
