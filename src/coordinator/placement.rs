//! Shard placement using a rotating cursor with a randomized stride
//!
//! Each placement advances the cursor by `1 + random(n / 2)` positions over the
//! registered node sequence and takes `K` consecutive nodes from there,
//! wrapping past the end. The functions here are pure; the registry owns the
//! cursor and the random source and calls them under its write lock.

use crate::common::{Error, Result};
use crate::coordinator::registry::NodeId;
use rand::Rng;

/// Draw the stride for the next placement over a registry of `size` nodes.
///
/// Always in `1..=size / 2` (or exactly 1 for registries smaller than 2).
pub fn draw_stride<R: Rng + ?Sized>(rng: &mut R, size: usize) -> usize {
    let half = size / 2;
    if half == 0 {
        return 1;
    }
    1 + rng.gen_range(0..half)
}

/// Move the cursor `stride` positions forward, modulo `size`.
pub fn advance_cursor(cursor: usize, size: usize, stride: usize) -> usize {
    if size == 0 {
        return 0;
    }
    (cursor + stride) % size
}

/// Take `k` node ids starting at `start`, cycling through `order`.
pub fn select_nodes(order: &[NodeId], start: usize, k: usize) -> Vec<NodeId> {
    if order.is_empty() {
        return Vec::new();
    }
    (0..k)
        .map(|i| order[(start + i) % order.len()].clone())
        .collect()
}

/// One placement decision: returns the new cursor and the chosen nodes.
///
/// Fails with [`Error::NoQuorum`] when fewer than `k` nodes are registered;
/// the cursor is left untouched in that case.
pub fn place(order: &[NodeId], cursor: usize, stride: usize, k: usize) -> Result<(usize, Vec<NodeId>)> {
    if order.len() < k {
        return Err(Error::NoQuorum {
            needed: k,
            available: order.len(),
        });
    }
    let next = advance_cursor(cursor, order.len(), stride);
    Ok((next, select_nodes(order, next, k)))
}
