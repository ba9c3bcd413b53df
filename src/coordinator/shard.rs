//! K-way payload splitting
//!
//! Payloads shorter than K go out as a single shard. Otherwise the first K-1
//! shards get `n / K` bytes each and the last one takes the remainder.
//! Boundaries are never stored: reassembly is plain concatenation in index
//! order.

use bytes::Bytes;

/// Split `payload` into contiguous shards. Slices share the payload buffer.
pub fn split_payload(payload: &Bytes, k: usize) -> Vec<Bytes> {
    let n = payload.len();
    if n < k {
        return vec![payload.clone()];
    }
    let chunk = n / k;
    let mut shards = Vec::with_capacity(k);
    for i in 0..k - 1 {
        shards.push(payload.slice(i * chunk..(i + 1) * chunk));
    }
    shards.push(payload.slice((k - 1) * chunk..));
    shards
}
