//! Utility functions for minifs

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Length every node identifier must have
pub const NODE_ID_LEN: usize = 4;

/// Percent-encoding set for file names carried in a query string
const QUERY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'%')
    .add(b' ')
    .add(b'?')
    .add(b'#')
    .add(b'&')
    .add(b'+')
    .add(b'=')
    .add(b'\\');

/// Encode a file name for use as a `filename=` query value
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, QUERY_ENCODE_SET).to_string()
}

/// Name under which shard `index` of `filename` is stored on a node
pub fn shard_name(filename: &str, index: usize) -> String {
    format!("{}.{:02}", filename, index)
}

/// Reject node ids that are not exactly [`NODE_ID_LEN`] characters
pub fn validate_node_id(id: &str) -> crate::Result<()> {
    if id.chars().count() != NODE_ID_LEN {
        return Err(crate::Error::InvalidNodeId(id.to_string(), NODE_ID_LEN));
    }
    Ok(())
}

/// Reject empty file names and names no storage directory can hold
pub fn check_file_name(name: &str) -> crate::Result<()> {
    if name.is_empty() {
        return Err(crate::Error::EmptyFileName);
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(crate::Error::InvalidFileName(name.to_string()));
    }
    Ok(())
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}
