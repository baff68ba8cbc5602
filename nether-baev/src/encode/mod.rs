//! BAEV file encoder
//!
//! Encoding runs in two passes over the archive. The layout pass assigns an
//! absolute offset to every region (header, sections, container, buckets,
//! node index arrays, node table, then each node's events, trigger and hold
//! arrays and parameter records, and finally the string pool). The emission
//! pass then seeks to each of those offsets and writes the records.
//!
//! The node table is written in model order; indices held by the buckets are
//! therefore valid unchanged.

use crate::archive::{Archive, Container};
use crate::error::{BaevError, Result};

mod emit;
mod layout;

/// Encode an archive to BAEV bytes
///
/// The header's offsets, sizes and section table are recomputed; only its
/// annotation is carried over.
///
/// # Returns
/// * `Ok(Vec<u8>)` - Complete file, decodable with [`crate::decode`]
/// * `Err(BaevError)` - The model is inconsistent or a field overflows
pub fn encode(archive: &Archive) -> Result<Vec<u8>> {
    check_references(&archive.container)?;
    let layout = layout::compute(&archive.container)?;
    emit::emit(archive, &layout)
}

/// Every bucket index must point into the node table
fn check_references(container: &Container) -> Result<()> {
    let len = container.nodes.len();
    for (bucket, entry) in container.event_info.iter().enumerate() {
        if let Some(&index) = entry.nodes.iter().find(|&&i| i as usize >= len) {
            return Err(BaevError::InconsistentModel(format!(
                "bucket {} (hash {:#x}) references node {}, but the node table has {} entries",
                bucket, entry.hash, index, len
            )));
        }
    }
    Ok(())
}
