use sha2::{Digest, Sha256};

use crate::split::TreeId;

/// Computes a stable hexadecimal digest identifying a topology.
///
/// The digest covers the leaf count and the packed words of every split in
/// set order, so two equal tree ids always hash identically.
pub fn topology_hash(tree_id: &TreeId) -> String {
    let mut hasher = Sha256::new();
    let nleaves = tree_id.iter().next().map_or(0, |split| split.nleaves());
    hasher.update((nleaves as u64).to_le_bytes());
    hasher.update((tree_id.len() as u64).to_le_bytes());
    for split in tree_id {
        update_slice(split.words(), &mut hasher);
    }
    format!("{:x}", hasher.finalize())
}

fn update_slice(values: &[u64], hasher: &mut Sha256) {
    hasher.update((values.len() as u64).to_le_bytes());
    for value in values {
        hasher.update(value.to_le_bytes());
    }
}
