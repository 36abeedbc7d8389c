//! Merkle root over block hashes
//!
//! A compact digest of a whole snapshot, suitable for publishing or
//! comparing two exports without shipping every block.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::ledger::block::Block;

/// Hash two child digests into their parent
fn hash_pair(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hex::encode(hasher.finalize())
}

/// Merkle root of the block hashes, in chain order.
///
/// Odd levels duplicate their last node. Returns `None` for an empty slice.
pub fn merkle_root(blocks: &[Block]) -> Option<String> {
    let mut level: Vec<String> = blocks.iter().map(|block| block.hash.clone()).collect();
    if level.is_empty() {
        return None;
    }

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => hash_pair(left, right),
                [single] => hash_pair(single, single),
                _ => unreachable!("chunks(2) yields one or two items"),
            })
            .collect();
    }

    let root = level.pop();
    if let Some(root) = &root {
        debug!("Merkle root over {} blocks: {}", blocks.len(), root);
    }
    root
}

/// Compare a claimed root against the one computed from `blocks`
pub fn verify_merkle_root(blocks: &[Block], claimed_root: &str) -> bool {
    merkle_root(blocks).as_deref() == Some(claimed_root)
}
