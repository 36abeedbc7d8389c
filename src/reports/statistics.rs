use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::Result;
use crate::ledger::{merkle_root, verify_chain, Block, ChainStatus};

/// Aggregate figures over a block sequence. Genesis is counted in
/// `total_blocks` only; case and type tallies cover evidence blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStatistics {
    pub total_blocks: usize,
    pub first_block_timestamp: Option<DateTime<Utc>>,
    pub last_block_timestamp: Option<DateTime<Utc>>,
    pub total_cases: usize,
    pub evidence_types: BTreeMap<String, usize>,
    pub chain_integrity: ChainStatus,
    pub merkle_root: Option<String>,
    pub storage_size_kb: f64,
}

impl ChainStatistics {
    pub fn collect(blocks: &[Block]) -> Result<Self> {
        let evidence_blocks = blocks.iter().filter(|block| block.index != 0);

        let mut cases = BTreeSet::new();
        let mut evidence_types = BTreeMap::new();
        for block in evidence_blocks {
            if let Some(case_id) = block.case_id() {
                cases.insert(case_id);
            }
            if let Some(evidence_type) = block.evidence_str("evidence_type") {
                *evidence_types.entry(evidence_type.to_string()).or_insert(0) += 1;
            }
        }

        let storage_bytes = serde_json::to_vec(blocks)?.len();

        Ok(Self {
            total_blocks: blocks.len(),
            first_block_timestamp: blocks.first().map(|block| block.timestamp),
            last_block_timestamp: blocks.last().map(|block| block.timestamp),
            total_cases: cases.len(),
            evidence_types,
            chain_integrity: verify_chain(blocks).status,
            merkle_root: merkle_root(blocks),
            storage_size_kb: storage_bytes as f64 / 1024.0,
        })
    }
}
