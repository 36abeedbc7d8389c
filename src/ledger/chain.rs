//! Evidence Ledger
//!
//! Owns an append-only, hash-linked block sequence. Appends are serialized
//! behind a write lock; readers work on a consistent view under a read lock.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::ledger::block::{Block, Evidence, GENESIS_PREVIOUS_HASH};
use crate::ledger::evidence::{build_evidence_payload, to_evidence};
use crate::ledger::merkle::merkle_root;
use crate::ledger::verify::{verify_block, verify_chain, ChainStatus, ChainVerification};

/// Lifecycle of a ledger. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerState {
    Empty,
    GenesisOnly,
    Growing,
}

/// Tamper-evident evidence chain.
///
/// Cloning is cheap and yields a handle to the same chain.
#[derive(Debug, Clone)]
pub struct EvidenceLedger {
    config: LedgerConfig,
    blocks: Arc<RwLock<Vec<Block>>>,
}

impl EvidenceLedger {
    /// Create a ledger whose genesis block carries the configured payload
    pub fn new(config: LedgerConfig) -> Self {
        let payload = genesis_payload(&config);
        Self::with_genesis(config, payload)
    }

    /// Create a ledger with a caller-supplied genesis payload
    pub fn with_genesis(config: LedgerConfig, genesis: Evidence) -> Self {
        let genesis = Block::new(0, genesis, GENESIS_PREVIOUS_HASH.to_string());
        info!(
            "Initialized evidence chain {} (genesis {})",
            config.chain_name,
            genesis.short_hash()
        );

        Self {
            config,
            blocks: Arc::new(RwLock::new(vec![genesis])),
        }
    }

    /// Restore a ledger from a stored block sequence.
    ///
    /// The sequence must verify as a valid chain starting at genesis.
    pub fn from_blocks(config: LedgerConfig, blocks: Vec<Block>) -> Result<Self> {
        let verification = verify_chain(&blocks);
        match verification.status {
            ChainStatus::Valid => {}
            ChainStatus::Empty => {
                return Err(LedgerError::Integrity(
                    "cannot restore a ledger from an empty block sequence".to_string(),
                ))
            }
            ChainStatus::Compromised => {
                return Err(LedgerError::Integrity(format!(
                    "cannot restore ledger: {}",
                    verification.message
                )))
            }
        }

        info!(
            "Restored evidence chain {} with {} blocks",
            config.chain_name,
            blocks.len()
        );

        Ok(Self {
            config,
            blocks: Arc::new(RwLock::new(blocks)),
        })
    }

    /// Append a new evidence record and return the created block.
    ///
    /// The tail is read, the candidate block verified against it and the
    /// block appended while holding the write lock, so concurrent callers
    /// never link to the same predecessor.
    pub fn add_evidence(&self, evidence_data: &Evidence, case_id: &str, agency: &str) -> Result<Block> {
        let payload = build_evidence_payload(evidence_data, case_id, agency, &self.config)?;

        let mut blocks = self.write();
        let previous = blocks
            .last()
            .ok_or_else(|| LedgerError::Integrity("ledger has no genesis block".to_string()))?;

        let index = previous.index.checked_add(1).ok_or_else(|| {
            LedgerError::Integrity(format!("block index overflow after {}", previous.index))
        })?;
        let block = Block::new(index, payload, previous.hash.clone());

        if !verify_block(&block, previous) {
            error!(
                "Refusing to append block #{} to {}: verification against tail failed",
                block.index, self.config.chain_name
            );
            return Err(LedgerError::Integrity(format!(
                "block #{} failed verification against block #{}",
                block.index, previous.index
            )));
        }

        debug!(
            "Evidence added to {}. Block #{} | Hash: {}...",
            self.config.chain_name,
            block.index,
            block.short_hash()
        );
        blocks.push(block.clone());
        Ok(block)
    }

    /// Append any serializable record as evidence
    pub fn add_serializable<T: Serialize + ?Sized>(
        &self,
        evidence_data: &T,
        case_id: &str,
        agency: &str,
    ) -> Result<Block> {
        let evidence_data = to_evidence(evidence_data)?;
        self.add_evidence(&evidence_data, case_id, agency)
    }

    /// Re-verify every stored block
    pub fn verify_chain(&self) -> ChainVerification {
        verify_chain(&self.read())
    }

    /// Immutable copy of the chain
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            chain_name: self.config.chain_name.clone(),
            blocks: self.read().clone(),
        }
    }

    /// Run a read-only projection over a consistent view of the chain
    pub fn with_blocks<R>(&self, f: impl FnOnce(&[Block]) -> R) -> R {
        f(&self.read())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn state(&self) -> LedgerState {
        match self.read().len() {
            0 => LedgerState::Empty,
            1 => LedgerState::GenesisOnly,
            _ => LedgerState::Growing,
        }
    }

    pub fn block(&self, index: usize) -> Option<Block> {
        self.read().get(index).cloned()
    }

    pub fn last_block(&self) -> Option<Block> {
        self.read().last().cloned()
    }

    /// Hash of the most recent block
    pub fn head_hash(&self) -> Option<String> {
        self.read().last().map(|block| block.hash.clone())
    }

    pub fn chain_name(&self) -> &str {
        &self.config.chain_name
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // A panicking writer cannot leave a partial block behind: the push is the
    // last step of an append. Poisoned locks are therefore safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Block>> {
        self.blocks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Block>> {
        self.blocks.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn tamper_with(&self, position: usize, f: impl FnOnce(&mut Block)) {
        let mut blocks = self.write();
        f(&mut blocks[position]);
    }
}

fn genesis_payload(config: &LedgerConfig) -> Evidence {
    let mut payload = Evidence::new();
    payload.insert("description".into(), json!(config.genesis.description));
    payload.insert("case_id".into(), json!(config.genesis.case_id));
    payload.insert("agency".into(), json!(config.genesis.agency));
    payload.insert("purpose".into(), json!(config.genesis.purpose));
    payload
}

/// Detached copy of a chain's blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub chain_name: String,
    pub blocks: Vec<Block>,
}

impl LedgerSnapshot {
    pub fn verify(&self) -> ChainVerification {
        verify_chain(&self.blocks)
    }

    pub fn head_hash(&self) -> Option<&str> {
        self.blocks.last().map(|block| block.hash.as_str())
    }

    pub fn merkle_root(&self) -> Option<String> {
        merkle_root(&self.blocks)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
