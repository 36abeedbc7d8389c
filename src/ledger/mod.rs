//! Evidence Ledger
//!
//! Tamper-evident, append-only evidence chain: every block commits to its
//! position, its content and the hash of the block before it.

pub mod block;
pub mod chain;
pub mod evidence;
pub mod merkle;
pub mod verify;

pub use block::{compute_hash, Block, Evidence, GENESIS_PREVIOUS_HASH};
pub use chain::{EvidenceLedger, LedgerSnapshot, LedgerState};
pub use evidence::DigitalSignature;
pub use merkle::{merkle_root, verify_merkle_root};
pub use verify::{detect_gaps, find_tampered_blocks, verify_block, verify_chain, ChainStatus, ChainVerification};
