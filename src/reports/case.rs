//! Case-filtered evidence projections
//!
//! Read-only views over a block sequence for a single case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{LedgerError, Result};
use crate::ledger::{verify_chain, Block, ChainVerification};

const MAX_KEY_FINDINGS: usize = 5;
const KEY_FINDING_SEVERITIES: [&str; 2] = ["HIGH", "CRITICAL"];

/// Blocks recorded for `case_id`, in append order
pub fn case_evidence(blocks: &[Block], case_id: &str) -> Result<Vec<Block>> {
    let matching: Vec<Block> = blocks
        .iter()
        .filter(|block| block.case_id() == Some(case_id))
        .cloned()
        .collect();

    if matching.is_empty() {
        return Err(LedgerError::case_not_found(case_id));
    }
    Ok(matching)
}

/// Chain position and linkage of one case block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceFile {
    pub file_name: String,
    pub block_index: u64,
    pub hash_value: String,
    pub previous_hash: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything recorded for one case, with a verification report of the whole chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasePackage {
    pub case_id: String,
    pub total_evidence_blocks: usize,
    pub first_timestamp: DateTime<Utc>,
    pub last_timestamp: DateTime<Utc>,
    pub key_findings: Vec<String>,
    pub evidence_files: Vec<EvidenceFile>,
    pub digital_signatures: Vec<Value>,
    pub chain_head_hash: String,
    pub verification: ChainVerification,
}

impl CasePackage {
    pub fn build(blocks: &[Block], case_id: &str) -> Result<Self> {
        let case_blocks = case_evidence(blocks, case_id)?;

        // case_evidence never returns an empty list
        let first_timestamp = case_blocks[0].timestamp;
        let last_timestamp = case_blocks[case_blocks.len() - 1].timestamp;
        let chain_head_hash = blocks
            .last()
            .map(|block| block.hash.clone())
            .unwrap_or_default();

        let evidence_files = case_blocks
            .iter()
            .map(|block| EvidenceFile {
                file_name: format!("evidence_block_{}.json", block.index),
                block_index: block.index,
                hash_value: block.hash.clone(),
                previous_hash: block.previous_hash.clone(),
                timestamp: block.timestamp,
            })
            .collect();

        let digital_signatures = case_blocks
            .iter()
            .filter_map(|block| block.evidence.get("digital_signature").cloned())
            .collect();

        Ok(Self {
            case_id: case_id.to_string(),
            total_evidence_blocks: case_blocks.len(),
            first_timestamp,
            last_timestamp,
            key_findings: key_findings(&case_blocks),
            evidence_files,
            digital_signatures,
            chain_head_hash,
            verification: verify_chain(blocks),
        })
    }
}

/// Up to five one-line findings for high and critical severity blocks
pub fn key_findings(case_blocks: &[Block]) -> Vec<String> {
    case_blocks
        .iter()
        .filter(|block| {
            block
                .evidence_str("severity")
                .is_some_and(|severity| KEY_FINDING_SEVERITIES.contains(&severity))
        })
        .map(|block| {
            format!(
                "{} at {} on {}",
                block.evidence_str("evidence_type").unwrap_or("Evidence"),
                block.evidence_str("location").unwrap_or("Unknown location"),
                block.evidence_str("timestamp_collected").unwrap_or("unknown date"),
            )
        })
        .take(MAX_KEY_FINDINGS)
        .collect()
}

/// Supported case export shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Raw case blocks plus the chain verification report
    Blockchain,
    /// Summarized [`CasePackage`]
    Package,
}

impl FromStr for ExportFormat {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "blockchain" => Ok(Self::Blockchain),
            "package" | "json" => Ok(Self::Package),
            other => Err(LedgerError::InvalidInput(format!(
                "Unsupported format: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blockchain => f.write_str("blockchain"),
            Self::Package => f.write_str("package"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaseExport {
    Blockchain {
        case_id: String,
        blockchain_evidence: Vec<Block>,
        verification_report: ChainVerification,
    },
    Package(CasePackage),
}

pub fn export_case(blocks: &[Block], case_id: &str, format: ExportFormat) -> Result<CaseExport> {
    match format {
        ExportFormat::Blockchain => Ok(CaseExport::Blockchain {
            case_id: case_id.to_string(),
            blockchain_evidence: case_evidence(blocks, case_id)?,
            verification_report: verify_chain(blocks),
        }),
        ExportFormat::Package => Ok(CaseExport::Package(CasePackage::build(blocks, case_id)?)),
    }
}
