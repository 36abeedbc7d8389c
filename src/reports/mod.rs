//! Read-only reports over an evidence chain
//!
//! Every function here takes a block slice and never mutates it; pass a
//! [`LedgerSnapshot`](crate::ledger::LedgerSnapshot)'s blocks or use
//! [`EvidenceLedger::with_blocks`](crate::ledger::EvidenceLedger::with_blocks).

pub mod case;
pub mod statistics;

pub use case::{case_evidence, export_case, CaseExport, CasePackage, EvidenceFile, ExportFormat};
pub use statistics::ChainStatistics;
