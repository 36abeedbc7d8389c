pub mod config;
pub mod error;
pub mod ledger;
pub mod reports;
pub mod snapshot;

pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use ledger::{Block, ChainStatus, ChainVerification, EvidenceLedger, LedgerSnapshot};
