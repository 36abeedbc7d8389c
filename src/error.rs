use thiserror::Error;

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON serialization error: {}", err))
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    pub fn case_not_found(case_id: &str) -> Self {
        Self::NotFound(format!("No evidence found for case {}", case_id))
    }

    pub fn empty_field(field: &str) -> Self {
        Self::InvalidInput(format!("{} must not be empty", field))
    }
}
