use crate::classify::PageType;
use crate::model::IssueType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("No base severity configured for issue type '{0}'")]
    MissingSeverity(IssueType),

    #[error("Base severity {value} for '{issue_type}' is outside 0..=100")]
    InvalidSeverity { issue_type: IssueType, value: u8 },

    #[error("Page weight {value} for '{page_type}' must be a positive number")]
    InvalidWeight { page_type: PageType, value: f64 },

    #[error("{name} must be a positive number, got {value}")]
    InvalidConstant { name: &'static str, value: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;
