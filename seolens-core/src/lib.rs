pub mod aggregate;
pub mod audit;
pub mod classify;
pub mod config;
pub mod detector;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod model;
pub mod report;
pub mod rules;
pub mod scoring;
pub mod store;
pub mod teams;

pub use aggregate::{AuditSummary, Aggregator};
pub use audit::{AuditInput, AuditResult, Auditor};
pub use classify::{PageType, classify};
pub use config::{DetectorThresholds, ScoringConfig};
pub use detector::Detector;
pub use error::AuditError;
pub use lifecycle::IssueKey;
pub use model::{Category, Issue, IssueStatus, IssueType, Severity};
pub use scoring::Scorer;
pub use store::AuditStore;
pub use teams::{TeamBucket, TeamKey};
