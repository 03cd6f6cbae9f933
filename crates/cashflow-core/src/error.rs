use cashflow_domain::{DateWindowError, DomainError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid date range: {0}")]
    InvalidRange(#[from] DateWindowError),
    #[error("Date range too large: {days} days (max {max})")]
    RangeTooLarge { days: i64, max: i64 },
    #[error("Rule not found: {0}")]
    RuleNotFound(Uuid),
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),
    #[error("Reconciliation not found: {0}")]
    ReconciliationNotFound(Uuid),
    #[error("Not authorized to modify {0}")]
    Forbidden(String),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Storage error: {0}")]
    Storage(String),
}
