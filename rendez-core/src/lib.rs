pub mod models;
pub mod ports;
pub mod repository;

/// Workspace-wide error taxonomy. Every failure surfaced to a caller of
/// the coordination engine is one of these kinds; notification and audit
/// failures are logged and swallowed instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Business rule violated: {0}")]
    BusinessRule(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
