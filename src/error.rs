//! Error handling for posledger
//!
//! Classified failures that callers apply a policy to live in [`ReportError`];
//! everything else travels as `anyhow::Error` with context chains.

use thiserror::Error;

/// Failures with a defined handling policy
#[derive(Error, Debug)]
pub enum ReportError {
    /// The POS export could not be parsed or held no rows. The file is discarded.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Login, filter, export or download against the POS portal failed. Aborts the run.
    #[error("POS session error: {0}")]
    PosSession(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias used across the crate
pub type Result<T> = anyhow::Result<T>;

/// True when the error chain carries [`ReportError::MalformedInput`]
pub fn is_malformed_input(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ReportError>(),
        Some(ReportError::MalformedInput(_))
    )
}
