//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The index backend could not complete the operation.
    #[error("index unavailable: {0}")]
    Unavailable(String),

    /// An empty student id was supplied.
    #[error("student id must not be empty")]
    EmptyStudentId,

    /// Reading the ledger during rebuild or audit failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] creg_ledger::LedgerError),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
