use creg_types::CertificateId;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A record is already stored under this id. Nothing was written.
    #[error("duplicate certificate id {0}")]
    DuplicateId(CertificateId),

    /// The encoded record exceeds the log's frame limit. Nothing was written.
    #[error("record too large: {len} bytes (limit {limit})")]
    RecordTooLarge { len: usize, limit: usize },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The durable log contains data that cannot be a valid history.
    #[error("corrupt ledger log at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("ledger lock poisoned")]
    Poisoned,
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
