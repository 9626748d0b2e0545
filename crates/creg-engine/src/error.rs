use creg_blob::BlobError;
use creg_index::IndexError;
use creg_ledger::LedgerError;
use creg_types::CertificateId;
use thiserror::Error;

/// Why an issuance failed.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The request is missing something the registry needs.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A certificate already exists under the derived id. Nothing was
    /// written to the ledger; the uploaded blob is left unreferenced.
    #[error("certificate {0} already issued")]
    Duplicate(CertificateId),

    /// The payload could not be stored. No ledger state was touched.
    #[error("blob store error: {0}")]
    Store(#[from] BlobError),

    #[error("ledger error: {0}")]
    Ledger(LedgerError),

    /// The record is durable in the ledger but the student index could not
    /// be updated. `rebuild_index` repairs this.
    #[error("certificate {id} stored but index append failed: {source}")]
    IndexAppend {
        id: CertificateId,
        #[source]
        source: IndexError,
    },
}

impl From<LedgerError> for IssueError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DuplicateId(id) => IssueError::Duplicate(id),
            err @ LedgerError::RecordTooLarge { .. } => IssueError::InvalidRequest(err.to_string()),
            other => IssueError::Ledger(other),
        }
    }
}

/// Errors from registry queries and maintenance.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The student index points at an id the ledger does not hold. This is
    /// data corruption, not ordinary absence.
    #[error("consistency violation: index entry {id} for student {student_id} is not in the ledger")]
    ConsistencyViolation {
        student_id: String,
        id: CertificateId,
    },

    /// No certificate is stored under the id.
    #[error("unknown certificate: {0}")]
    UnknownCertificate(CertificateId),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
