use creg_types::CertificateId;

use crate::error::IndexResult;

/// Secondary index from student id to certificate ids.
///
/// Callers append only after the record is durably in the ledger, so a
/// reader can never see an id the ledger does not hold.
pub trait StudentIndex: Send + Sync {
    /// Append `id` to the student's sequence, creating it if absent.
    ///
    /// Idempotent: appending an id already present is a no-op, which is what
    /// makes retrying a failed append safe.
    fn append(&self, student_id: &str, id: CertificateId) -> IndexResult<()>;

    /// The student's certificate ids in issuance order. Empty, not an
    /// error, when the student has none.
    fn list(&self, student_id: &str) -> IndexResult<Vec<CertificateId>>;

    /// Every student with at least one entry, sorted.
    fn students(&self) -> IndexResult<Vec<String>>;

    /// Drop every entry. Only used when rebuilding from the ledger.
    fn clear(&self) -> IndexResult<()>;
}
