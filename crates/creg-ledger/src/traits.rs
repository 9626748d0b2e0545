use creg_types::{CertificateId, CertificateRecord};

use crate::error::LedgerResult;

/// Authoritative certificate store.
///
/// All implementations must satisfy these invariants:
/// - `insert` is atomic insert-if-absent: concurrent inserts under the same
///   id resolve to exactly one success, the rest see `DuplicateId`.
/// - A record is either fully visible to readers or not at all.
/// - Stored records never change.
/// - Reads never wait on a writer's I/O.
pub trait CertificateLedger: Send + Sync {
    /// Store `record` under `record.id`.
    fn insert(&self, record: CertificateRecord) -> LedgerResult<()>;

    /// Fetch a record. `Ok(None)` means absent; `Err` is a storage fault.
    fn get(&self, id: &CertificateId) -> LedgerResult<Option<CertificateRecord>>;

    fn contains(&self, id: &CertificateId) -> LedgerResult<bool>;

    /// Number of stored records.
    fn len(&self) -> LedgerResult<usize>;

    fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Every record, in insertion order. Used to rebuild derived indices.
    fn records(&self) -> LedgerResult<Vec<CertificateRecord>>;
}
