use std::sync::Arc;

use creg_blob::{BlobAdapter, BlobStore, FsBlobStore, InMemoryBlobStore};
use creg_index::{ConsistencyReport, InMemoryStudentIndex, StudentIndex};
use creg_ledger::{CertificateLedger, InMemoryLedger, SyncMode, WalConfig, WalLedger};
use creg_types::{CertificateId, CertificateRecord, Clock, IssueRequest, SystemClock};
use tracing::{debug, error, info, warn};

use crate::config::{Backend, RegistryConfig};
use crate::error::{EngineError, EngineResult, IssueError};
use crate::outcome::{IssueReceipt, RegistryStats, VerificationOutcome};

/// The certificate registry: issuance, verification, and listing.
///
/// `issue` is the only write path. It stores the payload, derives the id,
/// inserts into the ledger, and only then appends to the student index, so
/// a reader never sees an index entry ahead of its record. Every other
/// operation is read-only and runs concurrently with writers.
pub struct Registry {
    ledger: Arc<dyn CertificateLedger>,
    index: Arc<dyn StudentIndex>,
    blobs: BlobAdapter,
    clock: Arc<dyn Clock>,
    append_attempts: u32,
}

impl Registry {
    /// Assemble a registry from explicit backends.
    pub fn new(
        ledger: Arc<dyn CertificateLedger>,
        index: Arc<dyn StudentIndex>,
        blobs: BlobAdapter,
    ) -> Self {
        Self {
            ledger,
            index,
            blobs,
            clock: Arc::new(SystemClock),
            append_attempts: RegistryConfig::default().append_attempts,
        }
    }

    /// A fresh, empty, fully in-memory registry.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryLedger::new()),
            Arc::new(InMemoryStudentIndex::new()),
            BlobAdapter::new(Arc::new(InMemoryBlobStore::new())),
        )
    }

    /// Build the backends `config` names. Durable registries replay their
    /// ledger log and rebuild the student index from it.
    pub fn from_config(config: &RegistryConfig) -> EngineResult<Self> {
        config.validate()?;

        let (ledger, store): (Arc<dyn CertificateLedger>, Arc<dyn BlobStore>) =
            match config.backend {
                Backend::Memory => (
                    Arc::new(InMemoryLedger::new()),
                    Arc::new(InMemoryBlobStore::new()),
                ),
                Backend::Durable => {
                    let data_dir = config.data_dir.as_deref().ok_or_else(|| {
                        EngineError::Config("durable backend requires data_dir".into())
                    })?;
                    let wal_config = WalConfig {
                        sync_mode: if config.sync_writes {
                            SyncMode::EveryWrite
                        } else {
                            SyncMode::OsDefault
                        },
                    };
                    let ledger =
                        WalLedger::open(&RegistryConfig::ledger_path(data_dir), wal_config)?;
                    let store = FsBlobStore::open(RegistryConfig::blob_root(data_dir))?;
                    (Arc::new(ledger), Arc::new(store))
                }
            };

        let mut blobs = BlobAdapter::new(store);
        if let Some(base) = &config.locator_base {
            blobs = blobs.with_locator_base(base.clone());
        }

        let registry = Self::new(ledger, Arc::new(InMemoryStudentIndex::new()), blobs)
            .with_append_attempts(config.append_attempts);
        registry.rebuild_index()?;
        info!(backend = ?config.backend, "registry ready");
        Ok(registry)
    }

    /// Replace the source of issuance instants.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attempts at the post-insert index append (minimum 1).
    pub fn with_append_attempts(mut self, attempts: u32) -> Self {
        self.append_attempts = attempts.max(1);
        self
    }

    // ---- Issuance ----

    /// Issue a certificate.
    ///
    /// Fails before any ledger mutation if the request is invalid or the
    /// payload cannot be stored. Fails with [`IssueError::Duplicate`] if a
    /// certificate with the same student, course, and issuance millisecond
    /// already exists.
    pub fn issue(&self, mut request: IssueRequest) -> Result<IssueReceipt, IssueError> {
        if request.student_id.trim().is_empty() {
            return Err(IssueError::InvalidRequest("student id must not be empty".into()));
        }
        if request.payload.is_empty() {
            return Err(IssueError::InvalidRequest("certificate payload is empty".into()));
        }

        let payload = std::mem::take(&mut request.payload);
        let blob_ref = self.blobs.store(&payload)?;

        let issued_at = self.clock.now();
        let id = creg_crypto::derive(&request.student_id, &request.course, issued_at);
        let record = request.into_record(id, blob_ref.clone(), issued_at);

        if let Err(err) = self.ledger.insert(record.clone()) {
            let err = IssueError::from(err);
            if matches!(err, IssueError::Duplicate(_)) {
                warn!(id = %id.short_id(), blob = %blob_ref, "duplicate issuance rejected; blob left unreferenced");
            }
            return Err(err);
        }

        self.append_with_retry(&record.student_id, id)?;

        info!(
            id = %id.short_id(),
            student = %record.student_id,
            issued_at = issued_at.as_millis(),
            "certificate issued"
        );
        Ok(IssueReceipt {
            id,
            blob_ref,
            record,
        })
    }

    /// The ledger record is already durable; never roll it back. Appends are
    /// idempotent, so retrying after a partial failure is safe.
    fn append_with_retry(&self, student_id: &str, id: CertificateId) -> Result<(), IssueError> {
        let mut attempt = 1;
        loop {
            match self.index.append(student_id, id) {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.append_attempts => {
                    warn!(id = %id.short_id(), attempt, error = %err, "index append failed; retrying");
                    attempt += 1;
                }
                Err(err) => {
                    error!(id = %id.short_id(), attempts = attempt, error = %err, "index append failed; ledger record kept");
                    return Err(IssueError::IndexAppend { id, source: err });
                }
            }
        }
    }

    // ---- Queries ----

    /// Look up a certificate by the id string a verifier typed in.
    ///
    /// Strings that are not well-formed ids are `NotFound`, exactly like
    /// well-formed ids that were never issued.
    pub fn verify(&self, id: &str) -> EngineResult<VerificationOutcome> {
        match CertificateId::parse(id) {
            Ok(id) => self.verify_id(&id),
            Err(err) => {
                debug!(input = id, error = %err, "unparsable certificate id");
                Ok(VerificationOutcome::NotFound)
            }
        }
    }

    pub fn verify_id(&self, id: &CertificateId) -> EngineResult<VerificationOutcome> {
        let Some(record) = self.ledger.get(id)? else {
            debug!(id = %id.short_id(), "certificate not found");
            return Ok(VerificationOutcome::NotFound);
        };

        let locator = match self.blobs.resolve(&record.blob_ref) {
            Ok(locator) => Some(locator),
            Err(err) => {
                warn!(id = %id.short_id(), blob = %record.blob_ref, error = %err, "could not resolve certificate payload");
                None
            }
        };
        Ok(VerificationOutcome::Verified { record, locator })
    }

    /// Every certificate held by `student_id`, in issuance order.
    pub fn list_by_student(&self, student_id: &str) -> EngineResult<Vec<CertificateRecord>> {
        let ids = self.index.list(student_id)?;
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.ledger.get(&id)? {
                Some(record) => records.push(record),
                None => {
                    error!(student = student_id, id = %id.short_id(), "student index references a missing ledger record");
                    return Err(EngineError::ConsistencyViolation {
                        student_id: student_id.to_string(),
                        id,
                    });
                }
            }
        }
        Ok(records)
    }

    /// Download the certificate document.
    pub fn fetch_payload(&self, id: &CertificateId) -> EngineResult<Vec<u8>> {
        let record = self
            .ledger
            .get(id)?
            .ok_or(EngineError::UnknownCertificate(*id))?;
        Ok(self.blobs.fetch(&record.blob_ref)?)
    }

    // ---- Maintenance ----

    /// Regenerate the student index from the ledger.
    pub fn rebuild_index(&self) -> EngineResult<usize> {
        Ok(creg_index::rebuild(self.ledger.as_ref(), self.index.as_ref())?)
    }

    /// Compare the student index against the ledger.
    pub fn audit(&self) -> EngineResult<ConsistencyReport> {
        Ok(creg_index::audit(self.ledger.as_ref(), self.index.as_ref())?)
    }

    /// Ledger records whose payload the blob store no longer holds.
    pub fn missing_blobs(&self) -> EngineResult<Vec<CertificateId>> {
        let mut missing = Vec::new();
        for record in self.ledger.records()? {
            if !self.blobs.exists(&record.blob_ref)? {
                warn!(id = %record.id.short_id(), blob = %record.blob_ref, "certificate payload missing from blob store");
                missing.push(record.id);
            }
        }
        Ok(missing)
    }

    pub fn stats(&self) -> EngineResult<RegistryStats> {
        Ok(RegistryStats {
            certificates: self.ledger.len()?,
            students: self.index.students()?.len(),
        })
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("blobs", &self.blobs)
            .field("append_attempts", &self.append_attempts)
            .finish()
    }
}
