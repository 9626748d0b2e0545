use creg_types::BlobRef;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The store could not accept or serve the request (transport fault,
    /// timeout, full disk, poisoned lock).
    #[error("blob store failure: {0}")]
    StoreFailure(String),

    /// No payload is held under the reference.
    #[error("blob not found: {0}")]
    NotFound(BlobRef),

    /// Stored bytes no longer hash to their reference (data corruption).
    #[error("hash mismatch for {blob_ref}: computed {computed}")]
    HashMismatch { blob_ref: BlobRef, computed: String },

    /// Zero-length payloads are never stored.
    #[error("refusing to store an empty payload")]
    EmptyPayload,

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlobError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound(_))
    }
}

/// Result alias for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;
