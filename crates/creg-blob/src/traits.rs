use creg_crypto::ContentHasher;
use creg_types::BlobRef;

use crate::error::BlobResult;

/// Content-addressed store for certificate payloads.
///
/// All implementations must satisfy these invariants:
/// - The same bytes always produce the same [`BlobRef`].
/// - A payload is immutable once written.
/// - `resolve` returns a locator without fetching the payload.
/// - Transport and storage faults surface as errors, never as defaults.
pub trait BlobStore: Send + Sync {
    /// Store a payload and return its reference. Idempotent.
    fn store(&self, payload: &[u8]) -> BlobResult<BlobRef>;

    /// Return a retrieval locator (URL or path) for a stored payload.
    ///
    /// Returns `Err(BlobError::NotFound)` if nothing is held under the
    /// reference.
    fn resolve(&self, blob_ref: &BlobRef) -> BlobResult<String>;

    /// Read the payload bytes back.
    fn fetch(&self, blob_ref: &BlobRef) -> BlobResult<Vec<u8>>;

    /// Check whether a payload exists under the reference.
    fn exists(&self, blob_ref: &BlobRef) -> BlobResult<bool>;
}

/// The reference every built-in backend assigns to `payload`: the hex
/// BLAKE3 digest under the `creg-blob-v1` domain.
pub fn content_ref(payload: &[u8]) -> BlobRef {
    BlobRef::new(ContentHasher::BLOB.hash_hex(payload))
}
