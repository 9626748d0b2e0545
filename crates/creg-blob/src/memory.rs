use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use creg_types::BlobRef;
use tracing::debug;

use crate::error::{BlobError, BlobResult};
use crate::traits::{content_ref, BlobStore};

/// Locator scheme for payloads held in memory.
pub const MEMORY_SCHEME: &str = "mem://";

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Payloads are held behind a `RwLock`
/// and cloned on fetch.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<BlobRef, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    fn read_map(&self) -> BlobResult<RwLockReadGuard<'_, HashMap<BlobRef, Vec<u8>>>> {
        self.blobs
            .read()
            .map_err(|_| BlobError::StoreFailure("blob map lock poisoned".into()))
    }

    fn write_map(&self) -> BlobResult<RwLockWriteGuard<'_, HashMap<BlobRef, Vec<u8>>>> {
        self.blobs
            .write()
            .map_err(|_| BlobError::StoreFailure("blob map lock poisoned".into()))
    }

    /// Number of payloads currently stored.
    pub fn len(&self) -> usize {
        self.read_map().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored payloads.
    pub fn total_bytes(&self) -> u64 {
        self.read_map()
            .map(|m| m.values().map(|p| p.len() as u64).sum())
            .unwrap_or(0)
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn store(&self, payload: &[u8]) -> BlobResult<BlobRef> {
        if payload.is_empty() {
            return Err(BlobError::EmptyPayload);
        }
        let blob_ref = content_ref(payload);
        let mut map = self.write_map()?;
        map.entry(blob_ref.clone())
            .or_insert_with(|| payload.to_vec());
        debug!(blob = %blob_ref, len = payload.len(), "stored blob in memory");
        Ok(blob_ref)
    }

    fn resolve(&self, blob_ref: &BlobRef) -> BlobResult<String> {
        if self.read_map()?.contains_key(blob_ref) {
            Ok(format!("{MEMORY_SCHEME}{blob_ref}"))
        } else {
            Err(BlobError::NotFound(blob_ref.clone()))
        }
    }

    fn fetch(&self, blob_ref: &BlobRef) -> BlobResult<Vec<u8>> {
        self.read_map()?
            .get(blob_ref)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(blob_ref.clone()))
    }

    fn exists(&self, blob_ref: &BlobRef) -> BlobResult<bool> {
        Ok(self.read_map()?.contains_key(blob_ref))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
