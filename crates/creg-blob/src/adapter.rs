use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use creg_crypto::ContentHasher;
use creg_types::BlobRef;
use tracing::debug;

use crate::error::{BlobError, BlobResult};
use crate::traits::BlobStore;

/// The registry's view of a blob store.
///
/// Holds no state beyond two caches: payload digest to reference (so a
/// repeated upload of identical bytes never reaches a store that does not
/// deduplicate) and reference to locator. Errors from the backend pass
/// through untouched; retry policy belongs to the caller.
pub struct BlobAdapter {
    store: Arc<dyn BlobStore>,
    locator_base: Option<String>,
    refs: RwLock<HashMap<[u8; 32], BlobRef>>,
    locators: RwLock<HashMap<BlobRef, String>>,
}

impl BlobAdapter {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            locator_base: None,
            refs: RwLock::new(HashMap::new()),
            locators: RwLock::new(HashMap::new()),
        }
    }

    /// Render locators as `"{base}/{blob_ref}"` (e.g. a public gateway)
    /// instead of the backend's native locator.
    pub fn with_locator_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.locator_base = Some(base.trim_end_matches('/').to_string());
        self
    }

    pub fn locator_base(&self) -> Option<&str> {
        self.locator_base.as_deref()
    }

    /// Store `payload`, returning the cached reference when these exact
    /// bytes were stored through this adapter before.
    pub fn store(&self, payload: &[u8]) -> BlobResult<BlobRef> {
        if payload.is_empty() {
            return Err(BlobError::EmptyPayload);
        }
        let digest = ContentHasher::BLOB.hash(payload);
        if let Some(cached) = self.cached_ref(&digest) {
            debug!(blob = %cached, "blob reference served from cache");
            return Ok(cached);
        }

        let blob_ref = self.store.store(payload)?;
        if let Ok(mut refs) = self.refs.write() {
            refs.insert(digest, blob_ref.clone());
        }
        Ok(blob_ref)
    }

    /// Locator for a stored payload. Never fetches the payload.
    pub fn resolve(&self, blob_ref: &BlobRef) -> BlobResult<String> {
        if let Some(locator) = self
            .locators
            .read()
            .ok()
            .and_then(|m| m.get(blob_ref).cloned())
        {
            return Ok(locator);
        }

        let native = self.store.resolve(blob_ref)?;
        let locator = match &self.locator_base {
            Some(base) => format!("{base}/{blob_ref}"),
            None => native,
        };
        if let Ok(mut locators) = self.locators.write() {
            locators.insert(blob_ref.clone(), locator.clone());
        }
        Ok(locator)
    }

    /// Download the payload bytes.
    pub fn fetch(&self, blob_ref: &BlobRef) -> BlobResult<Vec<u8>> {
        self.store.fetch(blob_ref)
    }

    /// Whether the backend still holds the payload.
    pub fn exists(&self, blob_ref: &BlobRef) -> BlobResult<bool> {
        self.store.exists(blob_ref)
    }

    /// Number of payload digests with a cached reference.
    pub fn cached_refs(&self) -> usize {
        self.refs.read().map(|m| m.len()).unwrap_or(0)
    }

    fn cached_ref(&self, digest: &[u8; 32]) -> Option<BlobRef> {
        self.refs.read().ok().and_then(|m| m.get(digest).cloned())
    }
}

impl std::fmt::Debug for BlobAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobAdapter")
            .field("locator_base", &self.locator_base)
            .field("cached_refs", &self.cached_refs())
            .finish()
    }
}
