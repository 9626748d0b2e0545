use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use creg_crypto::ContentHasher;
use creg_types::BlobRef;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{BlobError, BlobResult};
use crate::traits::{content_ref, BlobStore};

/// Filesystem blob store.
///
/// Payloads are written to `<root>/<first 2 hex>/<remaining 62 hex>`, the
/// same fan-out git uses for loose objects. Each write goes to a temporary
/// file in the target directory, is fsync'd, then renamed into place, so a
/// reader sees either the whole payload or nothing.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> BlobResult<Self> {
        fs::create_dir_all(root.as_ref())?;
        let root = fs::canonicalize(root.as_ref())?;
        debug!(root = %root.display(), "opened filesystem blob store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk location for a reference, or `None` if the reference is not
    /// one this store could have produced.
    fn path_for(&self, blob_ref: &BlobRef) -> Option<PathBuf> {
        let s = blob_ref.as_str();
        let well_formed = s.len() == 64
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return None;
        }
        let (fan, rest) = s.split_at(2);
        Some(self.root.join(fan).join(rest))
    }

    fn existing_path(&self, blob_ref: &BlobRef) -> BlobResult<PathBuf> {
        match self.path_for(blob_ref) {
            Some(path) if path.is_file() => Ok(path),
            _ => Err(BlobError::NotFound(blob_ref.clone())),
        }
    }
}

impl BlobStore for FsBlobStore {
    fn store(&self, payload: &[u8]) -> BlobResult<BlobRef> {
        if payload.is_empty() {
            return Err(BlobError::EmptyPayload);
        }
        let blob_ref = content_ref(payload);
        let path = self
            .path_for(&blob_ref)
            .ok_or_else(|| BlobError::StoreFailure(format!("unaddressable ref {blob_ref}")))?;
        if path.is_file() {
            debug!(blob = %blob_ref, "blob already on disk");
            return Ok(blob_ref);
        }

        let dir = path
            .parent()
            .ok_or_else(|| BlobError::StoreFailure("blob path has no parent".into()))?;
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(payload)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| BlobError::Io(e.error))?;

        debug!(blob = %blob_ref, len = payload.len(), path = %path.display(), "stored blob");
        Ok(blob_ref)
    }

    fn resolve(&self, blob_ref: &BlobRef) -> BlobResult<String> {
        let path = self.existing_path(blob_ref)?;
        Ok(format!("file://{}", path.display()))
    }

    fn fetch(&self, blob_ref: &BlobRef) -> BlobResult<Vec<u8>> {
        let path = self.existing_path(blob_ref)?;
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BlobError::NotFound(blob_ref.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let computed = ContentHasher::BLOB.hash_hex(&data);
        if computed != blob_ref.as_str() {
            warn!(blob = %blob_ref, %computed, "blob content does not match its reference");
            return Err(BlobError::HashMismatch {
                blob_ref: blob_ref.clone(),
                computed,
            });
        }
        Ok(data)
    }

    fn exists(&self, blob_ref: &BlobRef) -> BlobResult<bool> {
        Ok(self
            .path_for(blob_ref)
            .map(|path| path.is_file())
            .unwrap_or(false))
    }
}
