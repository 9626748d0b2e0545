//! Content-addressed blob storage for certificate payloads.
//!
//! The registry never keeps certificate documents itself. It hands the bytes
//! to a blob store, keeps the returned [`BlobRef`], and later asks the store
//! for a locator (a URL or path) when a verifier wants to see the document.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- fan-out directory of content-named files
//!
//! [`BlobAdapter`] sits in front of any backend and adds the reference
//! cache the engine relies on for idempotent uploads.
//!
//! # Design Rules
//!
//! 1. A reference is derived from the payload bytes (BLAKE3, domain `creg-blob-v1`).
//! 2. Storing the same bytes twice yields the same reference.
//! 3. `resolve()` never reads the payload.
//! 4. All I/O errors are propagated, never silently ignored.
//!
//! [`BlobRef`]: creg_types::BlobRef

pub mod adapter;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use adapter::BlobAdapter;
pub use error::{BlobError, BlobResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::{content_ref, BlobStore};
