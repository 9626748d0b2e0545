//! Certificate registry engine.
//!
//! Composes the ledger, the student index, and a blob store into the three
//! operations presentation layers call: [`Registry::issue`],
//! [`Registry::verify`], and [`Registry::list_by_student`].
//!
//! Construct one [`Registry`] at process start (from a [`RegistryConfig`] or
//! from explicit backends) and share it; there is no global instance.

pub mod config;
pub mod error;
pub mod outcome;
pub mod registry;

pub use config::{Backend, RegistryConfig};
pub use error::{EngineError, EngineResult, IssueError};
pub use outcome::{IssueReceipt, RegistryStats, VerificationOutcome};
pub use registry::Registry;

// Re-export key types
pub use creg_index::ConsistencyReport;
pub use creg_types::{
    BlobRef, CertificateId, CertificateRecord, Clock, FixedClock, Grade, IssueRequest, IssuedAt,
    SystemClock,
};
