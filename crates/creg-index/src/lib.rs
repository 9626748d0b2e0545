//! Student index for the certificate registry.
//!
//! Maps a student id to the certificate ids issued to them, in issuance
//! order. The index is a cache derived from the ledger: it holds ids, never
//! records, and can always be rebuilt by scanning the ledger.
//!
//! # Key Types
//!
//! - [`StudentIndex`] -- Trait boundary (append, list)
//! - [`InMemoryStudentIndex`] -- `HashMap`-backed implementation
//! - [`ConsistencyReport`] -- Result of auditing the index against a ledger

pub mod audit;
pub mod error;
pub mod memory;
pub mod traits;

pub use audit::{audit, rebuild, ConsistencyReport, DanglingRef};
pub use error::{IndexError, IndexResult};
pub use memory::InMemoryStudentIndex;
pub use traits::StudentIndex;
