//! Append-only certificate ledger.
//!
//! The ledger is the authoritative mapping from [`CertificateId`] to
//! [`CertificateRecord`]. It provides:
//! - The [`CertificateLedger`] trait boundary (insert, get, contains, scan)
//! - [`InMemoryLedger`] for tests and embedding
//! - [`WalLedger`], a durable ledger backed by a CRC-framed append-only log
//!
//! `insert` is the only mutator. There is no update and no delete: once a
//! record is visible under its id it never changes, and a second insert
//! under the same id fails with [`LedgerError::DuplicateId`].
//!
//! [`CertificateId`]: creg_types::CertificateId
//! [`CertificateRecord`]: creg_types::CertificateRecord

pub mod error;
pub mod memory;
pub mod traits;
pub mod wal;

pub use error::{LedgerError, LedgerResult};
pub use memory::InMemoryLedger;
pub use traits::CertificateLedger;
pub use wal::{SyncMode, WalConfig, WalLedger, MAX_RECORD_LEN};
