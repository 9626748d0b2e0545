//! Foundation types for the certificate registry.
//!
//! Every other `creg-*` crate depends on `creg-types`. Nothing here performs
//! I/O; the types only describe what the registry stores and returns.
//!
//! # Key Types
//!
//! - [`CertificateId`] -- 32-byte content-derived certificate identifier
//! - [`BlobRef`] -- Opaque reference to a payload held by a blob store
//! - [`IssuedAt`] -- Millisecond epoch instant, set once at issuance
//! - [`Clock`] -- Source of "now" for the engine ([`SystemClock`], [`FixedClock`])
//! - [`Grade`] -- Closed grade vocabulary offered to presentation layers
//! - [`CertificateRecord`] -- The immutable record stored in the ledger
//! - [`IssueRequest`] -- Inputs to an issuance

pub mod error;
pub mod grade;
pub mod id;
pub mod record;
pub mod temporal;

pub use error::TypeError;
pub use grade::Grade;
pub use id::CertificateId;
pub use record::{BlobRef, CertificateRecord, IssueRequest};
pub use temporal::{Clock, FixedClock, IssuedAt, SystemClock};
