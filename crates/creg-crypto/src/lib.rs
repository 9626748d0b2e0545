//! Hashing primitives for the certificate registry.
//!
//! Provides domain-separated BLAKE3 hashing and the identifier deriver that
//! turns `(student_id, course, issued_at)` into a [`CertificateId`].
//!
//! All crypto operations wrap established libraries; no custom cryptography.
//!
//! [`CertificateId`]: creg_types::CertificateId

pub mod deriver;
pub mod hasher;

pub use deriver::{derive, legacy_label, normalize_course};
pub use hasher::ContentHasher;
