use creg_types::{BlobRef, CertificateId, CertificateRecord};
use serde::{Deserialize, Serialize};

/// What a successful issuance hands back to the issuer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReceipt {
    pub id: CertificateId,
    pub blob_ref: BlobRef,
    pub record: CertificateRecord,
}

/// Result of looking up a certificate id.
///
/// Absence is an ordinary outcome: forged and mistyped ids are expected
/// input, so `NotFound` is a value, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified {
        record: CertificateRecord,
        /// Where the document can be retrieved. `None` when the blob store
        /// could not resolve the reference; the record is still authentic.
        locator: Option<String>,
    },
    NotFound,
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Verified { .. })
    }

    pub fn record(&self) -> Option<&CertificateRecord> {
        match self {
            VerificationOutcome::Verified { record, .. } => Some(record),
            VerificationOutcome::NotFound => None,
        }
    }

    pub fn locator(&self) -> Option<&str> {
        match self {
            VerificationOutcome::Verified { locator, .. } => locator.as_deref(),
            VerificationOutcome::NotFound => None,
        }
    }
}

/// Registry size counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub certificates: usize,
    pub students: usize,
}
