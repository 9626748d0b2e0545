use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::CertificateId;
use crate::temporal::IssuedAt;

/// Opaque reference to a payload held by a blob store.
///
/// The registry never interprets it; it is whatever the store returned from
/// `store()` (typically the content hash) and is handed back to `resolve()`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobRef({})", self.0)
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One issued credential.
///
/// Once inserted into a ledger under `id`, no field ever changes. Revocation
/// would be a separate record, never an edit of this one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub id: CertificateId,
    pub student_id: String,
    pub student_name: String,
    pub course: String,
    /// Stored verbatim; see [`Grade`](crate::Grade) for the usual vocabulary.
    pub grade: String,
    pub blob_ref: BlobRef,
    /// Address or account string of the issuing principal.
    pub issuer: String,
    pub issued_at: IssuedAt,
}

/// Domain tag for record digests. Same `"<domain>:"` prefix layout as the
/// hashers in `creg-crypto`.
pub const RECORD_DIGEST_DOMAIN: &str = "creg-record-v1";

impl CertificateRecord {
    /// Domain-separated BLAKE3 digest of the record's canonical JSON
    /// encoding.
    ///
    /// Two reads of the same record yield the same digest; any field change
    /// yields a different one.
    pub fn content_digest(&self) -> Result<[u8; 32], TypeError> {
        let bytes =
            serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(RECORD_DIGEST_DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(&bytes);
        Ok(*hasher.finalize().as_bytes())
    }

    /// Returns `true` if the issuer-supplied fields equal those of `request`.
    pub fn matches_request(&self, request: &IssueRequest) -> bool {
        self.student_id == request.student_id
            && self.student_name == request.student_name
            && self.course == request.course
            && self.grade == request.grade
            && self.issuer == request.issuer
    }
}

/// Everything an issuer supplies to create a certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct IssueRequest {
    pub student_id: String,
    pub student_name: String,
    pub course: String,
    pub grade: String,
    pub issuer: String,
    /// The certificate document (usually a PDF).
    pub payload: Vec<u8>,
}

impl IssueRequest {
    pub fn new(student_id: impl Into<String>, course: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            student_name: String::new(),
            course: course.into(),
            grade: String::new(),
            issuer: String::new(),
            payload: Vec::new(),
        }
    }

    pub fn with_student_name(mut self, name: impl Into<String>) -> Self {
        self.student_name = name.into();
        self
    }

    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = grade.into();
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Build the record this request produces once the payload is stored
    /// and the identifier derived.
    pub fn into_record(
        self,
        id: CertificateId,
        blob_ref: BlobRef,
        issued_at: IssuedAt,
    ) -> CertificateRecord {
        CertificateRecord {
            id,
            student_id: self.student_id,
            student_name: self.student_name,
            course: self.course,
            grade: self.grade,
            blob_ref,
            issuer: self.issuer,
            issued_at,
        }
    }
}

// Payloads can be megabytes; log the size only.
impl fmt::Debug for IssueRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssueRequest")
            .field("student_id", &self.student_id)
            .field("student_name", &self.student_name)
            .field("course", &self.course)
            .field("grade", &self.grade)
            .field("issuer", &self.issuer)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> IssueRequest {
        IssueRequest::new("ST2024001", "Computer Science")
            .with_student_name("John Doe")
            .with_grade("A")
            .with_issuer("0x1234567890123456789012345678901234567890")
            .with_payload(b"%PDF-1.7 certificate".to_vec())
    }

    fn record() -> CertificateRecord {
        request().into_record(
            CertificateId::from_hash([7; 32]),
            BlobRef::new("b3-abc"),
            IssuedAt::from_millis(1_700_000_000_000),
        )
    }

    #[test]
    fn into_record_carries_every_field() {
        let rec = record();
        assert_eq!(rec.student_id, "ST2024001");
        assert_eq!(rec.student_name, "John Doe");
        assert_eq!(rec.course, "Computer Science");
        assert_eq!(rec.grade, "A");
        assert_eq!(rec.issuer, "0x1234567890123456789012345678901234567890");
        assert_eq!(rec.blob_ref.as_str(), "b3-abc");
        assert_eq!(rec.issued_at, IssuedAt::from_millis(1_700_000_000_000));
        assert!(rec.matches_request(&request()));
    }

    #[test]
    fn grade_is_kept_verbatim() {
        let rec = IssueRequest::new("s", "c")
            .with_grade(" distinction (hons) ")
            .into_record(
                CertificateId::from_hash([1; 32]),
                BlobRef::new("r"),
                IssuedAt::from_millis(1),
            );
        assert_eq!(rec.grade, " distinction (hons) ");
    }

    #[test]
    fn content_digest_is_stable_and_field_sensitive() {
        let a = record();
        let b = record();
        assert_eq!(a.content_digest().unwrap(), b.content_digest().unwrap());

        let mut changed = record();
        changed.grade = "B".into();
        assert_ne!(a.content_digest().unwrap(), changed.content_digest().unwrap());
    }

    #[test]
    fn content_digest_is_domain_separated() {
        let rec = record();
        let json = serde_json::to_vec(&rec).unwrap();
        let undomained = *blake3::hash(&json).as_bytes();
        assert_ne!(rec.content_digest().unwrap(), undomained);

        let mut prefixed = format!("{RECORD_DIGEST_DOMAIN}:").into_bytes();
        prefixed.extend_from_slice(&json);
        assert_eq!(rec.content_digest().unwrap(), *blake3::hash(&prefixed).as_bytes());
    }

    #[test]
    fn debug_hides_payload_bytes() {
        let debug = format!("{:?}", request());
        assert!(debug.contains("payload_len"));
        assert!(!debug.contains("PDF"));
    }

    #[test]
    fn blob_ref_is_transparent_in_json() {
        let json = serde_json::to_string(&BlobRef::new("b3-xyz")).unwrap();
        assert_eq!(json, "\"b3-xyz\"");
    }

    #[test]
    fn record_survives_bincode() {
        let rec = record();
        let bytes = bincode::serialize(&rec).unwrap();
        let decoded: CertificateRecord = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, rec);
    }
}
