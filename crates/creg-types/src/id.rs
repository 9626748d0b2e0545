use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Prefix accepted (and produced by [`CertificateId::short_id`]) for
/// human-facing identifiers.
pub const ID_PREFIX: &str = "cert:";

/// Globally unique, immutable identifier of an issued certificate.
///
/// A `CertificateId` is a 32-byte digest produced by the identifier deriver
/// in `creg-crypto`. Its canonical text form is 64 lowercase hex characters;
/// that is what issuers hand to students and what verifiers type back in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CertificateId([u8; 32]);

impl CertificateId {
    /// Create a `CertificateId` from a pre-computed digest.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short identifier (`cert:` + first 8 hex characters), for logs.
    pub fn short_id(&self) -> String {
        format!("{ID_PREFIX}{}", hex::encode(&self.0[..4]))
    }

    /// Parse from a hex string, with or without the `cert:` prefix.
    ///
    /// Surrounding whitespace is ignored and upper-case hex is accepted.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        let s = s.strip_prefix(ID_PREFIX).unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl FromStr for CertificateId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CertificateId({})", self.short_id())
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// Serialized as the hex text form so JSON responses carry the same string
// a verifier would type in.
impl Serialize for CertificateId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CertificateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl From<[u8; 32]> for CertificateId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CertificateId {
        CertificateId::from_hash(*blake3::hash(b"sample").as_bytes())
    }

    #[test]
    fn hex_roundtrip() {
        let id = sample();
        let parsed = CertificateId::parse(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_accepts_prefix_whitespace_and_uppercase() {
        let id = sample();
        let input = format!("  {ID_PREFIX}{}\n", id.to_hex().to_uppercase());
        assert_eq!(CertificateId::parse(&input).unwrap(), id);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            CertificateId::parse("garbage"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert_eq!(
            CertificateId::parse("abcd"),
            Err(TypeError::InvalidLength {
                expected: 32,
                actual: 2
            })
        );
    }

    #[test]
    fn short_id_format() {
        let short = sample().short_id();
        assert!(short.starts_with("cert:"));
        assert_eq!(short.len(), 13);
    }

    #[test]
    fn display_is_full_hex() {
        let id = sample();
        let display = format!("{id}");
        assert_eq!(display.len(), 64);
        assert_eq!(display, id.to_hex());
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = sample();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let parsed: CertificateId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn ordering_is_consistent() {
        let id1 = CertificateId::from_hash([0; 32]);
        let id2 = CertificateId::from_hash([1; 32]);
        assert!(id1 < id2);
    }
}
