/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"creg-blob-v1"`,
/// `"creg-certificate-v1"`) that is prepended to every hash computation. A
/// blob and a certificate identifier built from identical bytes therefore
/// never share a digest.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for certificate payloads held by blob stores.
    pub const BLOB: Self = Self {
        domain: "creg-blob-v1",
    };
    /// Hasher for certificate identifiers.
    pub const CERTIFICATE: Self = Self {
        domain: "creg-certificate-v1",
    };

    fn start(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = self.start();
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Hex-encoded [`hash`](Self::hash).
    pub fn hash_hex(&self, data: &[u8]) -> String {
        hex::encode(self.hash(data))
    }

    /// Hash a sequence of fields, each prefixed with its length as a
    /// big-endian `u64`.
    ///
    /// `["ab", "c"]` and `["a", "bc"]` hash differently.
    pub fn hash_fields(&self, fields: &[&[u8]]) -> [u8; 32] {
        let mut hasher = self.start();
        for field in fields {
            hasher.update(&(field.len() as u64).to_be_bytes());
            hasher.update(field);
        }
        *hasher.finalize().as_bytes()
    }
}
