//! Content hashing for evidence integrity.
//!
//! Every uploaded video is identified by its SHA-256 digest (the
//! deduplication key) and additionally fingerprinted with SHA-512 for
//! custody certificates. Both digests are lowercase hex.

use sha2::{Digest, Sha256, Sha512};

use crate::error::CoreError;

/// Supported content-hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Parse an algorithm name as it appears in custody records and
    /// verification requests.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        match name.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            other => Err(CoreError::InvalidAlgorithm(other.to_string())),
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Length of the hex digest produced by this algorithm.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }
}

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Compute a SHA-512 hex digest of the given bytes.
pub fn sha512_hex(data: &[u8]) -> String {
    let hash = Sha512::digest(data);
    format!("{hash:x}")
}

/// Compute the hex digest of `data` with the given algorithm.
pub fn digest_hex(data: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Sha256 => sha256_hex(data),
        HashAlgorithm::Sha512 => sha512_hex(data),
    }
}

/// Recompute the digest of `data` and compare against `expected`.
///
/// The comparison is case-insensitive on the hex representation. Returns
/// `CoreError::InvalidAlgorithm` when `algorithm` is not a recognized name.
pub fn verify(data: &[u8], expected: &str, algorithm: &str) -> Result<bool, CoreError> {
    let algorithm = HashAlgorithm::parse(algorithm)?;
    Ok(digest_hex(data, algorithm).eq_ignore_ascii_case(expected))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_produces_known_sha256() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_is_deterministic() {
        let data = b"evidence bytes";
        assert_eq!(sha256_hex(data), sha256_hex(data));
        assert_eq!(sha256_hex(data).len(), 64);
    }

    #[test]
    fn sha512_digest_is_128_hex_chars() {
        assert_eq!(sha512_hex(b"evidence bytes").len(), 128);
    }

    #[test]
    fn digest_hex_matches_direct_functions() {
        let data = b"abc";
        assert_eq!(digest_hex(data, HashAlgorithm::Sha256), sha256_hex(data));
        assert_eq!(digest_hex(data, HashAlgorithm::Sha512), sha512_hex(data));
    }

    #[test]
    fn parse_accepts_known_names() {
        assert_eq!(HashAlgorithm::parse("sha256").unwrap(), HashAlgorithm::Sha256);
        assert_eq!(HashAlgorithm::parse("SHA-512").unwrap(), HashAlgorithm::Sha512);
    }

    #[test]
    fn parse_rejects_unknown_algorithm() {
        assert!(HashAlgorithm::parse("md5").is_err());
        assert!(HashAlgorithm::parse("").is_err());
    }

    #[test]
    fn verify_accepts_matching_digest() {
        let data = b"hello world";
        let digest = sha256_hex(data);
        assert!(verify(data, &digest, "sha256").unwrap());
        assert!(verify(data, &digest.to_uppercase(), "sha256").unwrap());
    }

    #[test]
    fn verify_rejects_mismatched_digest() {
        let digest = sha256_hex(b"original");
        assert!(!verify(b"tampered", &digest, "sha256").unwrap());
    }

    #[test]
    fn verify_fails_on_unknown_algorithm() {
        assert!(verify(b"data", "00", "crc32").is_err());
    }
}
