//! Chain-of-custody primitives.
//!
//! Custody records are append-only rows owned by the db layer; this module
//! holds the action vocabulary, the chain-consistency checker, and the
//! self-describing custody certificate whose signature is the SHA-256 of
//! its own deterministic serialization.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hashing::{sha256_hex, sha512_hex};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Action constants
// ---------------------------------------------------------------------------

/// Known custody actions recorded against a piece of evidence.
pub mod actions {
    pub const UPLOADED: &str = "uploaded";
    pub const PROCESSED: &str = "processed";
    pub const PROCESSING_FAILED: &str = "processing_failed";
    pub const INTEGRITY_CHECK_FAILED: &str = "integrity_check_failed";
    pub const EXPORTED: &str = "exported";
    pub const CERTIFIED: &str = "certified";
    pub const ANNOTATED: &str = "annotated";
}

/// Actor name used for records written by the pipeline itself.
pub const SYSTEM_ACTOR: &str = "evidence-processing-system";

/// Forensic standard referenced by generated certificates.
pub const STANDARD_REFERENCE: &str = "ISO 27037:2012";

/// Certificate format version.
pub const CERTIFICATE_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// Chain consistency
// ---------------------------------------------------------------------------

/// The subset of a custody record needed to check chain consistency.
#[derive(Debug, Clone)]
pub struct ChainLink {
    pub action: String,
    pub hash_before: Option<String>,
    pub hash_after: Option<String>,
    pub recorded_at: Timestamp,
}

/// Verify that a per-evidence custody chain is internally consistent.
///
/// Checks, in order:
/// - timestamps are non-decreasing;
/// - every `hash_after` that is present equals `content_hash` (the video
///   bytes are never mutated, only re-hashed for verification);
/// - whenever consecutive records both carry hashes, the later record's
///   `hash_before` equals the earlier record's `hash_after`.
pub fn verify_chain(links: &[ChainLink], content_hash: &str) -> Result<(), CoreError> {
    let mut prev: Option<&ChainLink> = None;

    for (i, link) in links.iter().enumerate() {
        if let Some(p) = prev {
            if link.recorded_at < p.recorded_at {
                return Err(CoreError::Validation(format!(
                    "Custody chain out of order at record {i}: \
                     {} precedes {}",
                    link.recorded_at, p.recorded_at
                )));
            }
            if let (Some(before), Some(after)) = (&link.hash_before, &p.hash_after) {
                if before != after {
                    return Err(CoreError::Validation(format!(
                        "Custody chain broken at record {i}: \
                         hash_before does not match previous hash_after"
                    )));
                }
            }
        }

        if let Some(after) = &link.hash_after {
            if !after.eq_ignore_ascii_case(content_hash) {
                return Err(CoreError::Validation(format!(
                    "Custody record {i} ({}) carries a hash_after that does \
                     not match the evidence content hash",
                    link.action
                )));
            }
        }

        prev = Some(link);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Custody certificate
// ---------------------------------------------------------------------------

/// A self-describing, signed custody statement for one action on one piece
/// of evidence.
///
/// `signature` is the SHA-256 hex digest of the deterministic JSON
/// serialization of every other field. `serde_json` maps keep keys sorted,
/// so re-serializing the same fields always reproduces the signed bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodyCertificate {
    pub version: String,
    pub evidence_id: DbId,
    pub filename: String,
    pub action: String,
    pub actor: String,
    /// UTC ISO-8601 timestamp, frozen at certification time.
    pub timestamp: String,
    pub hashes: CertificateHashes,
    pub standard_reference: String,
    pub certification_statement: String,
    pub signature: String,
}

/// Content digests embedded in a certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateHashes {
    pub sha256: String,
    pub sha512: String,
}

/// Produce a signed custody certificate for an action on a piece of evidence.
pub fn certify(
    evidence_id: DbId,
    filename: &str,
    sha256_hash: &str,
    sha512_hash: &str,
    actor: &str,
    action: &str,
    timestamp: Timestamp,
) -> CustodyCertificate {
    let timestamp = timestamp.to_rfc3339();
    let certification_statement = format!(
        "This certificate attests that the file '{filename}' with SHA-256 \
         hash {sha256_hash} was {action} by {actor} at {timestamp} UTC."
    );

    let mut certificate = CustodyCertificate {
        version: CERTIFICATE_VERSION.to_string(),
        evidence_id,
        filename: filename.to_string(),
        action: action.to_string(),
        actor: actor.to_string(),
        timestamp,
        hashes: CertificateHashes {
            sha256: sha256_hash.to_string(),
            sha512: sha512_hash.to_string(),
        },
        standard_reference: STANDARD_REFERENCE.to_string(),
        certification_statement,
        signature: String::new(),
    };

    certificate.signature = compute_signature(&certificate);
    certificate
}

/// Recompute a certificate's signature and compare against the embedded one.
pub fn verify_certificate(certificate: &CustodyCertificate) -> bool {
    compute_signature(certificate) == certificate.signature
}

/// SHA-256 over the sorted-key JSON serialization of all fields except
/// `signature`.
fn compute_signature(certificate: &CustodyCertificate) -> String {
    let value = serde_json::json!({
        "version": certificate.version,
        "evidence_id": certificate.evidence_id,
        "filename": certificate.filename,
        "action": certificate.action,
        "actor": certificate.actor,
        "timestamp": certificate.timestamp,
        "hashes": {
            "sha256": certificate.hashes.sha256,
            "sha512": certificate.hashes.sha512,
        },
        "standard_reference": certificate.standard_reference,
        "certification_statement": certificate.certification_statement,
    });
    sha256_hex(value.to_string().as_bytes())
}

// ---------------------------------------------------------------------------
// Evidence package
// ---------------------------------------------------------------------------

/// Assemble a complete evidence package: video information, the full
/// custody chain, and arbitrary metadata, sealed with a SHA-512 package
/// hash over the deterministic serialization of the contents.
pub fn build_evidence_package(
    video_information: serde_json::Value,
    chain_of_custody: serde_json::Value,
    metadata: serde_json::Value,
    created_at: Timestamp,
) -> serde_json::Value {
    let mut package = serde_json::json!({
        "package_version": "1.0",
        "created_at": created_at.to_rfc3339(),
        "video_information": video_information,
        "chain_of_custody": chain_of_custody,
        "metadata": metadata,
    });

    let package_hash = sha512_hex(package.to_string().as_bytes());
    package["package_hash"] = serde_json::Value::String(package_hash);
    package
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
