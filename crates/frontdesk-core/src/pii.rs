//! PII hashing for audit records.
//!
//! Audit records never carry raw emails, phone numbers, or personal names;
//! they carry the hash of the value instead. The digest is the first 16 hex
//! characters of SHA-256 over the UTF-8 value.

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest.
const HASH_PREFIX_LEN: usize = 16;

/// Hash a PII value for inclusion in an audit record.
///
/// Returns the first 16 hex characters of `SHA-256(value)`.
#[must_use]
pub fn hash_pii(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_PREFIX_LEN);
    hash
}
