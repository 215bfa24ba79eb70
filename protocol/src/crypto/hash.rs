//! # Hashing Utilities
//!
//! Two hash functions, two jobs:
//!
//! - **double SHA-256** for transaction hashes. Co-signatures commit to the
//!   inner transaction's hash, so this one is part of the wire contract.
//! - **BLAKE3** for address digests (and, via `derive_key`, payload keys in
//!   [`super::agreement`]).

use sha2::{Digest, Sha256};

use crate::config::HASH_OUTPUT_LENGTH;

/// SHA-256 of `data` as a fixed-size array.
pub fn sha256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&Sha256::digest(data));
    output
}

/// `SHA-256(SHA-256(data))`. Used for every transaction hash.
///
/// ```
/// use swiftbridge_protocol::crypto::double_sha256;
///
/// assert_eq!(double_sha256(b"raw transaction bytes").len(), 32);
/// ```
pub fn double_sha256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    sha256(&sha256(data))
}

/// BLAKE3 digest of `data`.
pub fn blake3_hash(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    *blake3::hash(data).as_bytes()
}
