//! # Cryptographic Primitives
//!
//! Everything security-related in the bridge flows through here:
//!
//! - **Ed25519** for account identities, transaction signatures and
//!   co-signatures.
//! - **X25519** over the same keys for payload key agreement.
//! - **AES-256-GCM** for authenticated payload encryption.
//! - **BLAKE3** for key derivation and address digests.
//! - **double SHA-256** for transaction hashes.
//!
//! Thin, type-safe wrappers over audited implementations. Nothing here is
//! hand-rolled.

pub mod agreement;
pub mod encryption;
pub mod hash;
pub mod keys;

pub use agreement::{derive_payload_key, shared_secret, AgreementError};
pub use encryption::{open, seal, EncryptionError};
pub use hash::{blake3_hash, double_sha256, sha256};
pub use keys::{KeyError, KeyPair, PublicKey, Signature};
