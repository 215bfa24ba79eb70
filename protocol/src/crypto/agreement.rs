//! # Static Key Agreement
//!
//! Derives the symmetric key that protects a secure payload from the two
//! parties' long-lived Ed25519 identities.
//!
//! ## Construction
//!
//! 1. The peer's Ed25519 public key is decompressed and mapped to its
//!    Montgomery form (the birational map between edwards25519 and
//!    curve25519).
//! 2. Our X25519 scalar is the low half of `SHA-512(seed)`, exactly the
//!    scalar Ed25519 itself signs with (X25519 clamps it the same way).
//! 3. `X25519(our_scalar, peer_u)` yields a shared point both sides agree
//!    on, since `a·(b·B) = b·(a·B)`.
//! 4. The raw DH output is never used as a key. It goes through BLAKE3
//!    `derive_key` with [`PAYLOAD_KDF_CONTEXT`] and a per-message salt.
//!
//! There is no forward secrecy: payloads on chain must stay readable by
//! the recipient for as long as the recipient holds their key. The salt
//! keeps per-message keys distinct.

use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha512};
use thiserror::Error;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use super::keys::{KeyPair, PublicKey};
use crate::config::{AES_KEY_LENGTH, PAYLOAD_KDF_CONTEXT, PAYLOAD_SALT_LENGTH};

/// Errors in the static key agreement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgreementError {
    #[error("key agreement failed: peer public key is not a valid curve point")]
    InvalidPublicKey,

    #[error("key agreement failed: shared secret is not contributory")]
    NonContributory,
}

/// Computes the raw X25519 shared secret between `local` and `peer`.
///
/// Symmetric: `shared_secret(a, b.pub) == shared_secret(b, a.pub)`.
pub fn shared_secret(local: &KeyPair, peer: &PublicKey) -> Result<[u8; 32], AgreementError> {
    let peer_point = CompressedEdwardsY(*peer.as_bytes())
        .decompress()
        .ok_or(AgreementError::InvalidPublicKey)?
        .to_montgomery();

    let secret = StaticSecret::from(agreement_scalar(local));
    let shared = secret.diffie_hellman(&X25519PublicKey::from(peer_point.to_bytes()));

    // Low-order peer points collapse the output to zero. Refuse rather than
    // encrypt under a key anyone can compute.
    if !shared.was_contributory() {
        return Err(AgreementError::NonContributory);
    }
    Ok(shared.to_bytes())
}

/// Derives the AES-256 payload key from a shared secret and message salt.
///
///   key = BLAKE3-derive-key(
///     context = PAYLOAD_KDF_CONTEXT,
///     input   = shared_secret || salt
///   )
pub fn derive_payload_key(
    shared_secret: &[u8; 32],
    salt: &[u8; PAYLOAD_SALT_LENGTH],
) -> [u8; AES_KEY_LENGTH] {
    let mut hasher = blake3::Hasher::new_derive_key(PAYLOAD_KDF_CONTEXT);
    hasher.update(shared_secret);
    hasher.update(salt);

    let mut key = [0u8; AES_KEY_LENGTH];
    hasher.finalize_xof().fill(&mut key);
    key
}

/// The Ed25519 signing scalar for `keypair`, unclamped. `StaticSecret`
/// applies the X25519 clamp on construction.
fn agreement_scalar(keypair: &KeyPair) -> [u8; 32] {
    let digest = Sha512::digest(keypair.secret_key_bytes());
    let mut scalar = [0u8; 32];
    scalar.copy_from_slice(&digest[..32]);
    scalar
}
