//! # AES-256-GCM Sealing
//!
//! Authenticated encryption for secure payloads. The codec derives a fresh
//! key per message (see [`super::agreement`]) and seals the compressed
//! payload here, binding both parties' public keys as additional
//! authenticated data.
//!
//! ## Nonce management
//!
//! Random 96-bit nonces from the OS RNG. Keys are already unique per
//! message thanks to the salt, so nonce reuse would need a salt collision
//! first.
//!
//! ## Wire format
//!
//! [`seal`] returns `nonce || ciphertext || tag`; [`open`] expects the
//! same layout.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use thiserror::Error;

use crate::config::{AES_KEY_LENGTH, AES_NONCE_LENGTH, AES_TAG_LENGTH};

/// Errors that can occur during sealing/opening.
///
/// "Wrong key" and "tampered ciphertext" are deliberately the same error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("encryption failed")]
    EncryptFailed,

    #[error("decryption failed -- wrong key or corrupted ciphertext")]
    DecryptFailed,

    #[error("sealed data too short: must be at least {} bytes", AES_NONCE_LENGTH + AES_TAG_LENGTH)]
    CiphertextTooShort,
}

/// Encrypts `plaintext` under `key`, authenticating `aad` alongside it.
///
/// # Example
///
/// ```
/// use swiftbridge_protocol::crypto::encryption::{seal, open};
///
/// let key = [0x42u8; 32];
/// let sealed = seal(&key, b"{4::20:REF-001-}", b"header").unwrap();
/// assert_eq!(open(&key, &sealed, b"header").unwrap(), b"{4::20:REF-001-}");
/// ```
pub fn seal(
    key: &[u8; AES_KEY_LENGTH],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::EncryptFailed)?;

    let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| EncryptionError::EncryptFailed)?;

    let mut out = Vec::with_capacity(AES_NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypts data produced by [`seal`]. Fails with `DecryptFailed` on a
/// wrong key, a wrong `aad`, or any modified byte.
pub fn open(
    key: &[u8; AES_KEY_LENGTH],
    sealed: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    if sealed.len() < AES_NONCE_LENGTH + AES_TAG_LENGTH {
        return Err(EncryptionError::CiphertextTooShort);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(AES_NONCE_LENGTH);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::DecryptFailed)?;

    cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| EncryptionError::DecryptFailed)
}
