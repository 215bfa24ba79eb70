//! # Secure Payload Codec
//!
//! Turns a plaintext message (typically a SWIFT MT or MX document) into an
//! encrypted, compressed blob that only the intended recipient can read,
//! and back again.
//!
//! ## Encode pipeline
//!
//! ```text
//! plaintext
//!   -> gzip
//!   -> AES-256-GCM( key = KDF(X25519(sender, recipient), salt),
//!                   aad = sender_pub || recipient_pub )
//!   -> salt || nonce || ciphertext || tag
//! ```
//!
//! Decoding runs the same steps backwards. The salt and nonce are fresh
//! for every call, so encoding the same plaintext twice gives two
//! different blobs that both decode to the same bytes.
//!
//! ## Failure taxonomy
//!
//! Callers need to tell "you handed me garbage" apart from "this payload
//! is unrecoverable":
//!
//! - malformed input: [`CodecError::MalformedEncoding`] (bad hex) and
//!   [`CodecError::BlobTooShort`] are raised before any cryptography runs;
//! - unrecoverable payload: [`CodecError::DecodeFailed`] with
//!   [`DecodeFailure::Authentication`] (wrong keys, any flipped byte) or
//!   [`DecodeFailure::Decompression`] (authentic bytes that do not inflate).
//!
//! Nothing is ever partially returned.

pub mod compression;
pub mod hex_transport;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::config::{BridgeConfig, MIN_ENCRYPTED_BLOB_LENGTH, PAYLOAD_SALT_LENGTH};
use crate::crypto::agreement::{derive_payload_key, shared_secret, AgreementError};
use crate::crypto::encryption::{open, seal};
use crate::crypto::keys::{KeyPair, PublicKey};
use compression::CompressionError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an authentic-looking blob could not be turned back into plaintext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFailure {
    /// The AEAD tag did not verify: wrong keys or corrupted bytes.
    Authentication,
    /// The decrypted bytes are not a valid gzip stream.
    Decompression,
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication failed"),
            Self::Decompression => write!(f, "decompression failed"),
        }
    }
}

/// Errors produced by [`SecurePayloadCodec`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed transport encoding: {reason}")]
    MalformedEncoding { reason: String },

    #[error("encrypted blob too short: {len} bytes, need at least {min}")]
    BlobTooShort { len: usize, min: usize },

    #[error("payload is empty")]
    EmptyPayload,

    #[error("payload of {len} bytes exceeds limit of {max}")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("payload unrecoverable: {0}")]
    DecodeFailed(DecodeFailure),

    #[error("decoded payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("compression failed: {reason}")]
    Compression { reason: String },

    #[error("encryption failed")]
    Encryption,

    /// Encode side only. On decode an unusable sender key is reported as
    /// an authentication failure.
    #[error(transparent)]
    KeyAgreement(#[from] AgreementError),
}

impl CodecError {
    /// `true` for input rejected before any cryptographic processing.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedEncoding { .. } | Self::BlobTooShort { .. }
        )
    }

    /// `true` when the payload is unrecoverable (authentication or
    /// decompression failed).
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::DecodeFailed(_))
    }
}

// ---------------------------------------------------------------------------
// EncryptedBlob
// ---------------------------------------------------------------------------

/// Output of the codec: `salt || nonce || ciphertext || tag`.
///
/// Opaque ciphertext. The only meaningful operations are moving it around
/// and handing it back to [`SecurePayloadCodec::decode`] together with the
/// right keys. Serializes as a lowercase hex string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncryptedBlob {
    bytes: Vec<u8>,
}

impl EncryptedBlob {
    /// Wraps raw bytes read from chain data. Rejects anything shorter than
    /// the fixed envelope.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CodecError> {
        if bytes.len() < MIN_ENCRYPTED_BLOB_LENGTH {
            return Err(CodecError::BlobTooShort {
                len: bytes.len(),
                min: MIN_ENCRYPTED_BLOB_LENGTH,
            });
        }
        Ok(Self { bytes })
    }

    /// Parses the hex transport form.
    pub fn from_hex(encoded: &str) -> Result<Self, CodecError> {
        Self::from_bytes(hex_transport::from_hex(encoded)?)
    }

    /// Lowercase hex transport form.
    pub fn to_hex(&self) -> String {
        hex_transport::to_hex(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn salt(&self) -> [u8; PAYLOAD_SALT_LENGTH] {
        let mut salt = [0u8; PAYLOAD_SALT_LENGTH];
        salt.copy_from_slice(&self.bytes[..PAYLOAD_SALT_LENGTH]);
        salt
    }

    fn sealed(&self) -> &[u8] {
        &self.bytes[PAYLOAD_SALT_LENGTH..]
    }
}

impl fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedBlob({} bytes)", self.bytes.len())
    }
}

impl Serialize for EncryptedBlob {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EncryptedBlob {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SecurePayloadCodec
// ---------------------------------------------------------------------------

/// Stateless encode/decode of secure payloads.
///
/// Holds only size limits, so one instance can be shared freely across
/// threads.
///
/// ```
/// use swiftbridge_protocol::codec::SecurePayloadCodec;
/// use swiftbridge_protocol::crypto::KeyPair;
///
/// let codec = SecurePayloadCodec::default();
/// let alice = KeyPair::generate();
/// let bob = KeyPair::generate();
///
/// let blob = codec.encode(&alice, &bob.public_key(), b"hello swift").unwrap();
/// let plain = codec.decode(&bob, &alice.public_key(), &blob).unwrap();
/// assert_eq!(plain, b"hello swift");
/// ```
#[derive(Debug, Clone)]
pub struct SecurePayloadCodec {
    max_plaintext_len: usize,
    max_blob_len: usize,
}

impl Default for SecurePayloadCodec {
    fn default() -> Self {
        Self::new(&BridgeConfig::default())
    }
}

impl SecurePayloadCodec {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            max_plaintext_len: config.max_plaintext_len,
            max_blob_len: config.max_blob_len,
        }
    }

    /// Compresses and encrypts `plaintext` from `sender` to `recipient`.
    pub fn encode(
        &self,
        sender: &KeyPair,
        recipient: &PublicKey,
        plaintext: &[u8],
    ) -> Result<EncryptedBlob, CodecError> {
        if plaintext.is_empty() {
            return Err(CodecError::EmptyPayload);
        }
        if plaintext.len() > self.max_plaintext_len {
            return Err(CodecError::PayloadTooLarge {
                len: plaintext.len(),
                max: self.max_plaintext_len,
            });
        }

        let compressed = compression::compress(plaintext).map_err(|e| CodecError::Compression {
            reason: e.to_string(),
        })?;

        let mut salt = [0u8; PAYLOAD_SALT_LENGTH];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut salt);

        let secret = shared_secret(sender, recipient)?;
        let key = derive_payload_key(&secret, &salt);
        let aad = associated_data(&sender.public_key(), recipient);
        let sealed = seal(&key, &compressed, &aad).map_err(|_| CodecError::Encryption)?;

        let mut bytes = Vec::with_capacity(PAYLOAD_SALT_LENGTH + sealed.len());
        bytes.extend_from_slice(&salt);
        bytes.extend_from_slice(&sealed);

        if bytes.len() > self.max_blob_len {
            return Err(CodecError::PayloadTooLarge {
                len: bytes.len(),
                max: self.max_blob_len,
            });
        }

        debug!(
            plaintext_len = plaintext.len(),
            compressed_len = compressed.len(),
            blob_len = bytes.len(),
            "secure payload encoded"
        );
        Ok(EncryptedBlob { bytes })
    }

    /// Authenticates, decrypts and inflates `blob`.
    ///
    /// `recipient` is the local keypair the blob was addressed to; `sender`
    /// is the public key of the account that produced it.
    pub fn decode(
        &self,
        recipient: &KeyPair,
        sender: &PublicKey,
        blob: &EncryptedBlob,
    ) -> Result<Vec<u8>, CodecError> {
        if blob.len() < MIN_ENCRYPTED_BLOB_LENGTH {
            return Err(CodecError::BlobTooShort {
                len: blob.len(),
                min: MIN_ENCRYPTED_BLOB_LENGTH,
            });
        }
        if blob.len() > self.max_blob_len {
            return Err(CodecError::PayloadTooLarge {
                len: blob.len(),
                max: self.max_blob_len,
            });
        }

        let secret = shared_secret(recipient, sender)
            .map_err(|_| CodecError::DecodeFailed(DecodeFailure::Authentication))?;
        let key = derive_payload_key(&secret, &blob.salt());
        let aad = associated_data(sender, &recipient.public_key());

        let compressed = open(&key, blob.sealed(), &aad)
            .map_err(|_| CodecError::DecodeFailed(DecodeFailure::Authentication))?;

        let plaintext = compression::decompress(&compressed, self.max_plaintext_len).map_err(
            |e| match e {
                CompressionError::LimitExceeded { limit } => CodecError::PayloadTooLarge {
                    len: limit + 1,
                    max: limit,
                },
                _ => CodecError::DecodeFailed(DecodeFailure::Decompression),
            },
        )?;

        debug!(
            blob_len = blob.len(),
            plaintext_len = plaintext.len(),
            "secure payload decoded"
        );
        Ok(plaintext)
    }

    /// [`encode`](Self::encode), returning the hex transport form.
    pub fn encode_hex(
        &self,
        sender: &KeyPair,
        recipient: &PublicKey,
        plaintext: &[u8],
    ) -> Result<String, CodecError> {
        Ok(self.encode(sender, recipient, plaintext)?.to_hex())
    }

    /// [`decode`](Self::decode) from the hex transport form. Malformed hex
    /// is rejected before any cryptographic work.
    pub fn decode_hex(
        &self,
        recipient: &KeyPair,
        sender: &PublicKey,
        encoded: &str,
    ) -> Result<Vec<u8>, CodecError> {
        let blob = EncryptedBlob::from_hex(encoded)?;
        self.decode(recipient, sender, &blob)
    }

    /// Decodes a payload that is expected to be text (SWIFT FIN or XML).
    pub fn decode_text(
        &self,
        recipient: &KeyPair,
        sender: &PublicKey,
        blob: &EncryptedBlob,
    ) -> Result<String, CodecError> {
        let bytes = self.decode(recipient, sender, blob)?;
        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
    }

    /// [`decode_text`](Self::decode_text) from the hex transport form.
    pub fn decode_hex_text(
        &self,
        recipient: &KeyPair,
        sender: &PublicKey,
        encoded: &str,
    ) -> Result<String, CodecError> {
        let blob = EncryptedBlob::from_hex(encoded)?;
        self.decode_text(recipient, sender, &blob)
    }
}

/// AAD binding a blob to its direction: `sender_pub || recipient_pub`.
fn associated_data(sender: &PublicKey, recipient: &PublicKey) -> Vec<u8> {
    let mut aad = Vec::with_capacity(64);
    aad.extend_from_slice(sender.as_bytes());
    aad.extend_from_slice(recipient.as_bytes());
    aad
}
