//! # Key Management
//!
//! Ed25519 keypairs for bridge accounts.
//!
//! A single Ed25519 identity does double duty: it signs transactions and
//! co-signatures, and (converted to its Montgomery form, see
//! [`super::agreement`]) it is the key-agreement identity for the secure
//! payload codec. Accounts never have to publish a second key.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (ed25519-dalek does this for us).
//! - Keys are generated from `OsRng`.
//! - Key bytes are never logged, and `Debug` only prints the public half.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

use crate::config::{SIGNATURE_LENGTH, VERIFYING_KEY_LENGTH};

/// Errors that can occur during key operations.
///
/// Deliberately vague about *why* parsing failed; key material does not
/// belong in error messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not hex")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected {SIGNATURE_LENGTH} bytes")]
    InvalidSignature,
}

/// An account keypair wrapping an Ed25519 signing key.
///
/// `KeyPair` intentionally does NOT implement `Serialize`/`Deserialize`.
/// Exporting a private key should be a deliberate call to
/// [`secret_key_bytes`](Self::secret_key_bytes), never a side effect of
/// serializing some larger structure.
///
/// # Examples
///
/// ```
/// use swiftbridge_protocol::crypto::keys::KeyPair;
///
/// let kp = KeyPair::generate();
/// let msg = b"MT103 single customer credit transfer";
/// let sig = kp.sign(msg);
/// assert!(kp.verify(msg, &sig));
/// ```
pub struct KeyPair {
    signing_key: SigningKey,
}

/// The public half of an account keypair. Serializes as lowercase hex.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    bytes: [u8; VERIFYING_KEY_LENGTH],
}

/// An Ed25519 signature.
///
/// Serializes as lowercase hex. Anything that is not exactly 64 bytes
/// simply fails verification.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl KeyPair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte seed. In Ed25519 the seed *is*
    /// the secret key.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message. Deterministic for a given (key, message) pair.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }

    /// Verify a signature against this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.public_key().verify(message, signature)
    }

    /// Exports the raw 32-byte secret key.
    ///
    /// **Handle with care.** Don't log it, don't ship it anywhere in
    /// plaintext.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes()
    }

    /// Secret key as hex, for the CLI `keygen` output.
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret_key_bytes())
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Public half only. A partial secret is still a leaked secret.
        write!(f, "KeyPair(pub={})", self.public_key().to_hex())
    }
}

impl PartialEq for KeyPair {
    /// Keypairs compare by public key; comparing secrets in variable time
    /// is a habit worth not having.
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for KeyPair {}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Create a `PublicKey` from a byte slice, validating length and that
    /// the bytes decode to an Ed25519 point.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; VERIFYING_KEY_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// Parse a hex-encoded public key (either case).
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::try_from_slice(&bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; VERIFYING_KEY_LENGTH] {
        &self.bytes
    }

    /// Verify a signature against this public key.
    ///
    /// A boolean rather than a `Result`: callers want yes or no, and the
    /// reason a signature is bad is nobody's business.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Some(dalek_sig) = signature.to_dalek_signature() else {
            return false;
        };
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

impl Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

impl Signature {
    /// Create a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn to_dalek_signature(&self) -> Option<DalekSignature> {
        let arr: [u8; SIGNATURE_LENGTH] = self.bytes.as_slice().try_into().ok()?;
        Some(DalekSignature::from_bytes(&arr))
    }

    /// Lowercase hex, 128 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parse a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|_| KeyError::InvalidSignature)?;
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(KeyError::InvalidSignature);
        }
        Ok(Self { bytes })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "Signature({})", hex_str)
        }
    }
}

impl Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Signature::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_sign_verify_roundtrip() {
        let kp = KeyPair::generate();
        let msg = b"MT940 customer statement";
        let sig = kp.sign(msg);
        assert!(kp.verify(msg, &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"correct message");
        assert!(!kp.verify(b"wrong message", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.verify(b"message", &sig));
    }

    #[test]
    fn secret_hex_roundtrip() {
        let kp = KeyPair::generate();
        let restored = KeyPair::from_hex(&kp.secret_key_hex()).unwrap();
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn invalid_secret_hex_rejected() {
        assert_eq!(KeyPair::from_hex("deadbeef"), Err(KeyError::InvalidSecretKey));
        assert_eq!(KeyPair::from_hex("not-hex-at-all"), Err(KeyError::InvalidSecretKey));
    }

    #[test]
    fn public_key_hex_roundtrip_accepts_uppercase() {
        let pk = KeyPair::generate().public_key();
        let recovered = PublicKey::from_hex(&pk.to_hex().to_uppercase()).unwrap();
        assert_eq!(pk, recovered);
    }

    #[test]
    fn public_key_rejects_wrong_length() {
        assert_eq!(
            PublicKey::try_from_slice(&[0u8; 16]),
            Err(KeyError::InvalidPublicKey)
        );
    }

    #[test]
    fn deterministic_from_seed() {
        let seed = [42u8; 32];
        assert_eq!(
            KeyPair::from_seed(&seed).public_key(),
            KeyPair::from_seed(&seed).public_key()
        );
    }

    #[test]
    fn deterministic_signatures() {
        let kp = KeyPair::generate();
        assert_eq!(kp.sign(b"same").as_bytes(), kp.sign(b"same").as_bytes());
    }

    #[test]
    fn signature_hex_roundtrip() {
        let sig = KeyPair::generate().sign(b"test");
        assert_eq!(Signature::from_hex(&sig.to_hex()).unwrap(), sig);
        assert_eq!(Signature::from_hex("abcd"), Err(KeyError::InvalidSignature));
    }

    #[test]
    fn truncated_signature_fails_verification_without_panic() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"msg");
        let truncated = Signature {
            bytes: sig.as_bytes()[..32].to_vec(),
        };
        assert!(!kp.verify(b"msg", &truncated));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = KeyPair::generate();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("KeyPair(pub="));
        assert!(!debug_str.contains(&kp.secret_key_hex()));
    }

    #[test]
    fn clone_preserves_identity() {
        let kp = KeyPair::generate();
        let cloned = kp.clone();
        assert_eq!(kp, cloned);
        assert_eq!(kp.secret_key_bytes(), cloned.secret_key_bytes());
    }

    #[test]
    fn keys_and_signatures_serialize_as_hex() {
        let kp = KeyPair::generate();
        let pk = kp.public_key();
        let sig = kp.sign(b"serde");

        assert_eq!(serde_json::to_string(&pk).unwrap(), format!("\"{}\"", pk.to_hex()));
        assert_eq!(serde_json::to_string(&sig).unwrap(), format!("\"{}\"", sig.to_hex()));

        let pk_back: PublicKey = serde_json::from_str(&serde_json::to_string(&pk).unwrap()).unwrap();
        let sig_back: Signature =
            serde_json::from_str(&serde_json::to_string(&sig).unwrap()).unwrap();
        assert_eq!(pk_back, pk);
        assert_eq!(sig_back, sig);
        assert!(serde_json::from_str::<Signature>("\"abcd\"").is_err());
    }
}
