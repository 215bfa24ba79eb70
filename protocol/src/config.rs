//! # Bridge Configuration & Constants
//!
//! Every magic number in the bridge lives here. The cryptographic constants
//! in particular are the wire-compatibility contract: two independently
//! built clients can only exchange payloads if they agree on every value in
//! the "Secure Payload Wire Format" section below. Change one and every
//! historical payload on chain becomes unreadable.
//!
//! Tunable limits (deadline window, fee, payload sizes) are collected into
//! [`BridgeConfig`], which can be loaded from JSON and injected into the
//! codec and the assemblers.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The crate-level version string reported by the CLI.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Transaction format version stamped into every signable byte stream.
/// Bump on any change to canonical serialization.
pub const TRANSACTION_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Signing Parameters
// ---------------------------------------------------------------------------

/// Ed25519 for every signature in the system: senders, cosigners and the
/// multisig wrapper alike.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Signing key length in bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Public (verifying) key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Secure Payload Wire Format
// ---------------------------------------------------------------------------

/// Key agreement: X25519 over the Montgomery form of both parties' Ed25519
/// identity keys. No separate encryption keys to distribute.
pub const KEY_AGREEMENT_ALGORITHM: &str = "X25519";

/// Authenticated cipher applied to the compressed payload.
pub const SYMMETRIC_ALGORITHM: &str = "AES-256-GCM";

/// Compression applied before encryption. Gzip framing so historical
/// payloads stay readable with stock tooling after decryption.
pub const COMPRESSION_ALGORITHM: &str = "gzip";

/// BLAKE3 `derive_key` context for payload keys. Part of the wire contract.
pub const PAYLOAD_KDF_CONTEXT: &str = "swiftbridge v1 secure payload key";

/// AES-256-GCM key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length in bytes.
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const AES_TAG_LENGTH: usize = 16;

/// Per-message random salt mixed into the key derivation, so two payloads
/// between the same pair of accounts never share a key.
pub const PAYLOAD_SALT_LENGTH: usize = 32;

/// Smallest well-formed blob: salt, nonce and an empty ciphertext's tag.
pub const MIN_ENCRYPTED_BLOB_LENGTH: usize =
    PAYLOAD_SALT_LENGTH + AES_NONCE_LENGTH + AES_TAG_LENGTH;

/// Hash output length in bytes for transaction hashes and address digests.
pub const HASH_OUTPUT_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Bech32 human-readable prefix for bridge account addresses.
pub const ADDRESS_HRP: &str = "swb";

// ---------------------------------------------------------------------------
// Timing Constants
// ---------------------------------------------------------------------------

/// Deadline window applied when a draft is finalized without an explicit
/// deadline. One hour matches the ledger's default transaction lifetime.
pub const DEFAULT_DEADLINE_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Upper bound on any deadline window. The ledger rejects transactions that
/// expire more than a day after their timestamp.
pub const MAX_DEADLINE_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

// ---------------------------------------------------------------------------
// Fee & Size Parameters
// ---------------------------------------------------------------------------

/// Fee used when a draft never sets one. Zero is legal at this layer; fee
/// sufficiency is the ledger's concern.
pub const DEFAULT_FEE: u64 = 0;

/// Largest plaintext the codec will accept. SWIFT MT messages are a few
/// kilobytes; MX/XML renditions can be an order of magnitude larger.
pub const MAX_PLAINTEXT_LENGTH: usize = 64 * 1024;

/// Largest encrypted blob accepted for decoding. Compression rarely expands
/// input by more than a few percent, plus the fixed envelope overhead.
pub const MAX_ENCRYPTED_BLOB_LENGTH: usize = MAX_PLAINTEXT_LENGTH + 1024;

// ---------------------------------------------------------------------------
// BridgeConfig
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`BridgeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime-tunable limits shared by the codec and the assemblers.
///
/// Every field has a default, so a JSON file only needs the keys it wants
/// to override:
///
/// ```
/// use swiftbridge_protocol::config::BridgeConfig;
///
/// let cfg = BridgeConfig::from_json_str(r#"{ "default_fee": 50000 }"#).unwrap();
/// assert_eq!(cfg.default_fee, 50_000);
/// assert_eq!(cfg.deadline_window_secs, 3600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Seconds added to the current time when no deadline is supplied.
    pub deadline_window_secs: u64,
    /// Fee applied to drafts that never call `fee()`.
    pub default_fee: u64,
    /// Largest plaintext accepted by `encode`.
    pub max_plaintext_len: usize,
    /// Largest blob accepted by `decode`.
    pub max_blob_len: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            deadline_window_secs: DEFAULT_DEADLINE_WINDOW.as_secs(),
            default_fee: DEFAULT_FEE,
            max_plaintext_len: MAX_PLAINTEXT_LENGTH,
            max_blob_len: MAX_ENCRYPTED_BLOB_LENGTH,
        }
    }
}

impl BridgeConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// The deadline window as a `Duration`.
    pub fn deadline_window(&self) -> Duration {
        Duration::from_secs(self.deadline_window_secs)
    }

    /// Rejects configurations that would make every draft or payload fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "deadline_window_secs must be greater than zero".into(),
            ));
        }
        if self.deadline_window() > MAX_DEADLINE_WINDOW {
            return Err(ConfigError::Invalid(format!(
                "deadline_window_secs must not exceed {}",
                MAX_DEADLINE_WINDOW.as_secs()
            )));
        }
        if self.max_plaintext_len == 0 {
            return Err(ConfigError::Invalid(
                "max_plaintext_len must be greater than zero".into(),
            ));
        }
        if self.max_blob_len < MIN_ENCRYPTED_BLOB_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "max_blob_len must be at least {MIN_ENCRYPTED_BLOB_LENGTH}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_parameter_sizes() {
        assert_eq!(SIGNING_KEY_LENGTH, 32);
        assert_eq!(VERIFYING_KEY_LENGTH, 32);
        assert_eq!(SIGNATURE_LENGTH, 64);
        assert_eq!(AES_KEY_LENGTH, 32);
        assert_eq!(AES_NONCE_LENGTH, 12);
        assert_eq!(HASH_OUTPUT_LENGTH, 32);
        assert_eq!(MIN_ENCRYPTED_BLOB_LENGTH, 60);
    }

    #[test]
    fn test_deadline_window_sanity() {
        assert!(DEFAULT_DEADLINE_WINDOW > Duration::ZERO);
        assert!(DEFAULT_DEADLINE_WINDOW <= MAX_DEADLINE_WINDOW);
    }

    #[test]
    fn test_blob_limit_covers_plaintext_limit() {
        // A maximal plaintext that compresses badly must still decode.
        assert!(MAX_ENCRYPTED_BLOB_LENGTH > MAX_PLAINTEXT_LENGTH + MIN_ENCRYPTED_BLOB_LENGTH);
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = BridgeConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.deadline_window(), DEFAULT_DEADLINE_WINDOW);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = BridgeConfig::from_json_str(r#"{ "deadline_window_secs": 120 }"#).unwrap();
        assert_eq!(cfg.deadline_window_secs, 120);
        assert_eq!(cfg.default_fee, DEFAULT_FEE);
        assert_eq!(cfg.max_plaintext_len, MAX_PLAINTEXT_LENGTH);
    }

    #[test]
    fn zero_deadline_window_rejected() {
        let err = BridgeConfig::from_json_str(r#"{ "deadline_window_secs": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn oversized_deadline_window_rejected() {
        let json = format!(
            r#"{{ "deadline_window_secs": {} }}"#,
            MAX_DEADLINE_WINDOW.as_secs() + 1
        );
        assert!(BridgeConfig::from_json_str(&json).is_err());
    }

    #[test]
    fn tiny_blob_limit_rejected() {
        let err = BridgeConfig::from_json_str(r#"{ "max_blob_len": 10 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = BridgeConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
