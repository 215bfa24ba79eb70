//! # Accounts & Addresses
//!
//! An [`Address`] is what the ledger knows an account by. It is derived
//! from the account's Ed25519 public key:
//!
//! ```text
//! public_key (32 bytes)
//!     -> BLAKE3(public_key) -> 32 bytes
//!     -> Bech32("swb", hash) -> swb1...
//! ```
//!
//! An [`Account`] is an address plus whatever key material the local side
//! happens to hold for it: nothing (a recipient known only by address), a
//! public key (a counterparty or cosigner), or a full [`KeyPair`] (a local
//! signer). Accounts compare by address alone.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{ADDRESS_HRP, HASH_OUTPUT_LENGTH};
use crate::crypto::hash::blake3_hash;
use crate::crypto::keys::{KeyPair, PublicKey};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors parsing or binding an address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp { expected: String, got: String },

    #[error("invalid address data length: expected {expected} bytes, got {got}")]
    InvalidDataLength { expected: usize, got: usize },

    #[error("public key does not hash to this address")]
    PublicKeyMismatch,
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// Bech32 ledger address over `BLAKE3(public_key)`.
///
/// ```
/// use swiftbridge_protocol::account::Address;
/// use swiftbridge_protocol::crypto::KeyPair;
///
/// let kp = KeyPair::generate();
/// let address = Address::from_public_key(&kp.public_key());
/// assert!(address.to_string().starts_with("swb1"));
///
/// let parsed: Address = address.to_string().parse().unwrap();
/// assert_eq!(parsed, address);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    key_hash: [u8; HASH_OUTPUT_LENGTH],
}

impl Address {
    pub fn from_public_key(pk: &PublicKey) -> Self {
        Self {
            key_hash: blake3_hash(pk.as_bytes()),
        }
    }

    /// Parses a `swb1...` string, checking HRP, checksum and length.
    pub fn parse(addr: &str) -> Result<Self, AddressError> {
        let (hrp, data) =
            bech32::decode(addr).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        if hrp != address_hrp() {
            return Err(AddressError::InvalidHrp {
                expected: ADDRESS_HRP.to_string(),
                got: hrp.to_string(),
            });
        }
        if data.len() != HASH_OUTPUT_LENGTH {
            return Err(AddressError::InvalidDataLength {
                expected: HASH_OUTPUT_LENGTH,
                got: data.len(),
            });
        }

        let mut key_hash = [0u8; HASH_OUTPUT_LENGTH];
        key_hash.copy_from_slice(&data);
        Ok(Self { key_hash })
    }

    /// `true` if `pk` hashes to this address.
    pub fn matches(&self, pk: &PublicKey) -> bool {
        blake3_hash(pk.as_bytes()) == self.key_hash
    }

    pub fn key_hash(&self) -> &[u8; HASH_OUTPUT_LENGTH] {
        &self.key_hash
    }

    pub fn to_bech32(&self) -> String {
        // 32 bytes is far below the bech32 length limit.
        bech32::encode::<Bech32>(address_hrp(), &self.key_hash)
            .expect("32-byte payload always encodes")
    }
}

fn address_hrp() -> Hrp {
    Hrp::parse_unchecked(ADDRESS_HRP)
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bech32())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_bech32())
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_bech32())
        } else {
            serializer.serialize_bytes(&self.key_hash)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::parse(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            if bytes.len() != HASH_OUTPUT_LENGTH {
                return Err(serde::de::Error::custom(format!(
                    "expected {HASH_OUTPUT_LENGTH}-byte key hash, got {}",
                    bytes.len()
                )));
            }
            let mut key_hash = [0u8; HASH_OUTPUT_LENGTH];
            key_hash.copy_from_slice(&bytes);
            Ok(Address { key_hash })
        }
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A ledger account as seen from this side of the bridge.
#[derive(Clone)]
pub struct Account {
    address: Address,
    public_key: Option<PublicKey>,
    keypair: Option<KeyPair>,
}

impl Account {
    /// A local account we can sign for.
    pub fn local(keypair: KeyPair) -> Self {
        let public_key = keypair.public_key();
        Self {
            address: Address::from_public_key(&public_key),
            public_key: Some(public_key),
            keypair: Some(keypair),
        }
    }

    /// A remote account whose public key is known.
    pub fn from_public_key(public_key: PublicKey) -> Self {
        Self {
            address: Address::from_public_key(&public_key),
            public_key: Some(public_key),
            keypair: None,
        }
    }

    /// A remote account known only by address.
    pub fn from_address(address: Address) -> Self {
        Self {
            address,
            public_key: None,
            keypair: None,
        }
    }

    /// Binds a public key to an address-only account.
    pub fn attach_public_key(&mut self, public_key: PublicKey) -> Result<(), AddressError> {
        if !self.address.matches(&public_key) {
            return Err(AddressError::PublicKeyMismatch);
        }
        self.public_key = Some(public_key);
        Ok(())
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn public_key(&self) -> Option<&PublicKey> {
        self.public_key.as_ref()
    }

    pub fn keypair(&self) -> Option<&KeyPair> {
        self.keypair.as_ref()
    }

    pub fn can_sign(&self) -> bool {
        self.keypair.is_some()
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Account {}

impl std::hash::Hash for Account {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("local", &self.keypair.is_some())
            .finish()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}
