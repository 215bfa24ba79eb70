//! Small value types shared by the transaction assemblers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::HASH_OUTPUT_LENGTH;

// ---------------------------------------------------------------------------
// TransactionKind
// ---------------------------------------------------------------------------

/// Which of the three ledger transaction shapes a value is.
///
/// The discriminant string is part of each transaction's signable bytes,
/// so a co-signature can never be replayed as a transfer or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Plain value transfer, optionally carrying an attachment.
    Transfer,
    /// A cosigner's approval of a pending multisig inner transaction.
    MultisigSignature,
    /// Wrapper authored by a multisig account around an inner transfer.
    Multisig,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => write!(f, "Transfer"),
            Self::MultisigSignature => write!(f, "MultisigSignature"),
            Self::Multisig => write!(f, "Multisig"),
        }
    }
}

// ---------------------------------------------------------------------------
// TxHash
// ---------------------------------------------------------------------------

/// Double-SHA-256 of a transaction's signable bytes. Displays as hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxHash([u8; HASH_OUTPUT_LENGTH]);

impl TxHash {
    pub const fn from_bytes(bytes: [u8; HASH_OUTPUT_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_OUTPUT_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for TxHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; HASH_OUTPUT_LENGTH];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl Serialize for TxHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// DraftState
// ---------------------------------------------------------------------------

/// Lifecycle of a [`TransactionDraft`](super::TransactionDraft).
///
/// `Building -> Finalized -> Signed`. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DraftState {
    /// Fields may be set.
    Building,
    /// Timestamp and deadline resolved; fields are frozen.
    Finalized,
    /// Signed transaction produced. Terminal.
    Signed,
}

impl fmt::Display for DraftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => write!(f, "Building"),
            Self::Finalized => write!(f, "Finalized"),
            Self::Signed => write!(f, "Signed"),
        }
    }
}
