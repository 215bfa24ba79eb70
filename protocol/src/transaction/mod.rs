//! # Transaction Assembly
//!
//! Turns payload-bearing transfers into ledger transactions, either signed
//! directly by the sender or wrapped for a multisig account and approved by
//! independent cosigners.
//!
//! ## Architecture
//!
//! ```text
//! types.rs       - TransactionKind, TxHash, DraftState
//! builder.rs     - TransferTransaction and the Building/Finalized/Signed draft
//! cosignature.rs - MultisigSignatureTransaction, a cosigner's approval
//! multisig.rs    - staged sender -> recipient -> multisig assembler
//! ```
//!
//! ## Design Decisions
//!
//! - Hashes are `double_sha256` of canonical bytes: fixed-width
//!   little-endian integers, 0x00-separated strings, length-prefixed
//!   optional data. Never JSON.
//! - Every signable byte stream starts with the transaction version and
//!   kind, so no signature verifies under a different transaction shape.
//! - Drafts are single-owner and consumed once. The only shared mutation
//!   point is [`MultisigDraft::add_signature`].

pub mod builder;
pub mod cosignature;
pub mod multisig;
pub mod types;

pub use builder::{TransactionAssembler, TransactionDraft, TransferTransaction};
pub use cosignature::MultisigSignatureTransaction;
pub use multisig::{
    MultisigAssembler, MultisigDraft, MultisigRecipientStage, MultisigSenderStage,
    MultisigTransaction,
};
pub use types::{DraftState, TransactionKind, TxHash};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::TimeInstant;
use crate::transport::TransportError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while assembling or announcing a transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("incomplete draft: missing {missing}")]
    IncompleteDraft { missing: &'static str },

    #[error("cannot {operation} a draft in state {state}")]
    InvalidState {
        state: DraftState,
        operation: &'static str,
    },

    #[error("invalid signature: {reason}")]
    InvalidSignature { reason: String },

    #[error("deadline {deadline} is not within the allowed window after timestamp {timestamp}")]
    InvalidDeadline {
        timestamp: TimeInstant,
        deadline: TimeInstant,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

// ---------------------------------------------------------------------------
// LedgerTransaction
// ---------------------------------------------------------------------------

/// Anything the bridge hands to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "transaction")]
pub enum LedgerTransaction {
    Transfer(TransferTransaction),
    MultisigSignature(MultisigSignatureTransaction),
    Multisig(MultisigTransaction),
}

impl LedgerTransaction {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Transfer(_) => TransactionKind::Transfer,
            Self::MultisigSignature(_) => TransactionKind::MultisigSignature,
            Self::Multisig(_) => TransactionKind::Multisig,
        }
    }

    pub fn hash(&self) -> TxHash {
        match self {
            Self::Transfer(tx) => tx.hash(),
            Self::MultisigSignature(tx) => tx.hash(),
            Self::Multisig(tx) => tx.hash(),
        }
    }
}

impl From<TransferTransaction> for LedgerTransaction {
    fn from(tx: TransferTransaction) -> Self {
        Self::Transfer(tx)
    }
}

impl From<MultisigSignatureTransaction> for LedgerTransaction {
    fn from(tx: MultisigSignatureTransaction) -> Self {
        Self::MultisigSignature(tx)
    }
}

impl From<MultisigTransaction> for LedgerTransaction {
    fn from(tx: MultisigTransaction) -> Self {
        Self::Multisig(tx)
    }
}

// ---------------------------------------------------------------------------
// Deadline policy
// ---------------------------------------------------------------------------

/// Checks `timestamp < deadline <= timestamp + MAX_DEADLINE_WINDOW`.
pub(crate) fn check_deadline(
    timestamp: TimeInstant,
    deadline: TimeInstant,
) -> Result<(), AssemblyError> {
    match timestamp.until(deadline) {
        Some(window) if window <= crate::config::MAX_DEADLINE_WINDOW => Ok(()),
        _ => Err(AssemblyError::InvalidDeadline {
            timestamp,
            deadline,
        }),
    }
}
