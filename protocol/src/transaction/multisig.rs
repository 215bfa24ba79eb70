//! # Multisig Assembly
//!
//! Builds a transfer executed on behalf of a multisig account. The three
//! parties are fixed in order by the type system:
//!
//! ```text
//! MultisigAssembler::sender(a)   -> MultisigSenderStage
//!     .recipient(b)              -> MultisigRecipientStage
//!     .multisig(m)               -> MultisigDraft
//! ```
//!
//! Everything after that is unordered. The draft pins its timestamp when
//! it is created so cosigners can sign a stable inner hash while the
//! initiator is still collecting approvals.
//!
//! ## Co-signatures
//!
//! [`MultisigDraft::add_signature`] takes `&self` and appends under a
//! mutex, so approvals arriving on different tasks can be fed into one
//! `Arc<MultisigDraft>`. Each approval is checked on the way in (inner
//! hash, multisig address, Ed25519 signature) and again at build time,
//! since a later `amount`/`fee`/`attachment` change moves the inner hash.
//!
//! Duplicates and an empty approval list are accepted. Quorum is the
//! ledger's concern.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::builder::TransferTransaction;
use super::cosignature::MultisigSignatureTransaction;
use super::types::{DraftState, TransactionKind, TxHash};
use super::{check_deadline, AssemblyError, LedgerTransaction};
use crate::account::{Account, Address};
use crate::attachment::Attachment;
use crate::config::{BridgeConfig, TRANSACTION_VERSION};
use crate::crypto::hash::double_sha256;
use crate::crypto::keys::{KeyPair, PublicKey, Signature};
use crate::time::{TimeInstant, TimeProvider};
use crate::transport::{Receipt, TransportGateway};

// ---------------------------------------------------------------------------
// MultisigTransaction
// ---------------------------------------------------------------------------

/// Wrapper authored by the multisig account around an unsigned inner
/// transfer, plus the co-signatures gathered for it.
///
/// The wrapper's own signature comes from the initiating cosignatory,
/// either supplied on the draft or added later with [`sign`](Self::sign).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigTransaction {
    pub version: u16,
    pub multisig: Address,
    pub timestamp: TimeInstant,
    pub deadline: TimeInstant,
    pub fee: u64,
    pub inner: TransferTransaction,
    /// In the order they were added.
    pub cosignatures: Vec<MultisigSignatureTransaction>,
    pub signature: Option<Signature>,
}

impl MultisigTransaction {
    /// Covers the wrapper header and the inner hash. Co-signatures are
    /// separate ledger transactions and are not part of these bytes.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(160);

        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(TransactionKind::Multisig.to_string().as_bytes());
        buf.push(0x00);

        buf.extend_from_slice(self.multisig.to_string().as_bytes());
        buf.push(0x00);

        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&self.deadline.to_le_bytes());
        buf.extend_from_slice(&self.fee.to_le_bytes());
        buf.extend_from_slice(self.inner.hash().as_bytes());
        buf
    }

    pub fn hash(&self) -> TxHash {
        TxHash::from_bytes(double_sha256(&self.signable_bytes()))
    }

    pub fn inner_hash(&self) -> TxHash {
        self.inner.hash()
    }

    /// Signs the wrapper as the initiating cosignatory.
    pub fn sign(&mut self, initiator: &KeyPair) {
        self.signature = Some(initiator.sign(&self.signable_bytes()));
    }

    pub fn verify_signature(&self, initiator: &PublicKey) -> bool {
        self.signature
            .as_ref()
            .is_some_and(|sig| initiator.verify(&self.signable_bytes(), sig))
    }

    /// Addresses of every cosigner that approved, in order, duplicates kept.
    pub fn cosigners(&self) -> Vec<Address> {
        self.cosignatures
            .iter()
            .map(MultisigSignatureTransaction::signer_address)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Staged construction
// ---------------------------------------------------------------------------

/// Entry point for multisig drafts.
#[derive(Clone)]
pub struct MultisigAssembler {
    time: Arc<dyn TimeProvider>,
    deadline_window: Duration,
    default_fee: u64,
}

impl MultisigAssembler {
    pub fn new(time: Arc<dyn TimeProvider>, config: &BridgeConfig) -> Self {
        Self {
            time,
            deadline_window: config.deadline_window(),
            default_fee: config.default_fee,
        }
    }

    pub fn sender(&self, sender: Account) -> MultisigSenderStage {
        MultisigSenderStage {
            assembler: self.clone(),
            sender,
        }
    }
}

/// Sender chosen; next comes the recipient.
pub struct MultisigSenderStage {
    assembler: MultisigAssembler,
    sender: Account,
}

impl MultisigSenderStage {
    pub fn recipient(self, recipient: Account) -> MultisigRecipientStage {
        MultisigRecipientStage {
            assembler: self.assembler,
            sender: self.sender,
            recipient,
        }
    }
}

/// Sender and recipient chosen; next comes the multisig account.
pub struct MultisigRecipientStage {
    assembler: MultisigAssembler,
    sender: Account,
    recipient: Account,
}

impl MultisigRecipientStage {
    /// Completes the parties and pins the draft's timestamp.
    pub fn multisig(self, multisig: Account) -> MultisigDraft {
        let MultisigAssembler {
            time,
            deadline_window,
            default_fee,
        } = self.assembler;
        let timestamp = time.current_time();
        debug!(multisig = %multisig.address(), %timestamp, "multisig draft opened");

        MultisigDraft {
            sender: self.sender,
            recipient: self.recipient,
            multisig,
            timestamp,
            deadline_window,
            amount: 0,
            attachment: Attachment::empty(),
            fee: default_fee,
            deadline: None,
            signature: None,
            approvals: Mutex::new(Approvals::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// MultisigDraft
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Approvals {
    cosignatures: Vec<MultisigSignatureTransaction>,
    built: bool,
}

/// Multisig transfer under construction.
pub struct MultisigDraft {
    sender: Account,
    recipient: Account,
    multisig: Account,
    timestamp: TimeInstant,
    deadline_window: Duration,
    amount: u64,
    attachment: Attachment,
    fee: u64,
    deadline: Option<TimeInstant>,
    signature: Option<Signature>,
    approvals: Mutex<Approvals>,
}

impl MultisigDraft {
    pub fn sender_account(&self) -> &Account {
        &self.sender
    }

    pub fn recipient_account(&self) -> &Account {
        &self.recipient
    }

    pub fn multisig_account(&self) -> &Account {
        &self.multisig
    }

    pub fn timestamp(&self) -> TimeInstant {
        self.timestamp
    }

    /// Explicit deadline, or timestamp plus the configured window.
    pub fn resolved_deadline(&self) -> TimeInstant {
        self.deadline
            .unwrap_or_else(|| self.timestamp + self.deadline_window)
    }

    pub fn is_built(&self) -> bool {
        self.approvals.lock().built
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), AssemblyError> {
        if self.approvals.lock().built {
            Err(AssemblyError::InvalidState {
                state: DraftState::Signed,
                operation,
            })
        } else {
            Ok(())
        }
    }

    pub fn amount(&mut self, amount: u64) -> Result<&mut Self, AssemblyError> {
        self.ensure_open("set amount on")?;
        self.amount = amount;
        Ok(self)
    }

    pub fn attachment(&mut self, attachment: Attachment) -> Result<&mut Self, AssemblyError> {
        self.ensure_open("set attachment on")?;
        self.attachment = attachment;
        Ok(self)
    }

    pub fn fee(&mut self, fee: u64) -> Result<&mut Self, AssemblyError> {
        self.ensure_open("set fee on")?;
        self.fee = fee;
        Ok(self)
    }

    pub fn deadline(&mut self, deadline: TimeInstant) -> Result<&mut Self, AssemblyError> {
        self.ensure_open("set deadline on")?;
        self.deadline = Some(deadline);
        Ok(self)
    }

    /// Wrapper signature from the initiating cosignatory.
    pub fn signature(&mut self, signature: Signature) -> Result<&mut Self, AssemblyError> {
        self.ensure_open("set signature on")?;
        self.signature = Some(signature);
        Ok(self)
    }

    /// The unsigned inner transfer as it stands now. This is what
    /// cosigners approve.
    pub fn inner_transaction(&self) -> TransferTransaction {
        TransferTransaction {
            version: TRANSACTION_VERSION,
            sender: *self.sender.address(),
            recipient: *self.recipient.address(),
            amount: self.amount,
            attachment: self.attachment.clone(),
            fee: self.fee,
            timestamp: self.timestamp,
            deadline: self.resolved_deadline(),
            sender_public_key: self.sender.public_key().cloned(),
            signature: None,
        }
    }

    pub fn inner_hash(&self) -> TxHash {
        self.inner_transaction().hash()
    }

    /// Appends a cosigner's approval after checking it.
    ///
    /// Rejected approvals leave the list untouched.
    pub fn add_signature(
        &self,
        cosignature: MultisigSignatureTransaction,
    ) -> Result<(), AssemblyError> {
        let expected = self.inner_hash();
        if let Err(err) = self.check_cosignature(&cosignature, &expected) {
            warn!(signer = %cosignature.signer_address(), error = %err, "co-signature rejected");
            return Err(err);
        }

        let mut approvals = self.approvals.lock();
        if approvals.built {
            return Err(AssemblyError::InvalidState {
                state: DraftState::Signed,
                operation: "add signature to",
            });
        }
        approvals.cosignatures.push(cosignature);
        debug!(count = approvals.cosignatures.len(), "co-signature added");
        Ok(())
    }

    /// Snapshot of accepted approvals in insertion order.
    pub fn cosignatures(&self) -> Vec<MultisigSignatureTransaction> {
        self.approvals.lock().cosignatures.clone()
    }

    /// Drops approvals that no longer match the current inner transaction,
    /// e.g. after `amount` or `fee` changed. Returns how many were removed.
    pub fn prune_stale_signatures(&self) -> usize {
        let expected = self.inner_hash();
        let mut approvals = self.approvals.lock();
        if approvals.built {
            return 0;
        }
        let before = approvals.cosignatures.len();
        approvals
            .cosignatures
            .retain(|c| self.check_cosignature(c, &expected).is_ok());
        let removed = before - approvals.cosignatures.len();
        if removed > 0 {
            debug!(removed, remaining = approvals.cosignatures.len(), "stale co-signatures pruned");
        }
        removed
    }

    fn check_cosignature(
        &self,
        cosignature: &MultisigSignatureTransaction,
        expected: &TxHash,
    ) -> Result<(), AssemblyError> {
        if cosignature.inner_hash != *expected {
            return Err(AssemblyError::InvalidSignature {
                reason: format!(
                    "co-signature approves {} but inner transaction is {}",
                    cosignature.inner_hash, expected
                ),
            });
        }
        if cosignature.multisig != *self.multisig.address() {
            return Err(AssemblyError::InvalidSignature {
                reason: format!(
                    "co-signature is for multisig {} not {}",
                    cosignature.multisig,
                    self.multisig.address()
                ),
            });
        }
        if !cosignature.verify() {
            return Err(AssemblyError::InvalidSignature {
                reason: format!("bad signature from {}", cosignature.signer_address()),
            });
        }
        Ok(())
    }

    /// Assembles the multisig wrapper. Does not sign or send.
    ///
    /// Every approval is re-checked against the final inner hash. On
    /// success the draft is spent.
    pub fn build_multisig_transaction(&self) -> Result<MultisigTransaction, AssemblyError> {
        let deadline = self.resolved_deadline();
        check_deadline(self.timestamp, deadline)?;

        let inner = self.inner_transaction();
        let inner_hash = inner.hash();

        let mut approvals = self.approvals.lock();
        if approvals.built {
            return Err(AssemblyError::InvalidState {
                state: DraftState::Signed,
                operation: "build",
            });
        }
        for cosignature in &approvals.cosignatures {
            self.check_cosignature(cosignature, &inner_hash)?;
        }

        let tx = MultisigTransaction {
            version: TRANSACTION_VERSION,
            multisig: *self.multisig.address(),
            timestamp: self.timestamp,
            deadline,
            fee: self.fee,
            inner,
            cosignatures: approvals.cosignatures.clone(),
            signature: self.signature.clone(),
        };
        approvals.built = true;

        info!(
            hash = %tx.hash(),
            %inner_hash,
            cosignatures = tx.cosignatures.len(),
            "multisig transaction assembled"
        );
        Ok(tx)
    }

    /// [`build_multisig_transaction`](Self::build_multisig_transaction),
    /// then announce. Zero approvals is not an error here.
    pub async fn build_and_send_multisig_transaction<G>(
        &self,
        gateway: &G,
    ) -> Result<(MultisigTransaction, Receipt), AssemblyError>
    where
        G: TransportGateway + ?Sized,
    {
        let tx = self.build_multisig_transaction()?;
        let receipt = gateway
            .announce(&LedgerTransaction::Multisig(tx.clone()))
            .await?;
        Ok((tx, receipt))
    }
}
