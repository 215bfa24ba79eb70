//! Single-signer transfers.
//!
//! A [`TransactionDraft`] moves through three states:
//!
//! ```text
//! Building --finalize()--> Finalized --build_transaction()--> Signed
//! ```
//!
//! Setters only work in `Building`. `finalize` stamps the timestamp from
//! the injected clock and fills in a default deadline. `build_transaction`
//! signs the canonical bytes with the sender's key and hands back an
//! immutable [`TransferTransaction`]. After that the draft is spent.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::types::{DraftState, TransactionKind, TxHash};
use super::{check_deadline, AssemblyError, LedgerTransaction};
use crate::account::{Account, Address};
use crate::attachment::Attachment;
use crate::config::{BridgeConfig, TRANSACTION_VERSION};
use crate::crypto::hash::double_sha256;
use crate::crypto::keys::{PublicKey, Signature};
use crate::time::{TimeInstant, TimeProvider};
use crate::transport::{Receipt, TransportGateway};

// ---------------------------------------------------------------------------
// TransferTransaction
// ---------------------------------------------------------------------------

/// A transfer from `sender` to `recipient`, optionally carrying an
/// attachment.
///
/// # Canonical Byte Format
///
/// [`signable_bytes`](Self::signable_bytes) serializes: version, kind,
/// sender, recipient, amount, fee, timestamp, deadline, attachment. The
/// sender's public key and the signature are excluded, so the hash is the
/// same before and after signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTransaction {
    pub version: u16,
    pub sender: Address,
    pub recipient: Address,
    /// Native amount in the smallest ledger unit.
    pub amount: u64,
    pub attachment: Attachment,
    pub fee: u64,
    pub timestamp: TimeInstant,
    pub deadline: TimeInstant,
    /// Embedded so the ledger can verify without a key lookup.
    pub sender_public_key: Option<PublicKey>,
    /// `None` for the unsigned inner transaction of a multisig wrapper.
    pub signature: Option<Signature>,
}

impl TransferTransaction {
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);

        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(TransactionKind::Transfer.to_string().as_bytes());
        buf.push(0x00);

        buf.extend_from_slice(self.sender.to_string().as_bytes());
        buf.push(0x00);
        buf.extend_from_slice(self.recipient.to_string().as_bytes());
        buf.push(0x00);

        buf.extend_from_slice(&self.amount.to_le_bytes());
        buf.extend_from_slice(&self.fee.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&self.deadline.to_le_bytes());

        buf.extend_from_slice(&self.attachment.canonical_bytes());
        buf
    }

    /// `double_sha256(signable_bytes)`. Stable across signing.
    pub fn hash(&self) -> TxHash {
        TxHash::from_bytes(double_sha256(&self.signable_bytes()))
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// `true` if the signature verifies under the embedded public key and
    /// that key belongs to the sender address.
    pub fn verify_signature(&self) -> bool {
        match (&self.sender_public_key, &self.signature) {
            (Some(pk), Some(sig)) => {
                self.sender.matches(pk) && pk.verify(&self.signable_bytes(), sig)
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionAssembler
// ---------------------------------------------------------------------------

/// Hands out [`TransactionDraft`]s bound to a clock and a config.
#[derive(Clone)]
pub struct TransactionAssembler {
    time: Arc<dyn TimeProvider>,
    deadline_window: Duration,
    default_fee: u64,
}

impl TransactionAssembler {
    pub fn new(time: Arc<dyn TimeProvider>, config: &BridgeConfig) -> Self {
        Self {
            time,
            deadline_window: config.deadline_window(),
            default_fee: config.default_fee,
        }
    }

    pub fn draft(&self) -> TransactionDraft {
        TransactionDraft {
            time: Arc::clone(&self.time),
            deadline_window: self.deadline_window,
            state: DraftState::Building,
            sender: None,
            recipient: None,
            amount: 0,
            attachment: Attachment::empty(),
            fee: self.default_fee,
            timestamp: None,
            deadline: None,
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionDraft
// ---------------------------------------------------------------------------

/// Mutable accumulation of a transfer. Single owner, used once.
///
/// ```
/// use std::sync::Arc;
/// use swiftbridge_protocol::account::Account;
/// use swiftbridge_protocol::config::BridgeConfig;
/// use swiftbridge_protocol::crypto::KeyPair;
/// use swiftbridge_protocol::time::FixedTimeProvider;
/// use swiftbridge_protocol::transaction::TransactionAssembler;
///
/// let assembler = TransactionAssembler::new(
///     Arc::new(FixedTimeProvider::at_secs(1_700_000_000)),
///     &BridgeConfig::default(),
/// );
/// let mut draft = assembler.draft();
/// draft
///     .sender(Account::local(KeyPair::generate())).unwrap()
///     .recipient(Account::local(KeyPair::generate())).unwrap()
///     .amount(250).unwrap();
///
/// let tx = draft.build_transaction().unwrap();
/// assert!(tx.verify_signature());
/// ```
pub struct TransactionDraft {
    time: Arc<dyn TimeProvider>,
    deadline_window: Duration,
    state: DraftState,
    sender: Option<Account>,
    recipient: Option<Account>,
    amount: u64,
    attachment: Attachment,
    fee: u64,
    timestamp: Option<TimeInstant>,
    deadline: Option<TimeInstant>,
}

impl std::fmt::Debug for TransactionDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionDraft")
            .field("deadline_window", &self.deadline_window)
            .field("state", &self.state)
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .field("amount", &self.amount)
            .field("attachment", &self.attachment)
            .field("fee", &self.fee)
            .field("timestamp", &self.timestamp)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl TransactionDraft {
    pub fn state(&self) -> DraftState {
        self.state
    }

    pub fn timestamp(&self) -> Option<TimeInstant> {
        self.timestamp
    }

    pub fn deadline_value(&self) -> Option<TimeInstant> {
        self.deadline
    }

    fn ensure_building(&self, operation: &'static str) -> Result<(), AssemblyError> {
        if self.state == DraftState::Building {
            Ok(())
        } else {
            Err(AssemblyError::InvalidState {
                state: self.state,
                operation,
            })
        }
    }

    pub fn sender(&mut self, account: Account) -> Result<&mut Self, AssemblyError> {
        self.ensure_building("set sender on")?;
        self.sender = Some(account);
        Ok(self)
    }

    pub fn recipient(&mut self, account: Account) -> Result<&mut Self, AssemblyError> {
        self.ensure_building("set recipient on")?;
        self.recipient = Some(account);
        Ok(self)
    }

    pub fn amount(&mut self, amount: u64) -> Result<&mut Self, AssemblyError> {
        self.ensure_building("set amount on")?;
        self.amount = amount;
        Ok(self)
    }

    pub fn attachment(&mut self, attachment: Attachment) -> Result<&mut Self, AssemblyError> {
        self.ensure_building("set attachment on")?;
        self.attachment = attachment;
        Ok(self)
    }

    pub fn fee(&mut self, fee: u64) -> Result<&mut Self, AssemblyError> {
        self.ensure_building("set fee on")?;
        self.fee = fee;
        Ok(self)
    }

    pub fn deadline(&mut self, deadline: TimeInstant) -> Result<&mut Self, AssemblyError> {
        self.ensure_building("set deadline on")?;
        self.deadline = Some(deadline);
        Ok(self)
    }

    /// Freezes the draft: checks required fields (including a sender that
    /// can sign), stamps the timestamp and resolves the deadline. On error nothing changes and the draft stays
    /// in `Building`. A second call on a finalized draft is a no-op.
    pub fn finalize(&mut self) -> Result<(), AssemblyError> {
        match self.state {
            DraftState::Finalized => return Ok(()),
            DraftState::Signed => {
                return Err(AssemblyError::InvalidState {
                    state: self.state,
                    operation: "finalize",
                })
            }
            DraftState::Building => {}
        }

        match &self.sender {
            None => return Err(AssemblyError::IncompleteDraft { missing: "sender" }),
            Some(sender) if !sender.can_sign() => {
                return Err(AssemblyError::IncompleteDraft {
                    missing: "sender keypair",
                })
            }
            Some(_) => {}
        }
        if self.recipient.is_none() {
            return Err(AssemblyError::IncompleteDraft {
                missing: "recipient",
            });
        }

        let timestamp = self.time.current_time();
        let deadline = self
            .deadline
            .unwrap_or_else(|| timestamp + self.deadline_window);
        check_deadline(timestamp, deadline)?;

        self.timestamp = Some(timestamp);
        self.deadline = Some(deadline);
        self.state = DraftState::Finalized;
        debug!(%timestamp, %deadline, "transfer draft finalized");
        Ok(())
    }

    /// Finalizes if needed, then signs with the sender's keypair.
    pub fn build_transaction(&mut self) -> Result<TransferTransaction, AssemblyError> {
        if self.state == DraftState::Signed {
            return Err(AssemblyError::InvalidState {
                state: self.state,
                operation: "build",
            });
        }
        self.finalize()?;

        let (sender, recipient, timestamp, deadline) = match (
            &self.sender,
            &self.recipient,
            self.timestamp,
            self.deadline,
        ) {
            (Some(s), Some(r), Some(t), Some(d)) => (s, r, t, d),
            _ => return Err(AssemblyError::IncompleteDraft { missing: "sender" }),
        };
        let keypair = sender.keypair().ok_or(AssemblyError::IncompleteDraft {
            missing: "sender keypair",
        })?;

        let mut tx = TransferTransaction {
            version: TRANSACTION_VERSION,
            sender: *sender.address(),
            recipient: *recipient.address(),
            amount: self.amount,
            attachment: self.attachment.clone(),
            fee: self.fee,
            timestamp,
            deadline,
            sender_public_key: Some(keypair.public_key()),
            signature: None,
        };
        tx.signature = Some(keypair.sign(&tx.signable_bytes()));

        self.state = DraftState::Signed;
        info!(hash = %tx.hash(), amount = tx.amount, fee = tx.fee, "transfer signed");
        Ok(tx)
    }

    /// [`build_transaction`](Self::build_transaction), then announce.
    pub async fn build_and_send<G>(&mut self, gateway: &G) -> Result<Receipt, AssemblyError>
    where
        G: TransportGateway + ?Sized,
    {
        let tx = self.build_transaction()?;
        Ok(gateway.announce(&LedgerTransaction::Transfer(tx)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::attach_from;
    use crate::codec::SecurePayloadCodec;
    use crate::crypto::KeyPair;
    use crate::time::FixedTimeProvider;
    use crate::transport::{InMemoryGateway, TransportError};

    const NOW: u64 = 1_700_000_000;

    fn assembler() -> TransactionAssembler {
        TransactionAssembler::new(
            Arc::new(FixedTimeProvider::at_secs(NOW)),
            &BridgeConfig::default(),
        )
    }

    fn ready_draft() -> (TransactionDraft, KeyPair, KeyPair) {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let mut draft = assembler().draft();
        draft
            .sender(Account::local(a.clone()))
            .unwrap()
            .recipient(Account::from_public_key(b.public_key()))
            .unwrap();
        (draft, a, b)
    }

    #[test]
    fn zero_amount_without_attachment_builds() {
        let (mut draft, _, _) = ready_draft();
        draft.amount(0).unwrap();
        let tx = draft.build_transaction().unwrap();
        assert_eq!(tx.amount, 0);
        assert_eq!(tx.attachment, Attachment::empty());
        assert!(tx.verify_signature());
    }

    #[test]
    fn default_deadline_uses_window() {
        let (mut draft, _, _) = ready_draft();
        let tx = draft.build_transaction().unwrap();
        assert_eq!(tx.timestamp, TimeInstant::from_secs(NOW));
        assert_eq!(tx.deadline, TimeInstant::from_secs(NOW + 3600));
    }

    #[test]
    fn explicit_deadline_is_kept() {
        let (mut draft, _, _) = ready_draft();
        draft.deadline(TimeInstant::from_secs(NOW + 60)).unwrap();
        let tx = draft.build_transaction().unwrap();
        assert_eq!(tx.deadline, TimeInstant::from_secs(NOW + 60));
    }

    #[test]
    fn past_deadline_rejected_and_draft_stays_building() {
        let (mut draft, _, _) = ready_draft();
        draft.deadline(TimeInstant::from_secs(NOW)).unwrap();
        assert!(matches!(
            draft.finalize(),
            Err(AssemblyError::InvalidDeadline { .. })
        ));
        assert_eq!(draft.state(), DraftState::Building);

        draft.deadline(TimeInstant::from_secs(NOW + 1)).unwrap();
        draft.finalize().unwrap();
        assert_eq!(draft.state(), DraftState::Finalized);
    }

    #[test]
    fn missing_parties_reported() {
        let mut draft = assembler().draft();
        assert_eq!(
            draft.finalize(),
            Err(AssemblyError::IncompleteDraft { missing: "sender" })
        );
        draft.sender(Account::local(KeyPair::generate())).unwrap();
        assert_eq!(
            draft.build_transaction().unwrap_err(),
            AssemblyError::IncompleteDraft {
                missing: "recipient"
            }
        );
        assert_eq!(draft.state(), DraftState::Building);
    }

    #[test]
    fn sender_without_keypair_cannot_sign() {
        let mut draft = assembler().draft();
        draft
            .sender(Account::from_public_key(KeyPair::generate().public_key()))
            .unwrap()
            .recipient(Account::from_public_key(KeyPair::generate().public_key()))
            .unwrap();
        assert_eq!(
            draft.build_transaction().unwrap_err(),
            AssemblyError::IncompleteDraft {
                missing: "sender keypair"
            }
        );
        assert_eq!(draft.state(), DraftState::Building);
    }

    #[test]
    fn sender_can_be_corrected_after_missing_keypair() {
        let a = KeyPair::generate();
        let mut draft = assembler().draft();
        draft
            .sender(Account::from_public_key(a.public_key()))
            .unwrap()
            .recipient(Account::from_public_key(KeyPair::generate().public_key()))
            .unwrap();
        assert!(draft.finalize().is_err());

        draft.sender(Account::local(a.clone())).unwrap();
        let tx = draft.build_transaction().unwrap();
        assert_eq!(tx.sender_public_key, Some(a.public_key()));
        assert!(tx.verify_signature());
    }

    #[test]
    fn setters_are_last_write_wins() {
        let (mut draft, _, _) = ready_draft();
        draft.amount(1).unwrap().amount(2).unwrap().fee(5).unwrap().fee(3).unwrap();
        let tx = draft.build_transaction().unwrap();
        assert_eq!(tx.amount, 2);
        assert_eq!(tx.fee, 3);
    }

    #[test]
    fn setters_fail_after_finalize() {
        let (mut draft, _, _) = ready_draft();
        draft.finalize().unwrap();
        assert_eq!(
            draft.amount(9).unwrap_err(),
            AssemblyError::InvalidState {
                state: DraftState::Finalized,
                operation: "set amount on"
            }
        );
        // Finalized drafts still build.
        assert!(draft.build_transaction().is_ok());
    }

    #[test]
    fn signed_draft_is_spent() {
        let (mut draft, _, _) = ready_draft();
        draft.build_transaction().unwrap();
        assert_eq!(draft.state(), DraftState::Signed);

        assert!(matches!(
            draft.fee(1),
            Err(AssemblyError::InvalidState {
                state: DraftState::Signed,
                ..
            })
        ));
        assert!(matches!(
            draft.build_transaction(),
            Err(AssemblyError::InvalidState { .. })
        ));
        assert!(matches!(
            draft.finalize(),
            Err(AssemblyError::InvalidState { .. })
        ));
    }

    #[test]
    fn hash_is_stable_across_signing() {
        let (mut draft, _, _) = ready_draft();
        let tx = draft.build_transaction().unwrap();
        let mut unsigned = tx.clone();
        unsigned.signature = None;
        unsigned.sender_public_key = None;
        assert_eq!(tx.hash(), unsigned.hash());
    }

    #[test]
    fn tampering_breaks_signature() {
        let (mut draft, _, _) = ready_draft();
        let mut tx = draft.build_transaction().unwrap();
        tx.amount += 1;
        assert!(!tx.verify_signature());
    }

    #[test]
    fn foreign_public_key_does_not_verify() {
        let (mut draft, _, _) = ready_draft();
        let mut tx = draft.build_transaction().unwrap();
        let impostor = KeyPair::generate();
        tx.sender_public_key = Some(impostor.public_key());
        tx.signature = Some(impostor.sign(&tx.signable_bytes()));
        assert!(!tx.verify_signature());
    }

    #[test]
    fn attachment_is_covered_by_signature() {
        let (mut draft, a, b) = ready_draft();
        let blob = SecurePayloadCodec::default()
            .encode(&a, &b.public_key(), b"hello swift")
            .unwrap();
        draft.attachment(attach_from(Some(blob), &[]).unwrap()).unwrap();
        let mut tx = draft.build_transaction().unwrap();
        assert!(tx.verify_signature());

        tx.attachment = Attachment::empty();
        assert!(!tx.verify_signature());
    }

    #[test]
    fn signable_bytes_are_deterministic() {
        let (mut draft, _, _) = ready_draft();
        let tx = draft.build_transaction().unwrap();
        assert_eq!(tx.signable_bytes(), tx.clone().signable_bytes());
    }

    #[tokio::test]
    async fn build_and_send_announces() {
        let gateway = InMemoryGateway::new();
        let (mut draft, _, _) = ready_draft();
        let receipt = draft.build_and_send(&gateway).await.unwrap();

        assert_eq!(receipt.kind, TransactionKind::Transfer);
        assert_eq!(gateway.len(), 1);
        assert_eq!(gateway.announced()[0].hash(), receipt.hash);
    }

    #[tokio::test]
    async fn transport_failure_surfaces() {
        let gateway = InMemoryGateway::failing(TransportError::Unavailable {
            reason: "node offline".into(),
        });
        let (mut draft, _, _) = ready_draft();
        let err = draft.build_and_send(&gateway).await.unwrap_err();
        assert!(matches!(
            err,
            AssemblyError::Transport(TransportError::Unavailable { .. })
        ));
        assert!(gateway.is_empty());
    }
}
