//! End-to-end tests for the bridge.
//!
//! Each test walks a message the whole way: encode for a recipient, attach
//! to a transfer, assemble (directly or through a multisig account),
//! announce to an in-memory ledger, then pull the blob back out of what
//! the ledger recorded and decode it on the recipient's side.

use std::sync::Arc;

use swiftbridge_protocol::codec::{CodecError, DecodeFailure};
use swiftbridge_protocol::config::BridgeConfig;
use swiftbridge_protocol::transaction::{AssemblyError, LedgerTransaction, TransactionKind};
use swiftbridge_protocol::{
    attach_from, Account, AssetId, Attachment, EncryptedBlob, FixedTimeProvider,
    InMemoryGateway, KeyPair, MultisigAssembler, MultisigSignatureTransaction,
    SecurePayloadCodec, TimeInstant, TimeProvider, TransactionAssembler, TransportGateway,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const NOW: u64 = 1_700_000_000;

const MT103: &str = "{1:F01BANKBEBBAXXX0000000000}{2:I103BANKDEFFXXXXN}{4:\n\
    :20:REF-2026-0001\n:23B:CRED\n:32A:261018EUR1000,00\n\
    :50K:/BE71096123456769\nALICE EXAMPLE\n:59:/DE89370400440532013000\nBOB EXAMPLE\n\
    :71A:SHA\n-}";

fn clock() -> Arc<dyn TimeProvider> {
    Arc::new(FixedTimeProvider::at_secs(NOW))
}

/// Pulls the payload out of whatever the ledger recorded.
fn recorded_blob(tx: &LedgerTransaction) -> EncryptedBlob {
    let attachment = match tx {
        LedgerTransaction::Transfer(t) => &t.attachment,
        LedgerTransaction::Multisig(m) => &m.inner.attachment,
        LedgerTransaction::MultisigSignature(_) => panic!("approvals carry no payload"),
    };
    attachment.message().cloned().expect("payload attached")
}

// ---------------------------------------------------------------------------
// Direct transfer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mt103_survives_direct_transfer() {
    let codec = SecurePayloadCodec::default();
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let gateway = InMemoryGateway::new();

    let blob = codec.encode(&alice, &bob.public_key(), MT103.as_bytes()).unwrap();
    let attachment = attach_from(Some(blob), &[]).unwrap();

    let mut draft = TransactionAssembler::new(clock(), &BridgeConfig::default()).draft();
    draft
        .sender(Account::local(alice.clone()))
        .unwrap()
        .recipient(Account::from_public_key(bob.public_key()))
        .unwrap()
        .attachment(attachment)
        .unwrap();
    let receipt = draft.build_and_send(&gateway).await.unwrap();
    assert_eq!(receipt.kind, TransactionKind::Transfer);

    // Bob reads it off the ledger.
    let recorded = gateway.announced();
    assert_eq!(recorded.len(), 1);
    let LedgerTransaction::Transfer(tx) = &recorded[0] else {
        panic!("expected transfer");
    };
    assert!(tx.verify_signature());

    let text = codec
        .decode_text(&bob, &alice.public_key(), &recorded_blob(&recorded[0]))
        .unwrap();
    assert_eq!(text, MT103);
}

#[tokio::test]
async fn hex_transport_through_json_ledger_record() {
    // The ledger stores JSON; the blob must come back out of it intact.
    let codec = SecurePayloadCodec::default();
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let gateway = InMemoryGateway::new();

    let blob = codec.encode(&alice, &bob.public_key(), b"hello swift").unwrap();
    let mut draft = TransactionAssembler::new(clock(), &BridgeConfig::default()).draft();
    draft
        .sender(Account::local(alice.clone()))
        .unwrap()
        .recipient(Account::from_public_key(bob.public_key()))
        .unwrap()
        .attachment(Attachment::with_message(blob))
        .unwrap();
    draft.build_and_send(&gateway).await.unwrap();

    let json = serde_json::to_string(&gateway.announced()[0]).unwrap();
    let restored: LedgerTransaction = serde_json::from_str(&json).unwrap();

    let hex = recorded_blob(&restored).to_hex();
    assert_eq!(
        codec
            .decode_hex(&bob, &alice.public_key(), &hex.to_uppercase())
            .unwrap(),
        b"hello swift"
    );
}

#[test]
fn eavesdropper_gets_decode_failure_not_garbage() {
    let codec = SecurePayloadCodec::default();
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let eve = KeyPair::generate();

    let blob = codec.encode(&alice, &bob.public_key(), MT103.as_bytes()).unwrap();
    assert_eq!(
        codec.decode(&eve, &alice.public_key(), &blob),
        Err(CodecError::DecodeFailed(DecodeFailure::Authentication))
    );
}

#[test]
fn payload_and_assets_travel_together() {
    let codec = SecurePayloadCodec::default();
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let xem: AssetId = "nem:xem".parse().unwrap();

    let blob = codec.encode(&alice, &bob.public_key(), MT103.as_bytes()).unwrap();
    let attachment = attach_from(Some(blob), &[(xem.clone(), 10), (xem.clone(), 5)]).unwrap();

    let mut draft = TransactionAssembler::new(clock(), &BridgeConfig::default()).draft();
    draft
        .sender(Account::local(alice.clone()))
        .unwrap()
        .recipient(Account::from_public_key(bob.public_key()))
        .unwrap()
        .amount(1)
        .unwrap()
        .attachment(attachment)
        .unwrap();
    let tx = draft.build_transaction().unwrap();

    assert_eq!(tx.attachment.quantity_of(&xem), 15);
    let blob = tx.attachment.message().unwrap();
    assert_eq!(
        codec.decode_text(&bob, &alice.public_key(), blob).unwrap(),
        MT103
    );
}

// ---------------------------------------------------------------------------
// Multisig
// ---------------------------------------------------------------------------

#[tokio::test]
async fn multisig_flow_with_two_cosigners() {
    let codec = SecurePayloadCodec::default();
    let sender = KeyPair::generate();
    let recipient = KeyPair::generate();
    let multisig = KeyPair::generate();
    let cosigner_1 = KeyPair::generate();
    let cosigner_2 = KeyPair::generate();
    let gateway = InMemoryGateway::new();

    let blob = codec
        .encode(&sender, &recipient.public_key(), MT103.as_bytes())
        .unwrap();

    let mut draft = MultisigAssembler::new(clock(), &BridgeConfig::default())
        .sender(Account::local(sender.clone()))
        .recipient(Account::from_public_key(recipient.public_key()))
        .multisig(Account::from_public_key(multisig.public_key()));
    draft
        .amount(0)
        .unwrap()
        .attachment(attach_from(Some(blob), &[]).unwrap())
        .unwrap();

    // Cosigners see only the inner hash and sign independently.
    let inner_hash = draft.inner_hash();
    let multisig_address = *draft.multisig_account().address();
    for cosigner in [&cosigner_1, &cosigner_2] {
        let approval = MultisigSignatureTransaction::sign(
            cosigner,
            inner_hash,
            multisig_address,
            draft.timestamp(),
            draft.resolved_deadline(),
            0,
        );
        gateway.announce(&approval.clone().into()).await.unwrap();
        draft.add_signature(approval).unwrap();
    }

    let (tx, receipt) = draft
        .build_and_send_multisig_transaction(&gateway)
        .await
        .unwrap();

    assert_eq!(receipt.kind, TransactionKind::Multisig);
    assert_eq!(tx.inner_hash(), inner_hash);
    assert_eq!(tx.cosignatures.len(), 2);
    assert!(tx.cosignatures.iter().all(|c| c.verify()));
    assert_eq!(
        tx.cosignatures[0].signer,
        cosigner_1.public_key(),
        "insertion order preserved"
    );
    assert_eq!(gateway.len(), 3);

    let recorded = gateway.announced();
    let text = codec
        .decode_text(&recipient, &sender.public_key(), &recorded_blob(&recorded[2]))
        .unwrap();
    assert_eq!(text, MT103);
}

#[test]
fn approval_for_a_different_draft_is_refused() {
    let assembler = MultisigAssembler::new(clock(), &BridgeConfig::default());
    let sender = KeyPair::generate();
    let recipient = KeyPair::generate();
    let multisig = Account::from_public_key(KeyPair::generate().public_key());

    let mut a = assembler
        .clone()
        .sender(Account::local(sender.clone()))
        .recipient(Account::from_public_key(recipient.public_key()))
        .multisig(multisig.clone());
    a.amount(100).unwrap();

    let mut b = assembler
        .sender(Account::local(sender))
        .recipient(Account::from_public_key(recipient.public_key()))
        .multisig(multisig);
    b.amount(200).unwrap();

    let approval_for_a = MultisigSignatureTransaction::sign(
        &KeyPair::generate(),
        a.inner_hash(),
        *a.multisig_account().address(),
        a.timestamp(),
        a.resolved_deadline(),
        0,
    );
    assert!(matches!(
        b.add_signature(approval_for_a.clone()),
        Err(AssemblyError::InvalidSignature { .. })
    ));
    assert!(b.cosignatures().is_empty());
    a.add_signature(approval_for_a).unwrap();
}

#[test]
fn deadline_follows_configured_window() {
    let config = BridgeConfig::from_json_str(r#"{ "deadline_window_secs": 600 }"#).unwrap();
    let sender = KeyPair::generate();
    let recipient = KeyPair::generate();

    let mut draft = TransactionAssembler::new(clock(), &config).draft();
    draft
        .sender(Account::local(sender))
        .unwrap()
        .recipient(Account::from_public_key(recipient.public_key()))
        .unwrap();
    let tx = draft.build_transaction().unwrap();
    assert_eq!(tx.deadline, TimeInstant::from_secs(NOW + 600));

    let m = MultisigAssembler::new(clock(), &config)
        .sender(Account::local(KeyPair::generate()))
        .recipient(Account::from_public_key(recipient.public_key()))
        .multisig(Account::from_public_key(KeyPair::generate().public_key()));
    assert_eq!(m.resolved_deadline(), TimeInstant::from_secs(NOW + 600));
}
