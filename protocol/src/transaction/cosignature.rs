//! Cosigner approvals for pending multisig transactions.
//!
//! A cosigner never sees the multisig draft itself. They receive the inner
//! transaction hash (out of band, or from the ledger's pending pool), check
//! it, and sign a [`MultisigSignatureTransaction`] committing to that hash
//! and to the multisig account it belongs to.

use serde::{Deserialize, Serialize};

use super::types::{TransactionKind, TxHash};
use crate::account::Address;
use crate::config::TRANSACTION_VERSION;
use crate::crypto::hash::double_sha256;
use crate::crypto::keys::{KeyPair, PublicKey, Signature};
use crate::time::TimeInstant;

/// A cosigner's signed approval of one inner transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigSignatureTransaction {
    pub version: u16,
    pub timestamp: TimeInstant,
    pub deadline: TimeInstant,
    pub signer: PublicKey,
    pub fee: u64,
    /// Hash of the inner transfer being approved.
    pub inner_hash: TxHash,
    /// The multisig account the inner transfer is executed for.
    pub multisig: Address,
    pub signature: Signature,
}

impl MultisigSignatureTransaction {
    /// Signs an approval of `inner_hash` on behalf of `cosigner`.
    pub fn sign(
        cosigner: &KeyPair,
        inner_hash: TxHash,
        multisig: Address,
        timestamp: TimeInstant,
        deadline: TimeInstant,
        fee: u64,
    ) -> Self {
        let signer = cosigner.public_key();
        let bytes = signable_bytes(
            TRANSACTION_VERSION,
            timestamp,
            deadline,
            &signer,
            fee,
            &inner_hash,
            &multisig,
        );
        Self {
            version: TRANSACTION_VERSION,
            timestamp,
            deadline,
            signature: cosigner.sign(&bytes),
            signer,
            fee,
            inner_hash,
            multisig,
        }
    }

    pub fn signable_bytes(&self) -> Vec<u8> {
        signable_bytes(
            self.version,
            self.timestamp,
            self.deadline,
            &self.signer,
            self.fee,
            &self.inner_hash,
            &self.multisig,
        )
    }

    pub fn hash(&self) -> TxHash {
        TxHash::from_bytes(double_sha256(&self.signable_bytes()))
    }

    pub fn signer_address(&self) -> Address {
        Address::from_public_key(&self.signer)
    }

    /// Checks the Ed25519 signature under `signer`.
    pub fn verify(&self) -> bool {
        self.signer.verify(&self.signable_bytes(), &self.signature)
    }
}

fn signable_bytes(
    version: u16,
    timestamp: TimeInstant,
    deadline: TimeInstant,
    signer: &PublicKey,
    fee: u64,
    inner_hash: &TxHash,
    multisig: &Address,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(192);

    buf.extend_from_slice(&version.to_le_bytes());
    buf.extend_from_slice(TransactionKind::MultisigSignature.to_string().as_bytes());
    buf.push(0x00);

    buf.extend_from_slice(&timestamp.to_le_bytes());
    buf.extend_from_slice(&deadline.to_le_bytes());
    buf.extend_from_slice(signer.as_bytes());
    buf.extend_from_slice(&fee.to_le_bytes());
    buf.extend_from_slice(inner_hash.as_bytes());

    buf.extend_from_slice(multisig.to_string().as_bytes());
    buf.push(0x00);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cosigner: &KeyPair) -> MultisigSignatureTransaction {
        let multisig = Address::from_public_key(&KeyPair::generate().public_key());
        MultisigSignatureTransaction::sign(
            cosigner,
            TxHash::from_bytes([9; 32]),
            multisig,
            TimeInstant::from_secs(100),
            TimeInstant::from_secs(200),
            0,
        )
    }

    #[test]
    fn signed_approval_verifies() {
        let kp = KeyPair::generate();
        let cosig = sample(&kp);
        assert!(cosig.verify());
        assert_eq!(cosig.signer_address(), Address::from_public_key(&kp.public_key()));
    }

    #[test]
    fn changing_inner_hash_breaks_signature() {
        let mut cosig = sample(&KeyPair::generate());
        cosig.inner_hash = TxHash::from_bytes([8; 32]);
        assert!(!cosig.verify());
    }

    #[test]
    fn changing_multisig_breaks_signature() {
        let mut cosig = sample(&KeyPair::generate());
        cosig.multisig = Address::from_public_key(&KeyPair::generate().public_key());
        assert!(!cosig.verify());
    }

    #[test]
    fn swapped_signer_fails() {
        let mut cosig = sample(&KeyPair::generate());
        cosig.signer = KeyPair::generate().public_key();
        assert!(!cosig.verify());
    }

    #[test]
    fn json_roundtrip_preserves_validity() {
        let cosig = sample(&KeyPair::generate());
        let json = serde_json::to_string(&cosig).unwrap();
        let back: MultisigSignatureTransaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cosig);
        assert!(back.verify());
    }
}
