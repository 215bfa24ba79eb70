// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # SWIFT Ledger Bridge Core Library
//!
//! Carries SWIFT-style financial messages on a public ledger without
//! putting them there in the clear. A message is compressed, encrypted to
//! its recipient, wrapped in a transfer's attachment, optionally routed
//! through a multisig account, and handed to the ledger. Reading it back
//! only needs the recipient's key and the sender's public key.
//!
//! ## Architecture
//!
//! - **codec**: compress + encrypt + hex, and back. The part that must
//!   never be wrong.
//! - **crypto**: Ed25519 keys, X25519 agreement, AES-256-GCM, hashes.
//! - **account**: Bech32 addresses and the accounts that own them.
//! - **attachment**: payload plus asset transfers riding on a transfer.
//! - **transaction**: single-signer drafts and staged multisig assembly.
//! - **transport**: the seam to the ledger, async and injectable.
//! - **time**: injectable clock for timestamps and deadlines.
//! - **config**: wire constants and tunable limits.
//!
//! ## Design Philosophy
//!
//! 1. Decode either returns the exact original bytes or an error. Never
//!    something in between.
//! 2. Signable bytes are hand-serialized. Two clients that agree on the
//!    constants in [`config`] agree on every hash.
//! 3. Ledger policy (quorum, fee sufficiency, broadcast) stays with the
//!    ledger.

pub mod account;
pub mod attachment;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod time;
pub mod transaction;
pub mod transport;

pub use account::{Account, Address};
pub use attachment::{attach_from, AssetId, Attachment, AttachmentBuilder};
pub use codec::{CodecError, DecodeFailure, EncryptedBlob, SecurePayloadCodec};
pub use config::BridgeConfig;
pub use crypto::{KeyPair, PublicKey, Signature};
pub use time::{FixedTimeProvider, SystemTimeProvider, TimeInstant, TimeProvider};
pub use transaction::{
    AssemblyError, LedgerTransaction, MultisigAssembler, MultisigSignatureTransaction,
    MultisigTransaction, TransactionAssembler, TransferTransaction,
};
pub use transport::{InMemoryGateway, Receipt, TransportError, TransportGateway};
