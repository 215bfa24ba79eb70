//! # Attachments
//!
//! An [`Attachment`] is what a transfer carries besides its native amount:
//! an optional encrypted SWIFT payload and any number of asset transfers
//! (mosaics, in ledger terms). "Nothing attached" is the explicit value
//! [`Attachment::empty`], never an absent field, so every transaction has
//! a well-defined attachment to hash and compare.
//!
//! Transfers of the same asset accumulate: attaching `nem:xem 5` twice
//! yields one transfer of 10.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::codec::EncryptedBlob;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("invalid quantity {quantity} for asset {asset}: must be non-negative")]
    InvalidQuantity { asset: AssetId, quantity: i64 },

    #[error("quantity overflow accumulating asset {asset}")]
    QuantityOverflow { asset: AssetId },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetIdError {
    #[error("asset id must be of the form namespace:name, got '{0}'")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Fully qualified asset name, e.g. `nem:xem`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId {
    namespace: String,
    name: String,
}

impl AssetId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self, AssetIdError> {
        let namespace = namespace.into();
        let name = name.into();
        if !valid_part(&namespace) || !valid_part(&name) {
            return Err(AssetIdError::Malformed(format!("{namespace}:{name}")));
        }
        Ok(Self { namespace, name })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn valid_part(s: &str) -> bool {
    !s.is_empty()
        && !s.contains(':')
        && !s.chars().any(|c| c.is_whitespace() || c.is_control())
}

impl FromStr for AssetId {
    type Err = AssetIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, name) = s
            .split_once(':')
            .ok_or_else(|| AssetIdError::Malformed(s.to_string()))?;
        Self::new(namespace, name).map_err(|_| AssetIdError::Malformed(s.to_string()))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

impl Serialize for AssetId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// Payload plus asset transfers. Equality and hashing cover both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<EncryptedBlob>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    transfers: BTreeMap<AssetId, u64>,
}

impl Attachment {
    /// The "no content" attachment.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_message(message: EncryptedBlob) -> Self {
        Self {
            message: Some(message),
            transfers: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.transfers.is_empty()
    }

    pub fn message(&self) -> Option<&EncryptedBlob> {
        self.message.as_ref()
    }

    /// Transfers in canonical (asset id) order.
    pub fn transfers(&self) -> impl Iterator<Item = (&AssetId, u64)> {
        self.transfers.iter().map(|(id, q)| (id, *q))
    }

    pub fn quantity_of(&self, asset: &AssetId) -> u64 {
        self.transfers.get(asset).copied().unwrap_or(0)
    }

    /// Adds `quantity` of `asset`, summing with any earlier transfer.
    pub fn add_transfer(&mut self, asset: AssetId, quantity: i64) -> Result<(), AttachmentError> {
        let quantity = u64::try_from(quantity).map_err(|_| AttachmentError::InvalidQuantity {
            asset: asset.clone(),
            quantity,
        })?;

        let slot = self.transfers.entry(asset.clone()).or_insert(0);
        *slot = slot
            .checked_add(quantity)
            .ok_or(AttachmentError::QuantityOverflow { asset })?;
        Ok(())
    }

    /// Deterministic bytes folded into a transaction's signable bytes.
    ///
    /// Layout: message flag (+ u32 LE length + bytes), u32 LE transfer
    /// count, then per transfer the asset id, a 0x00 separator and a u64
    /// LE quantity.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        match &self.message {
            Some(blob) => {
                buf.push(0x01);
                buf.extend_from_slice(&(blob.len() as u32).to_le_bytes());
                buf.extend_from_slice(blob.as_bytes());
            }
            None => buf.push(0x00),
        }

        buf.extend_from_slice(&(self.transfers.len() as u32).to_le_bytes());
        for (asset, quantity) in &self.transfers {
            buf.extend_from_slice(asset.to_string().as_bytes());
            buf.push(0x00);
            buf.extend_from_slice(&quantity.to_le_bytes());
        }
        buf
    }
}

/// Builds an attachment from an optional payload and a list of transfers.
///
/// No payload and no transfers gives [`Attachment::empty`]. Repeated assets
/// sum; a negative quantity fails the whole call.
pub fn attach_from(
    message: Option<EncryptedBlob>,
    transfers: &[(AssetId, i64)],
) -> Result<Attachment, AttachmentError> {
    let mut attachment = Attachment {
        message,
        transfers: BTreeMap::new(),
    };
    for (asset, quantity) in transfers {
        attachment.add_transfer(asset.clone(), *quantity)?;
    }
    Ok(attachment)
}

// ---------------------------------------------------------------------------
// AttachmentBuilder
// ---------------------------------------------------------------------------

/// Fluent form of [`attach_from`]. Errors surface at [`build`](Self::build).
#[derive(Debug, Default)]
pub struct AttachmentBuilder {
    message: Option<EncryptedBlob>,
    transfers: Vec<(AssetId, i64)>,
}

impl AttachmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, blob: EncryptedBlob) -> Self {
        self.message = Some(blob);
        self
    }

    pub fn transfer(mut self, asset: AssetId, quantity: i64) -> Self {
        self.transfers.push((asset, quantity));
        self
    }

    pub fn build(self) -> Result<Attachment, AttachmentError> {
        attach_from(self.message, &self.transfers)
    }
}
