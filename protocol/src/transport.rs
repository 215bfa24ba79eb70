//! # Transport Gateway
//!
//! The ledger itself (broadcast, consensus, fee markets) is outside this
//! crate. Assemblers hand finished transactions to a [`TransportGateway`]
//! and surface whatever it answers. No retries happen here.
//!
//! [`InMemoryGateway`] records announcements instead of sending them. It
//! backs the CLI's dry-run mode and the test suite.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::time::TimeInstant;
use crate::transaction::{LedgerTransaction, TransactionKind, TxHash};

/// Errors reported by a gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("ledger rejected transaction: {reason}")]
    Rejected { reason: String },

    #[error("ledger unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("failed to serialize transaction: {0}")]
    Serialization(String),
}

/// Acknowledgement that the ledger accepted a transaction for processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub hash: TxHash,
    pub kind: TransactionKind,
    pub accepted_at: TimeInstant,
}

/// Outbound path to the ledger.
#[async_trait]
pub trait TransportGateway: Send + Sync {
    async fn announce(&self, transaction: &LedgerTransaction) -> Result<Receipt, TransportError>;
}

// ---------------------------------------------------------------------------
// InMemoryGateway
// ---------------------------------------------------------------------------

/// Gateway that keeps announced transactions in memory.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    announced: Mutex<Vec<LedgerTransaction>>,
    failure: Mutex<Option<TransportError>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that fails every announcement with `error`.
    pub fn failing(error: TransportError) -> Self {
        Self {
            announced: Mutex::new(Vec::new()),
            failure: Mutex::new(Some(error)),
        }
    }

    /// Sets or clears the failure returned by later announcements.
    pub fn set_failure(&self, error: Option<TransportError>) {
        *self.failure.lock() = error;
    }

    /// Snapshot of everything accepted so far, in announcement order.
    pub fn announced(&self) -> Vec<LedgerTransaction> {
        self.announced.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.announced.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.announced.lock().is_empty()
    }
}

#[async_trait]
impl TransportGateway for InMemoryGateway {
    async fn announce(&self, transaction: &LedgerTransaction) -> Result<Receipt, TransportError> {
        let hash = transaction.hash();

        if let Some(err) = self.failure.lock().clone() {
            warn!(%hash, error = %err, "announcement refused");
            return Err(err);
        }

        // Same encoding a real gateway would put on the wire.
        serde_json::to_vec(transaction)
            .map_err(|e| TransportError::Serialization(e.to_string()))?;

        self.announced.lock().push(transaction.clone());

        let receipt = Receipt {
            id: Uuid::new_v4(),
            hash,
            kind: transaction.kind(),
            accepted_at: TimeInstant::from(Utc::now()),
        };
        info!(%hash, kind = %receipt.kind, receipt = %receipt.id, "transaction announced");
        Ok(receipt)
    }
}
