//! Downstream storage and ledger collaborator.
//!
//! Sealed artifacts are stored by content identifier and the identifier is
//! then committed to a ledger. Both systems are opaque here; the producer
//! only needs receipts back and reports failures.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::types::unix_time_secs;

/// Receipt returned after the raw artifact bytes were stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageReceipt {
    /// Content identifier the bytes were stored under
    pub cid: String,
    /// Number of bytes accepted
    pub size: usize,
}

/// Confirmation that a content identifier was committed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitConfirmation {
    /// Committed content identifier
    pub cid: String,
    /// Opaque transaction reference
    pub transaction: String,
}

/// Storage/ledger sink accepting sealed artifacts.
pub trait LedgerSink: Send {
    /// Store the exact artifact bytes under `cid`.
    fn store(&mut self, cid: &str, bytes: &[u8]) -> CoreResult<StorageReceipt>;

    /// Commit `cid` to the ledger.
    fn commit(&mut self, cid: &str) -> CoreResult<CommitConfirmation>;
}

/// Run `op` up to `attempts` times, returning the first success or the last error.
pub fn with_retry<T>(
    attempts: u32,
    label: &str,
    mut op: impl FnMut() -> CoreResult<T>,
) -> CoreResult<T> {
    let attempts = attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(operation = label, attempt, attempts, error = %e, "Sink operation failed");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| CoreError::Sink(format!("{label}: no attempts made"))))
}

/// Artifacts and commits kept by a [`SimulatedLedger`] before the oldest are evicted.
pub const DEFAULT_LEDGER_RETENTION: usize = 256;

/// In-memory sink standing in for the blob store and chain.
///
/// Only the most recent `retention` blobs and commits are kept.
#[derive(Debug)]
pub struct SimulatedLedger {
    retention: usize,
    blobs: HashMap<String, Vec<u8>>,
    blob_order: VecDeque<String>,
    commits: VecDeque<CommitConfirmation>,
    total_commits: u64,
}

impl SimulatedLedger {
    /// Create an empty simulated ledger with the default retention.
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_LEDGER_RETENTION)
    }

    /// Create an empty ledger keeping at most `retention` entries (minimum 1).
    pub fn with_retention(retention: usize) -> Self {
        Self {
            retention: retention.max(1),
            blobs: HashMap::new(),
            blob_order: VecDeque::new(),
            commits: VecDeque::new(),
            total_commits: 0,
        }
    }

    /// Bytes stored under `cid`, if still retained.
    pub fn blob(&self, cid: &str) -> Option<&[u8]> {
        self.blobs.get(cid).map(Vec::as_slice)
    }

    pub fn retained_blobs(&self) -> usize {
        self.blobs.len()
    }

    /// Retained commits, oldest first.
    pub fn commits(&self) -> impl Iterator<Item = &CommitConfirmation> {
        self.commits.iter()
    }

    /// Commits made over the ledger's lifetime, evicted ones included.
    pub fn total_commits(&self) -> u64 {
        self.total_commits
    }
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerSink for SimulatedLedger {
    fn store(&mut self, cid: &str, bytes: &[u8]) -> CoreResult<StorageReceipt> {
        debug!(cid, size = bytes.len(), "Storing sealed artifact");
        if self.blobs.insert(cid.to_string(), bytes.to_vec()).is_none() {
            self.blob_order.push_back(cid.to_string());
        }
        while self.blob_order.len() > self.retention {
            if let Some(oldest) = self.blob_order.pop_front() {
                self.blobs.remove(&oldest);
            }
        }
        Ok(StorageReceipt {
            cid: cid.to_string(),
            size: bytes.len(),
        })
    }

    fn commit(&mut self, cid: &str) -> CoreResult<CommitConfirmation> {
        if !self.blobs.contains_key(cid) {
            return Err(CoreError::Sink(format!("cannot commit unknown cid {cid}")));
        }
        let confirmation = CommitConfirmation {
            cid: cid.to_string(),
            transaction: format!("tx-{}-{:.0}", self.total_commits, unix_time_secs() * 1000.0),
        };
        debug!(cid, transaction = %confirmation.transaction, "Committed blob cid");
        self.total_commits += 1;
        self.commits.push_back(confirmation.clone());
        if self.commits.len() > self.retention {
            self.commits.pop_front();
        }
        Ok(confirmation)
    }
}
