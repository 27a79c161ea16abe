use crate::*;
use alloy_primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// Acknowledgement that a private vote was included.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: B256,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("timed out waiting for inclusion")]
    Timeout,
}

/// Writes encrypted ballots to the ledger.
///
/// Implementations send `castPrivateVote(election_id, encrypted_signature)` from the voter's
/// account.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn cast_private_vote(
        &self,
        election_id: U256,
        encrypted_signature: Vec<u8>,
    ) -> Result<Receipt, LedgerError>;
}

/// A `castPrivateVote` transaction as recorded by [`MemoryLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub from: Address,
    pub tx_hash: B256,
    pub call_data: Vec<u8>,
}

impl RecordedCall {
    pub fn to_ballot(&self) -> BallotRecord {
        BallotRecord {
            voter: self.from,
            user_id: None,
            tx_hash: Some(self.tx_hash),
            payload: BallotPayload::CallData(format!("0x{}", hex::encode(&self.call_data))),
        }
    }
}

/// An in-memory ledger. Clones share the same transaction list.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    sender: Address,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MemoryLedger {
    pub fn new(sender: Address) -> Self {
        MemoryLedger {
            sender,
            calls: Arc::new(Mutex::new(vec![])),
        }
    }

    /// A handle on the same ledger that sends from another account.
    pub fn for_sender(&self, sender: Address) -> Self {
        MemoryLedger {
            sender,
            calls: self.calls.clone(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every recorded transaction as a ballot for tallying.
    pub fn ballots(&self) -> Vec<BallotRecord> {
        self.calls().iter().map(RecordedCall::to_ballot).collect()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn cast_private_vote(
        &self,
        election_id: U256,
        encrypted_signature: Vec<u8>,
    ) -> Result<Receipt, LedgerError> {
        let call_data = encode_cast_private_vote(election_id, &encrypted_signature);

        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);

        let mut preimage = Vec::with_capacity(20 + 8 + call_data.len());
        preimage.extend_from_slice(self.sender.as_slice());
        preimage.extend_from_slice(&(calls.len() as u64).to_be_bytes());
        preimage.extend_from_slice(&call_data);
        let tx_hash = keccak256(&preimage);

        calls.push(RecordedCall {
            from: self.sender,
            tx_hash,
            call_data,
        });

        Ok(Receipt { tx_hash })
    }
}
