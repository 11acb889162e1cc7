//! Inbound event payload shapes

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::types::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// Named event envelope as produced by upstream domain-event buses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent<T> {
    pub name: String,
    #[serde(default)]
    pub event_id: Option<String>,
    pub data: T,
}

/// Accepted wire forms of a transaction-received event
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TransactionReceived {
    Envelope(DomainEvent<Transaction>),
    Bare(Transaction),
}

/// Decode a transaction-received payload, enveloped or bare.
pub fn decode_transaction(payload: &[u8]) -> AnalyzerResult<Transaction> {
    match serde_json::from_slice::<TransactionReceived>(payload) {
        Ok(TransactionReceived::Envelope(event)) => Ok(event.data),
        Ok(TransactionReceived::Bare(tx)) => Ok(tx),
        Err(e) => Err(AnalyzerError::Decode(e.to_string())),
    }
}
