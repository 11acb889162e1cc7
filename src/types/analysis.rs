//! Analysis outcome and persisted analysis record

use crate::types::transaction::{Transaction, TransactionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decision produced by the analysis engine
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub status: TransactionStatus,
    pub reason: String,
}

impl AnalysisOutcome {
    pub fn new(status: TransactionStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }
}

/// Durable view of an analyzed transaction.
///
/// This is also the payload of the fraud-result event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub transaction_id: String,
    pub account_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: TransactionStatus,
    pub reason: String,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Build a fresh record for a decided transaction.
    ///
    /// Transactions without a decided status are stored as `PENDING`.
    pub fn from_transaction(tx: &Transaction, reason: &str, analyzed_at: DateTime<Utc>) -> Self {
        Self {
            transaction_id: tx.id.clone(),
            account_id: tx.account_id.clone(),
            amount: tx.amount,
            currency: tx.currency.clone(),
            status: tx.decided_status().unwrap_or(TransactionStatus::Pending),
            reason: reason.to_string(),
            analyzed_at,
        }
    }

    /// Refresh this record from a re-run analysis, keeping `analyzed_at`
    pub fn refreshed(&self, tx: &Transaction, reason: &str) -> Self {
        Self::from_transaction(tx, reason, self.analyzed_at)
    }

    /// Transaction view of the stored record
    pub fn to_transaction(&self) -> Transaction {
        Transaction {
            id: self.transaction_id.clone(),
            account_id: self.account_id.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
            status: Some(self.status.as_str().to_string()),
        }
    }
}
