//! Transaction data structures received from the inbound channel

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status decided by the analysis engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Approved => "APPROVED",
            TransactionStatus::Rejected => "REJECTED",
        }
    }

    /// Parse a stored status column
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(TransactionStatus::Pending),
            "APPROVED" => Some(TransactionStatus::Approved),
            "REJECTED" => Some(TransactionStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction to be analyzed for fraud.
///
/// `id` is the idempotency key for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique transaction identifier
    #[serde(alias = "transaction_id", alias = "transactionId")]
    pub id: String,

    /// Owning account
    #[serde(alias = "account_id")]
    pub account_id: String,

    /// Amount in `currency` units
    pub amount: f64,

    /// ISO currency code
    pub currency: String,

    /// Upstream status text, kept verbatim. Replaced by the decided status
    /// once the engine has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Transaction {
    /// Create a new undecided transaction
    pub fn new(
        id: impl Into<String>,
        account_id: impl Into<String>,
        amount: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            amount,
            currency: currency.into(),
            status: None,
        }
    }

    /// Copy of this transaction carrying `status`
    pub fn with_status(&self, status: TransactionStatus) -> Self {
        Self {
            status: Some(status.as_str().to_string()),
            ..self.clone()
        }
    }

    /// The carried status, if it is one the engine can decide
    pub fn decided_status(&self) -> Option<TransactionStatus> {
        self.status.as_deref().and_then(TransactionStatus::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_status_leaves_original_untouched() {
        let tx = Transaction::new("t1", "acc-1", 150.0, "USD");
        let decided = tx.with_status(TransactionStatus::Approved);

        assert_eq!(tx.status, None);
        assert_eq!(decided.status.as_deref(), Some("APPROVED"));
        assert_eq!(decided.decided_status(), Some(TransactionStatus::Approved));
        assert_eq!(decided.id, tx.id);
        assert_eq!(decided.amount, tx.amount);
    }

    #[test]
    fn test_deserialize_camel_case_payload() {
        let json = r#"{"id":"t9","accountId":"acc-9","amount":15000.0,"currency":"COP"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(tx.id, "t9");
        assert_eq!(tx.account_id, "acc-9");
        assert_eq!(tx.status, None);
    }

    #[test]
    fn test_deserialize_snake_case_aliases() {
        let json = r#"{"transaction_id":"t10","account_id":"acc-10","amount":1.5,"currency":"EUR","status":"PENDING"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(tx.id, "t10");
        assert_eq!(tx.decided_status(), Some(TransactionStatus::Pending));
    }

    #[test]
    fn test_upstream_status_kept_verbatim() {
        for status in ["pending", "NEW", "RECEIVED", ""] {
            let json = format!(
                r#"{{"id":"t11","accountId":"acc-11","amount":15000,"currency":"USD","status":"{}"}}"#,
                status
            );
            let tx: Transaction = serde_json::from_str(&json).unwrap();
            assert_eq!(tx.status.as_deref(), Some(status));
            assert_eq!(tx.decided_status(), None);

            let echoed = serde_json::to_value(&tx).unwrap();
            assert_eq!(echoed["status"], status);
        }
    }

    #[test]
    fn test_undecided_status_is_omitted() {
        let tx = Transaction::new("t1", "acc-1", 10.0, "USD");
        let json = serde_json::to_string(&tx).unwrap();
        assert!(!json.contains("status"));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(TransactionStatus::parse("REJECTED"), Some(TransactionStatus::Rejected));
        assert_eq!(TransactionStatus::parse("rejected"), None);
        assert_eq!(TransactionStatus::Approved.to_string(), "APPROVED");
    }
}
