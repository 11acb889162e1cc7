//! Error types for the fraud analyzer.

use thiserror::Error;

/// Fraud analyzer error type.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Deterministic simulated store failure triggered by the chaos amount.
    #[error("Injected fault: simulated database failure for amount {amount}")]
    InjectedFault { amount: f64 },

    /// Database error from the PostgreSQL store
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store error not originating from sqlx
    #[error("Store error: {0}")]
    Store(String),

    /// Outbound publish failed
    #[error("Publish to '{channel}' failed: {message}")]
    Publish { channel: String, message: String },

    /// Payload (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Inbound payload could not be decoded into a transaction
    #[error("Decode error: {0}")]
    Decode(String),
}

impl AnalyzerError {
    /// Build a publish error for the given channel.
    pub fn publish(channel: &str, message: impl Into<String>) -> Self {
        Self::Publish {
            channel: channel.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error came from the chaos hook.
    pub fn is_injected_fault(&self) -> bool {
        matches!(self, Self::InjectedFault { .. })
    }
}

/// Result type for fraud analyzer operations.
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_error_message() {
        let err = AnalyzerError::publish("fraud.result", "connection refused");
        assert_eq!(
            err.to_string(),
            "Publish to 'fraud.result' failed: connection refused"
        );
        assert!(!err.is_injected_fault());
    }

    #[test]
    fn test_injected_fault_is_flagged() {
        let err = AnalyzerError::InjectedFault { amount: 9999.0 };
        assert!(err.is_injected_fault());
        assert!(err.to_string().contains("9999"));
    }
}
