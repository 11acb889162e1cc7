//! Threshold rule that decides whether a transaction is fraudulent.

use crate::config::AnalysisConfig;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::types::{AnalysisOutcome, Transaction, TransactionStatus};
use tracing::warn;

pub const REASON_EXCEEDS_LIMIT: &str = "Amount exceeds limit";
pub const REASON_NORMAL: &str = "Normal transaction";

/// Pure decision function over a single transaction.
///
/// Only `amount` is considered. When chaos is enabled, an amount equal to
/// `limit_amount - 1` fails with [`AnalyzerError::InjectedFault`]. This is a
/// fault-injection hook for exercising the retry and dead-letter paths.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    limit_amount: f64,
    chaos_amount: Option<f64>,
}

impl AnalysisEngine {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            limit_amount: config.limit_amount,
            chaos_amount: config.chaos_enabled.then(|| config.chaos_amount()),
        }
    }

    pub fn limit_amount(&self) -> f64 {
        self.limit_amount
    }

    pub fn chaos_amount(&self) -> Option<f64> {
        self.chaos_amount
    }

    /// Decide the status and reason for `tx`
    pub fn decide(&self, tx: &Transaction) -> AnalyzerResult<AnalysisOutcome> {
        if self.chaos_amount == Some(tx.amount) {
            warn!(
                transaction_id = %tx.id,
                amount = tx.amount,
                "Chaos amount received, simulating database failure"
            );
            return Err(AnalyzerError::InjectedFault { amount: tx.amount });
        }

        if tx.amount > self.limit_amount {
            Ok(AnalysisOutcome::new(TransactionStatus::Rejected, REASON_EXCEEDS_LIMIT))
        } else {
            Ok(AnalysisOutcome::new(TransactionStatus::Approved, REASON_NORMAL))
        }
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}
