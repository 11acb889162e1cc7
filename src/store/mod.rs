//! Persistence port for analysis records

pub mod memory;
pub mod postgres;

use crate::error::AnalyzerResult;
use crate::types::{AnalysisRecord, Transaction};
use async_trait::async_trait;

pub use memory::InMemoryTransactionStore;
pub use postgres::PgTransactionStore;

/// Durable store of analysis records keyed by transaction id.
///
/// Implementations must be safe to share across concurrent tasks.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Whether an analysis for `transaction_id` has been persisted
    async fn exists(&self, transaction_id: &str) -> AnalyzerResult<bool>;

    /// Create the record if absent, otherwise refresh it keeping its
    /// original `analyzed_at`. Returns the record as persisted.
    async fn upsert(&self, transaction: &Transaction, reason: &str) -> AnalyzerResult<AnalysisRecord>;
}
