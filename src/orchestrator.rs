//! Idempotent analysis of a single transaction.
//!
//! One call runs: existence check, decision, upsert, then publish of the
//! persisted record. A transaction whose id is already stored is skipped
//! before the engine runs, so redelivered events are cheap no-ops.
//!
//! Two concurrent deliveries of the same id can both pass the existence
//! check. The upsert keeps a single stored row, but both will publish.

use crate::engine::AnalysisEngine;
use crate::error::AnalyzerResult;
use crate::producer::EventPublisher;
use crate::store::TransactionStore;
use crate::types::{AnalysisRecord, Transaction};
use std::sync::Arc;
use tracing::{debug, info};

/// What `analyze` did with a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// A record already existed; nothing was evaluated or published
    AlreadyAnalyzed,
    /// Decided, persisted and published
    Published(AnalysisRecord),
}

/// Composes store, engine and publisher into one unit of work
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    store: Arc<dyn TransactionStore>,
    engine: AnalysisEngine,
    publisher: EventPublisher,
    fraud_result_channel: String,
}

impl AnalysisOrchestrator {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        engine: AnalysisEngine,
        publisher: EventPublisher,
        fraud_result_channel: &str,
    ) -> Self {
        Self {
            store,
            engine,
            publisher,
            fraud_result_channel: fraud_result_channel.to_string(),
        }
    }

    pub fn fraud_result_channel(&self) -> &str {
        &self.fraud_result_channel
    }

    /// Analyze `transaction`, failing if any step fails
    pub async fn analyze(&self, transaction: &Transaction) -> AnalyzerResult<Disposition> {
        if self.store.exists(&transaction.id).await? {
            debug!(transaction_id = %transaction.id, "Transaction already analyzed, skipping");
            return Ok(Disposition::AlreadyAnalyzed);
        }

        let outcome = self.engine.decide(transaction)?;
        let decided = transaction.with_status(outcome.status);

        let record = self.store.upsert(&decided, &outcome.reason).await?;

        self.publisher
            .emit(&self.fraud_result_channel, &record.transaction_id, &record)
            .await?;

        info!(
            transaction_id = %record.transaction_id,
            status = %record.status,
            reason = %record.reason,
            amount = record.amount,
            "Fraud analysis published"
        );

        Ok(Disposition::Published(record))
    }
}
