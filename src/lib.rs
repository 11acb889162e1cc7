//! Fraud Analyzer Library
//!
//! Event-driven fraud analysis: transaction-received events are checked for
//! idempotency, decided by a threshold rule, persisted and published as fraud
//! results, with retry and dead-letter routing on every failure-prone step.

pub mod config;
pub mod consumer;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod producer;
pub mod retry;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::AppConfig;
pub use consumer::{HandlingOutcome, InboundHandler, TransactionConsumer};
pub use engine::AnalysisEngine;
pub use error::{AnalyzerError, AnalyzerResult};
pub use orchestrator::{AnalysisOrchestrator, Disposition};
pub use pipeline::Pipeline;
pub use producer::{EventBus, EventPublisher, NatsEventBus};
pub use retry::{Backoff, RetryPolicy};
pub use store::{InMemoryTransactionStore, PgTransactionStore, TransactionStore};
pub use types::{AnalysisRecord, Transaction, TransactionStatus};
