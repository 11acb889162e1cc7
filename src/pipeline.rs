//! Wiring of the analysis pipeline from configuration and ports.

use crate::config::AppConfig;
use crate::consumer::{HandlingOutcome, InboundHandler};
use crate::engine::AnalysisEngine;
use crate::metrics::PipelineMetrics;
use crate::orchestrator::AnalysisOrchestrator;
use crate::producer::{EventBus, EventPublisher};
use crate::store::TransactionStore;
use crate::types::decode_transaction;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Decodes raw inbound payloads and drives them through the handler
#[derive(Clone)]
pub struct Pipeline {
    handler: InboundHandler,
    metrics: Arc<PipelineMetrics>,
}

impl Pipeline {
    /// Build the pipeline over the given store and bus
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn TransactionStore>,
        bus: Arc<dyn EventBus>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        let publisher = EventPublisher::new(bus, config.retry.outbound.policy());
        let orchestrator = AnalysisOrchestrator::new(
            store,
            AnalysisEngine::new(&config.analysis),
            publisher.clone(),
            &config.nats.fraud_result_subject,
        );
        let handler = InboundHandler::new(
            orchestrator,
            publisher,
            &config.nats.dlq_subject,
            config.retry.inbound.policy(),
        );

        Self { handler, metrics }
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Process one raw message.
    ///
    /// Returns `None` when the payload cannot be decoded; such messages are
    /// dropped since retrying cannot fix them and they carry no DLQ key.
    pub async fn process(&self, payload: &[u8]) -> Option<HandlingOutcome> {
        let start_time = Instant::now();

        let transaction = match decode_transaction(payload) {
            Ok(tx) => tx,
            Err(e) => {
                self.metrics.record_decode_failure();
                warn!(error = %e, payload_len = payload.len(), "Failed to decode transaction event");
                return None;
            }
        };

        self.metrics.record_received();
        let outcome = self.handler.handle(&transaction).await;
        let processing_time = start_time.elapsed();
        self.metrics.record_outcome(&outcome, processing_time);

        if let HandlingOutcome::Acknowledged { attempts, .. } = &outcome {
            info!(
                transaction_id = %transaction.id,
                attempts = *attempts,
                processing_time_us = processing_time.as_micros() as u64,
                "Transaction event acknowledged"
            );
        }

        Some(outcome)
    }
}
