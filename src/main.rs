//! Fraud Analyzer - Main Entry Point
//!
//! Consumes transaction-received events from NATS, decides each one, persists
//! the analysis and publishes the fraud result. Events are processed in
//! parallel, bounded by `pipeline.workers`.

use anyhow::{Context, Result};
use fraud_analyzer::{
    config::{AppConfig, LoggingConfig, StoreBackend},
    consumer::TransactionConsumer,
    metrics::{MetricsReporter, PipelineMetrics},
    pipeline::Pipeline,
    producer::NatsEventBus,
    store::{InMemoryTransactionStore, PgTransactionStore, TransactionStore},
};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;

    info!("Starting Fraud Analyzer");
    info!(
        limit_amount = config.analysis.limit_amount,
        chaos_enabled = config.analysis.chaos_enabled,
        chaos_amount = config.analysis.chaos_amount(),
        "Analysis rule configured"
    );

    let store: Arc<dyn TransactionStore> = match config.store.backend {
        StoreBackend::Postgres => {
            let store = PgTransactionStore::connect(&config.store)
                .await
                .context("Failed to connect to PostgreSQL")?;
            store
                .ensure_schema()
                .await
                .context("Failed to prepare fraud_analysis table")?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; analyses are lost on restart");
            Arc::new(InMemoryTransactionStore::new())
        }
    };

    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let metrics = Arc::new(PipelineMetrics::new());
    let bus = Arc::new(NatsEventBus::new(client.clone()));
    let pipeline = Pipeline::new(&config, store, bus, metrics.clone());

    let consumer = TransactionConsumer::new(
        client.clone(),
        &config.nats.transaction_subject,
        &config.nats.queue_group,
    );
    info!("Publishing fraud results to: {}", config.nats.fraud_result_subject);
    info!("Dead-letter subject: {}", config.nats.dlq_subject);

    let metrics_clone = metrics.clone();
    let interval = config.pipeline.metrics_interval_secs;
    tokio::spawn(async move {
        MetricsReporter::new(metrics_clone, interval).start().await;
    });

    let workers = config.pipeline.workers;
    let drain_permits = u32::try_from(workers).context("pipeline.workers does not fit in u32")?;
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut subscription = consumer.subscribe().await?;
    info!(workers, "Starting transaction processing loop");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        // Wait for a free worker first so Ctrl-C is seen even when all are busy
        let permit = tokio::select! {
            permit = semaphore.clone().acquire_owned() => permit?,
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        };

        let message = tokio::select! {
            message = subscription.next() => match message {
                Some(message) => message,
                None => {
                    warn!("Subscription closed");
                    break;
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        };

        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            pipeline.process(&message.payload).await;
            drop(permit);
        });
    }

    // Wait for in-flight events to reach a terminal state
    let _drained = semaphore.acquire_many(drain_permits).await?;

    info!("Fraud Analyzer shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("fraud_analyzer={}", logging.level)))?;

    match logging.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    Ok(())
}
