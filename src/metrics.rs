//! Counters and processing-time statistics for the analysis pipeline.

use crate::consumer::HandlingOutcome;
use crate::orchestrator::Disposition;
use crate::types::TransactionStatus;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const MAX_SAMPLES: usize = 10_000;

/// Metrics collector for pipeline activity
pub struct PipelineMetrics {
    /// Events decoded and handed to the handler
    pub received: AtomicU64,
    /// Transactions approved and published
    pub approved: AtomicU64,
    /// Transactions rejected and published
    pub rejected: AtomicU64,
    /// Deliveries skipped because the id was already analyzed
    pub duplicates: AtomicU64,
    /// Whole-analysis retries performed by the inbound handler
    pub retries: AtomicU64,
    /// Events routed to the dead-letter subject
    pub dead_lettered: AtomicU64,
    /// Dead-letter publishes that failed
    pub dlq_failures: AtomicU64,
    /// Payloads that could not be decoded
    pub decode_failures: AtomicU64,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            approved: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            dead_lettered: AtomicU64::new(0),
            dlq_failures: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the terminal outcome of one event
    pub fn record_outcome(&self, outcome: &HandlingOutcome, processing_time: Duration) {
        self.retries
            .fetch_add(u64::from(outcome.attempts().saturating_sub(1)), Ordering::Relaxed);

        match outcome {
            HandlingOutcome::Acknowledged { disposition, .. } => match disposition {
                Disposition::AlreadyAnalyzed => {
                    self.duplicates.fetch_add(1, Ordering::Relaxed);
                }
                Disposition::Published(record) => {
                    let counter = match record.status {
                        TransactionStatus::Rejected => &self.rejected,
                        _ => &self.approved,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            },
            HandlingOutcome::DeadLettered { dlq_published, .. } => {
                self.dead_lettered.fetch_add(1, Ordering::Relaxed);
                if !dlq_published {
                    self.dlq_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the most recent samples
            if times.len() > MAX_SAMPLES {
                times.drain(0..MAX_SAMPLES / 2);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            p99_us: sorted[((count as f64 * 0.99) as usize).min(count - 1)],
            max_us: sorted[count - 1],
        }
    }

    /// Events per second since start
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.received.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let processing = self.get_processing_stats();

        info!(
            received = self.received.load(Ordering::Relaxed),
            approved = self.approved.load(Ordering::Relaxed),
            rejected = self.rejected.load(Ordering::Relaxed),
            duplicates = self.duplicates.load(Ordering::Relaxed),
            retries = self.retries.load(Ordering::Relaxed),
            dead_lettered = self.dead_lettered.load(Ordering::Relaxed),
            dlq_failures = self.dlq_failures.load(Ordering::Relaxed),
            decode_failures = self.decode_failures.load(Ordering::Relaxed),
            throughput = format!("{:.1} tx/s", self.get_throughput()),
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            "Pipeline metrics summary"
        );
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics summary logger
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisRecord, Transaction};
    use chrono::Utc;

    fn published(status: TransactionStatus) -> HandlingOutcome {
        let tx = Transaction::new("t", "a", 1.0, "USD").with_status(status);
        HandlingOutcome::Acknowledged {
            disposition: Disposition::Published(AnalysisRecord::from_transaction(&tx, "r", Utc::now())),
            attempts: 1,
        }
    }

    #[test]
    fn test_outcome_counters() {
        let metrics = PipelineMetrics::new();

        metrics.record_outcome(&published(TransactionStatus::Approved), Duration::from_micros(100));
        metrics.record_outcome(&published(TransactionStatus::Rejected), Duration::from_micros(200));
        metrics.record_outcome(
            &HandlingOutcome::Acknowledged {
                disposition: Disposition::AlreadyAnalyzed,
                attempts: 2,
            },
            Duration::from_micros(50),
        );
        metrics.record_outcome(
            &HandlingOutcome::DeadLettered {
                attempts: 4,
                dlq_published: false,
            },
            Duration::from_micros(400),
        );

        assert_eq!(metrics.approved.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.rejected.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.duplicates.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.retries.load(Ordering::Relaxed), 4);
        assert_eq!(metrics.dead_lettered.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.dlq_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);

        for us in [100, 200, 300, 400] {
            metrics.record_outcome(&published(TransactionStatus::Approved), Duration::from_micros(us));
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
        assert_eq!(stats.p99_us, 400);
    }
}
