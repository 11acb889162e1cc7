//! Test Transaction Producer
//!
//! Generates and publishes transaction-received events to NATS for pipeline testing.
//! Mixes normal amounts, over-limit amounts, chaos amounts and redelivered ids.

use fraud_analyzer::types::Transaction;
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

const LIMIT_AMOUNT: f64 = 10_000.0;
const CHAOS_AMOUNT: f64 = LIMIT_AMOUNT - 1.0;

/// Kind of transaction to generate
#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Normal,
    OverLimit,
    Chaos,
}

/// Transaction generator for testing
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
    run_id: String,
    transaction_counter: u64,
}

impl TransactionGenerator {
    fn new() -> Self {
        let run_id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            rng: rand::thread_rng(),
            run_id: run_id[..8].to_string(),
            transaction_counter: 0,
        }
    }

    fn generate(&mut self, kind: Kind) -> Transaction {
        self.transaction_counter += 1;

        let amount = match kind {
            Kind::Normal => (self.rng.gen_range(10.0..LIMIT_AMOUNT) * 100.0).round() / 100.0,
            Kind::OverLimit => (self.rng.gen_range(LIMIT_AMOUNT + 1.0..50_000.0) * 100.0).round() / 100.0,
            Kind::Chaos => CHAOS_AMOUNT,
        };
        // Keep normal amounts off the chaos sentinel
        let amount = if kind == Kind::Normal && amount == CHAOS_AMOUNT {
            CHAOS_AMOUNT - 1.0
        } else {
            amount
        };

        Transaction::new(
            format!("tx-{}-{:08}", self.run_id, self.transaction_counter),
            format!("acc-{}", self.rng.gen_range(1..500)),
            amount,
            self.random_choice(&["USD", "EUR", "COP", "GBP"]),
        )
    }

    fn pick_kind(&mut self, over_limit_rate: f64, chaos_rate: f64) -> Kind {
        let roll: f64 = self.rng.gen();
        if roll < chaos_rate {
            Kind::Chaos
        } else if roll < chaos_rate + over_limit_rate {
            Kind::OverLimit
        } else {
            Kind::Normal
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Transaction Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args
        .get(2)
        .map(|s| s.as_str())
        .unwrap_or("shieldflow.transaction.received");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let over_limit_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.2);
    let chaos_rate: f64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(0.05);
    let duplicate_rate: f64 = args.get(6).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(7).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count,
        over_limit_rate,
        chaos_rate,
        duplicate_rate,
        delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            Some(c)
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            None
        }
    };

    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();
    let mut last: Option<Transaction> = None;
    let (mut normal, mut over_limit, mut chaos, mut duplicates) = (0u64, 0u64, 0u64, 0u64);

    for i in 0..count {
        let transaction = match last.as_ref() {
            Some(previous) if rng.gen_bool(duplicate_rate.clamp(0.0, 1.0)) => {
                duplicates += 1;
                previous.clone()
            }
            _ => {
                let kind = generator.pick_kind(over_limit_rate, chaos_rate);
                match kind {
                    Kind::Normal => normal += 1,
                    Kind::OverLimit => over_limit += 1,
                    Kind::Chaos => chaos += 1,
                }
                generator.generate(kind)
            }
        };

        match &client {
            Some(client) => {
                let payload = serde_json::to_vec(&transaction)?;
                client.publish(subject.to_string(), payload.into()).await?;
            }
            None => {
                if (i + 1) % 10 == 0 || i == 0 {
                    info!("Sample transaction {}:\n{}", i + 1, serde_json::to_string_pretty(&transaction)?);
                }
            }
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Produced {}/{} transactions ({} normal, {} over limit, {} chaos, {} duplicates)",
                i + 1,
                count,
                normal,
                over_limit,
                chaos,
                duplicates
            );
        }

        last = Some(transaction);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    if let Some(client) = &client {
        client.flush().await?;
    }

    info!(
        "Completed! Produced {} transactions ({} normal, {} over limit, {} chaos, {} duplicates)",
        count, normal, over_limit, chaos, duplicates
    );

    Ok(())
}
