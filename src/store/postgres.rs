//! PostgreSQL analysis store
//!
//! Records live in `fraud_analysis`, keyed by `transaction_id`. The upsert is a
//! single `INSERT ... ON CONFLICT DO UPDATE` so concurrent writers of the same
//! id converge on one row.

use super::TransactionStore;
use crate::config::StoreConfig;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::types::{AnalysisRecord, Transaction, TransactionStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS fraud_analysis (
    transaction_id TEXT PRIMARY KEY,
    account_id     TEXT NOT NULL,
    amount         DOUBLE PRECISION NOT NULL,
    currency       TEXT NOT NULL,
    status         TEXT NOT NULL,
    reason         TEXT NOT NULL,
    analyzed_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const UPSERT: &str = r#"
INSERT INTO fraud_analysis
    (transaction_id, account_id, amount, currency, status, reason, analyzed_at)
VALUES
    ($1, $2, $3, $4, $5, $6, NOW())
ON CONFLICT (transaction_id) DO UPDATE SET
    account_id = EXCLUDED.account_id,
    amount     = EXCLUDED.amount,
    currency   = EXCLUDED.currency,
    status     = EXCLUDED.status,
    reason     = EXCLUDED.reason
RETURNING transaction_id, account_id, amount, currency, status, reason, analyzed_at
"#;

/// [`TransactionStore`] backed by a shared sqlx connection pool
#[derive(Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    /// Create a store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool from configuration
    pub async fn connect(config: &StoreConfig) -> AnalyzerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Create the `fraud_analysis` table if it does not exist
    pub async fn ensure_schema(&self) -> AnalyzerResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        debug!("fraud_analysis schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_record(row: &PgRow) -> AnalyzerResult<AnalysisRecord> {
        let status: String = row.try_get("status")?;
        let status = TransactionStatus::parse(&status)
            .ok_or_else(|| AnalyzerError::Store(format!("Unknown status in fraud_analysis: {}", status)))?;
        let analyzed_at: DateTime<Utc> = row.try_get("analyzed_at")?;

        Ok(AnalysisRecord {
            transaction_id: row.try_get("transaction_id")?,
            account_id: row.try_get("account_id")?,
            amount: row.try_get("amount")?,
            currency: row.try_get("currency")?,
            status,
            reason: row.try_get("reason")?,
            analyzed_at,
        })
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn exists(&self, transaction_id: &str) -> AnalyzerResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM fraud_analysis WHERE transaction_id = $1)",
        )
        .bind(transaction_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn upsert(&self, transaction: &Transaction, reason: &str) -> AnalyzerResult<AnalysisRecord> {
        let status = transaction.decided_status().unwrap_or(TransactionStatus::Pending);

        let row = sqlx::query(UPSERT)
            .bind(&transaction.id)
            .bind(&transaction.account_id)
            .bind(transaction.amount)
            .bind(&transaction.currency)
            .bind(status.as_str())
            .bind(reason)
            .fetch_one(&self.pool)
            .await?;

        let record = Self::row_to_record(&row)?;
        debug!(
            transaction_id = %record.transaction_id,
            status = %record.status,
            "Analysis record upserted"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> PgTransactionStore {
        let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| StoreConfig::default().database_url);
        let store = PgTransactionStore::connect(&StoreConfig {
            database_url: url,
            ..StoreConfig::default()
        })
        .await
        .unwrap();
        store.ensure_schema().await.unwrap();
        store
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL database"]
    async fn test_upsert_preserves_analyzed_at() {
        let store = test_store().await;
        let id = format!("pg-{}", uuid::Uuid::new_v4());

        let tx = Transaction::new(&id, "acc-1", 100.0, "USD").with_status(TransactionStatus::Approved);
        assert!(!store.exists(&id).await.unwrap());
        let created = store.upsert(&tx, "Normal transaction").await.unwrap();
        assert!(store.exists(&id).await.unwrap());

        let rerun = tx.with_status(TransactionStatus::Rejected);
        let updated = store.upsert(&rerun, "Amount exceeds limit").await.unwrap();

        assert_eq!(updated.analyzed_at, created.analyzed_at);
        assert_eq!(updated.status, TransactionStatus::Rejected);
        assert_eq!(updated.reason, "Amount exceeds limit");
    }
}
