//! Process-local analysis store

use super::TransactionStore;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::types::{AnalysisRecord, Transaction};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard};

/// In-memory [`TransactionStore`] for local runs and tests
#[derive(Default)]
pub struct InMemoryTransactionStore {
    records: RwLock<HashMap<String, AnalysisRecord>>,
    upserts: AtomicU64,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_records(&self) -> AnalyzerResult<RwLockReadGuard<'_, HashMap<String, AnalysisRecord>>> {
        self.records
            .read()
            .map_err(|e| AnalyzerError::Store(format!("Lock error: {}", e)))
    }

    /// Fetch a stored record
    pub fn get(&self, transaction_id: &str) -> AnalyzerResult<Option<AnalysisRecord>> {
        Ok(self.read_records()?.get(transaction_id).cloned())
    }

    /// Number of stored records
    pub fn len(&self) -> AnalyzerResult<usize> {
        Ok(self.read_records()?.len())
    }

    pub fn is_empty(&self) -> AnalyzerResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of upsert calls served
    pub fn upsert_count(&self) -> u64 {
        self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn exists(&self, transaction_id: &str) -> AnalyzerResult<bool> {
        Ok(self.read_records()?.contains_key(transaction_id))
    }

    async fn upsert(&self, transaction: &Transaction, reason: &str) -> AnalyzerResult<AnalysisRecord> {
        let mut records = self
            .records
            .write()
            .map_err(|e| AnalyzerError::Store(format!("Lock error: {}", e)))?;

        let record = match records.get(&transaction.id) {
            Some(existing) => existing.refreshed(transaction, reason),
            None => AnalysisRecord::from_transaction(transaction, reason, Utc::now()),
        };
        records.insert(transaction.id.clone(), record.clone());
        self.upserts.fetch_add(1, Ordering::SeqCst);

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionStatus;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let store = InMemoryTransactionStore::new();
        let tx = Transaction::new("t1", "acc-1", 100.0, "USD").with_status(TransactionStatus::Approved);

        assert!(!store.exists("t1").await.unwrap());
        let created = store.upsert(&tx, "Normal transaction").await.unwrap();
        assert!(store.exists("t1").await.unwrap());

        let rerun = Transaction::new("t1", "acc-1", 12_000.0, "EUR").with_status(TransactionStatus::Rejected);
        let updated = store.upsert(&rerun, "Amount exceeds limit").await.unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.upsert_count(), 2);
        assert_eq!(updated.analyzed_at, created.analyzed_at);
        assert_eq!(updated.status, TransactionStatus::Rejected);
        assert_eq!(updated.currency, "EUR");
        assert_eq!(store.get("t1").unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_exists_is_per_id() {
        let store = InMemoryTransactionStore::new();
        let tx = Transaction::new("t1", "acc-1", 1.0, "USD").with_status(TransactionStatus::Approved);
        store.upsert(&tx, "Normal transaction").await.unwrap();

        assert!(store.exists("t1").await.unwrap());
        assert!(!store.exists("t2").await.unwrap());
    }

    #[tokio::test]
    async fn test_poisoned_lock_is_a_store_error() {
        let store = Arc::new(InMemoryTransactionStore::new());
        let tx = Transaction::new("t1", "acc-1", 1.0, "USD").with_status(TransactionStatus::Approved);
        store.upsert(&tx, "Normal transaction").await.unwrap();

        let poisoner = store.clone();
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.records.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(joined.is_err());

        assert!(matches!(store.get("t1"), Err(AnalyzerError::Store(_))));
        assert!(matches!(store.len(), Err(AnalyzerError::Store(_))));
        assert!(store.is_empty().is_err());
        assert!(matches!(store.exists("t1").await, Err(AnalyzerError::Store(_))));
    }
}
