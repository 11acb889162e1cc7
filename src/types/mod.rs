//! Type definitions for the fraud analyzer

pub mod analysis;
pub mod event;
pub mod transaction;

pub use analysis::{AnalysisOutcome, AnalysisRecord};
pub use event::{decode_transaction, DomainEvent};
pub use transaction::{Transaction, TransactionStatus};
