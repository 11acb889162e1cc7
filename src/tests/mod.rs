//! Pipeline tests.
//!
//! Test modules:
//! - harness: test doubles for the store and bus ports
//! - pipeline: end-to-end scenarios through the inbound handler
//! - idempotency: duplicate and concurrent deliveries
