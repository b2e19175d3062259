//! Download and normalization layer for the cointick poller.
//!
//! This crate provides:
//! - A retrying HTTP fetcher with a fixed attempt bound
//! - Normalizers turning raw JSON payloads into typed record batches
//! - Typed errors for retry exhaustion and schema mismatches
//!
//! Fetch and schema errors are all-or-nothing at batch granularity: a cycle
//! either persists a complete batch or nothing.

pub mod error;
pub mod fetch;
pub mod mining;
pub mod ticker;

pub use error::CollectError;
pub use fetch::{Fetcher, RetryPolicy};
pub use mining::normalize_mining;
pub use ticker::normalize_ticker;
