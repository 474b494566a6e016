//! The transaction engine.
//!
//! A bundle moves through this module in a fixed order. Extraction scans
//! entries for the identities and conditional expressions they will need.
//! Identity resolution turns those into persistent ids with one batched
//! store call. Conditional resolution matches URL expressions, hashed and
//! batched, against the token index. The prefetch pass orchestrates all of
//! that and bulk-loads bodies and versions. The processor then runs the
//! ordered write phase. Everything learned along the way lives in the
//! [`TransactionContext`], which write executors read instead of going back
//! to storage.

mod conditional;
mod context;
mod extract;
mod prefetch;
mod processor;
mod resolve;

pub use context::TransactionContext;
pub use processor::{ProcessedBundle, TransactionProcessor};
