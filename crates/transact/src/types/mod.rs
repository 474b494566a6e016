//! Core types for the transaction engine.
//!
//! This module provides the fundamental types processed and produced by the
//! engine:
//!
//! - [`BundleEntry`], [`TransactionBundle`] - the request side of a
//!   transaction bundle
//! - [`LogicalId`], [`Pid`] - client-visible and persistent identities
//! - [`PrefetchReason`] - why an identity is being pre-resolved
//! - [`EntryOutcome`], [`EntryOutcomes`] - ordered per-entry write results
//!
//! # Examples
//!
//! ```
//! use helios_transact::types::{BundleEntry, BundleMethod, LogicalId};
//! use serde_json::json;
//!
//! let entry = BundleEntry::new(BundleMethod::Put, "Patient/p1")
//!     .with_resource(json!({"resourceType": "Patient", "id": "p1"}));
//! assert_eq!(entry.method, BundleMethod::Put);
//!
//! let target = LogicalId::parse(&entry.url).unwrap();
//! assert_eq!(target.to_string(), "Patient/p1");
//! ```

mod entry;
mod identity;
mod outcome;

pub use entry::{BundleEntry, BundleMethod, TransactionBundle};
pub use identity::{LogicalId, Pid, PrefetchReason};
pub use outcome::{EntryOutcome, EntryOutcomes, WriteAction};
