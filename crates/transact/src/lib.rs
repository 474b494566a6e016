//! Helios FHIR Server Transaction Engine
//!
//! This crate pre-resolves and prefetches everything a FHIR transaction
//! bundle will touch before a single write executes, then drives the write
//! phase in client order. It exists so that a bundle of N entries costs a
//! handful of batched queries instead of N times a handful.
//!
//! # Features
//!
//! - **Batched identity resolution**: every `Type/id` a bundle targets or
//!   references is resolved to its persistent id in one store call
//! - **Conditional URL resolution**: `If-None-Exist` headers, conditional
//!   update URLs, and inline match URL references are parsed, hashed, and
//!   resolved against the token index in bounded chunks
//! - **Body and version prefetch**: resources the write phase will read are
//!   bulk-loaded up front
//! - **Write ordering**: entries execute in bundle order, with buffered
//!   writes flushed at every HTTP verb boundary
//! - **Shared caches**: resolved match URLs and resource versions are
//!   remembered across transactions, published only after commit
//!
//! # Architecture
//!
//! The engine is organized into several modules:
//!
//! - [`types`] - Bundle entries, identities, and per-entry outcomes
//! - [`model`] - The resource-model seam (definitions, reference walking)
//! - [`matchurl`] - Conditional expression admission, parsing, and hashing
//! - [`partition`] - Partition scopes and lookup predicates
//! - [`core`](self::core) - The store, session, and executor traits backends implement
//! - [`cache`] - Cross-transaction match URL and version caches
//! - [`txn`] - The processor and its prefetch passes
//! - [`config`] - Storage policy settings
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use helios_transact::matchurl::parse_match_url;
//! use helios_transact::model::{ResourceDefinition, SearchParamType};
//! use helios_transact::types::{BundleEntry, BundleMethod, TransactionBundle};
//!
//! // A conditional create: POST guarded by If-None-Exist.
//! let bundle = TransactionBundle::new(vec![BundleEntry::new(
//!     BundleMethod::Post,
//!     "Patient",
//! )
//! .with_if_none_exist("Patient?identifier=http://acme.org|123")]);
//! assert_eq!(bundle.len(), 1);
//!
//! // The expression the prefetch pass will resolve before any write runs.
//! let definition =
//!     ResourceDefinition::new("Patient").with_param("identifier", SearchParamType::Token);
//! let query = parse_match_url("Patient?identifier=http://acme.org|123", &definition).unwrap();
//! assert_eq!(query.resource_type(), "Patient");
//! assert!(query.single_token().is_some());
//! ```
//!
//! Processing a bundle requires the three backend seams from [`core`](self::core):
//!
//! ```ignore
//! let processor = TransactionProcessor::new(store, executor, adapter)
//!     .with_settings(StorageSettings::default());
//!
//! let processed = processor
//!     .process(session.as_ref(), &RequestPartition::Default, &bundle)
//!     .await?;
//! // ... commit the surrounding storage transaction ...
//! let outcomes = processed.committed();
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cache;
pub mod chunk;
pub mod config;
pub mod core;
pub mod error;
pub mod matchurl;
pub mod model;
pub mod partition;
pub mod txn;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{RequestError, StoreError, TransactError, TransactResult};
pub use types::{BundleEntry, BundleMethod, EntryOutcome, EntryOutcomes, TransactionBundle};

// Re-export the processor and its context
pub use txn::{ProcessedBundle, TransactionContext, TransactionProcessor};

// Re-export backend seams
pub use self::core::{
    FlushMode, HashColumn, IdentityLookup, ResolveMode, TokenHashRow, TransactionStore,
    WriteExecutor, WriteSession,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
