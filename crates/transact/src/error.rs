//! Error types for the transaction engine.
//!
//! This module defines all error types used during transaction pre-resolution,
//! prefetch, and write ordering, following a hierarchy that separates request
//! errors, store errors, and flush errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for transaction processing.
///
/// This enum encompasses all possible errors that can occur while resolving,
/// prefetching, and executing a transaction bundle, organized by category.
#[derive(Error, Debug)]
pub enum TransactError {
    /// Errors caused by the content of the request bundle
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Errors surfaced by the backing store
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Session flush errors
    #[error(transparent)]
    Flush(#[from] FlushError),
}

/// Errors caused by the content of the request bundle.
#[derive(Error, Debug)]
pub enum RequestError {
    /// A conditional expression matched more than one stored resource.
    #[error("invalid match URL \"{url}\": multiple resources match this search")]
    AmbiguousMatchUrl { url: String },

    /// A conditional expression passed admission but could not be parsed.
    #[error("invalid match URL \"{url}\": {message}")]
    InvalidMatchUrl { url: String, message: String },

    /// A conditional expression named a resource type the model does not know.
    #[error("unknown resource type: {resource_type}")]
    UnknownResourceType { resource_type: String },
}

/// Errors originating from the backing store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A batched identity lookup failed.
    #[error("identity lookup failed: {message}")]
    LookupFailed { message: String },

    /// A search executed on behalf of a conditional expression failed.
    #[error("conditional search failed for \"{url}\": {message}")]
    SearchFailed { url: String, message: String },

    /// Internal store error.
    #[error("store error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Errors raised while flushing buffered writes.
#[derive(Error, Debug)]
pub enum FlushError {
    /// The session flush failed. The message names every resource type in the
    /// bundle so the failure can be traced back to the offending batch.
    #[error("error flushing transaction with resource types: {resource_types}")]
    Failed {
        resource_types: String,
        #[source]
        source: StoreError,
    },
}

/// Result type alias for transaction processing.
pub type TransactResult<T> = Result<T, TransactError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_display() {
        let err = RequestError::AmbiguousMatchUrl {
            url: "Patient?identifier=http://acme.org|123".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid match URL \"Patient?identifier=http://acme.org|123\": multiple resources match this search"
        );
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::LookupFailed {
            message: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "identity lookup failed: connection reset");
    }

    #[test]
    fn test_flush_error_carries_resource_types() {
        let err = FlushError::Failed {
            resource_types: "[Observation (x2), Patient]".to_string(),
            source: StoreError::Internal {
                message: "constraint violation".to_string(),
                source: None,
            },
        };
        assert!(err.to_string().contains("[Observation (x2), Patient]"));
    }

    #[test]
    fn test_transact_error_from_categories() {
        let req = RequestError::UnknownResourceType {
            resource_type: "Widget".to_string(),
        };
        let err: TransactError = req.into();
        assert!(matches!(err, TransactError::Request(_)));

        let store = StoreError::LookupFailed {
            message: "timeout".to_string(),
        };
        let err: TransactError = store.into();
        assert!(matches!(err, TransactError::Store(_)));
    }
}
