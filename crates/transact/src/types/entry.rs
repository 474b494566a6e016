//! Bundle entry types processed by the transaction engine.
//!
//! These mirror the request side of a FHIR transaction bundle: an ordered
//! list of entries, each carrying an HTTP method, a request URL, optional
//! conditional headers, and an optional resource body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP method for bundle entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BundleMethod {
    /// GET - Read operation.
    Get,
    /// POST - Create operation.
    Post,
    /// PUT - Update or create operation.
    Put,
    /// PATCH - Partial update operation.
    Patch,
    /// DELETE - Delete operation.
    Delete,
}

impl BundleMethod {
    /// Returns `true` for methods that modify resource state.
    pub fn is_write(&self) -> bool {
        !matches!(self, BundleMethod::Get)
    }
}

impl std::fmt::Display for BundleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BundleMethod::Get => write!(f, "GET"),
            BundleMethod::Post => write!(f, "POST"),
            BundleMethod::Put => write!(f, "PUT"),
            BundleMethod::Patch => write!(f, "PATCH"),
            BundleMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Entry in a FHIR transaction bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleEntry {
    /// The HTTP method for this entry.
    pub method: BundleMethod,
    /// The request URL (direct `Type/id`, conditional `Type?param=value`,
    /// or just `Type` for plain creates).
    pub url: String,
    /// The resource content (for POST, PUT, PATCH).
    pub resource: Option<Value>,
    /// If-Match header value for version-aware updates.
    pub if_match: Option<String>,
    /// If-None-Match header value.
    pub if_none_match: Option<String>,
    /// If-None-Exist header for conditional creates.
    pub if_none_exist: Option<String>,
}

impl BundleEntry {
    /// Creates an entry with no body and no conditional headers.
    pub fn new(method: BundleMethod, url: impl Into<String>) -> Self {
        BundleEntry {
            method,
            url: url.into(),
            resource: None,
            if_match: None,
            if_none_match: None,
            if_none_exist: None,
        }
    }

    /// Attaches a resource body to this entry.
    pub fn with_resource(mut self, resource: Value) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Sets the If-None-Exist header for a conditional create.
    pub fn with_if_none_exist(mut self, expression: impl Into<String>) -> Self {
        self.if_none_exist = Some(expression.into());
        self
    }

    /// Sets the If-Match header for a version-aware update.
    pub fn with_if_match(mut self, etag: impl Into<String>) -> Self {
        self.if_match = Some(etag.into());
        self
    }
}

/// An ordered FHIR transaction bundle.
///
/// Entry order is the client's order and is preserved through processing:
/// prefetch phases inspect entries in order, and the write phase executes
/// them in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionBundle {
    entries: Vec<BundleEntry>,
}

impl TransactionBundle {
    /// Creates a bundle from its ordered entries.
    pub fn new(entries: Vec<BundleEntry>) -> Self {
        TransactionBundle { entries }
    }

    /// Returns the ordered entries of this bundle.
    pub fn entries(&self) -> &[BundleEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the bundle has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<BundleEntry>> for TransactionBundle {
    fn from(entries: Vec<BundleEntry>) -> Self {
        TransactionBundle::new(entries)
    }
}
