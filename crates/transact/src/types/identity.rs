//! Identity types for pre-resolution.
//!
//! A [`LogicalId`] is the client-visible `Type/id` identity of a resource,
//! stripped of version and base-URL qualifiers. A [`Pid`] is the store's
//! persistent identity for one resource row within a partition. The engine's
//! whole job is turning the former into the latter before any write runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::partition::PartitionId;

/// The unqualified, versionless logical identity of a resource.
///
/// Two references spelled differently (`Patient/p1`,
/// `http://example.org/fhir/Patient/p1/_history/3`) normalize to the same
/// `LogicalId`, so they resolve with a single lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogicalId {
    resource_type: String,
    id: String,
}

impl LogicalId {
    /// Creates a logical identity from its parts.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        LogicalId {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Parses a reference value into a logical identity.
    ///
    /// Returns `None` for values that do not name a concrete stored identity:
    /// local (`#contained`) references, placeholder (`urn:uuid:`, `urn:oid:`)
    /// references, conditional expressions containing `?`, and values with no
    /// resource type part. Version qualifiers and absolute base URLs are
    /// stripped.
    ///
    /// # Examples
    ///
    /// ```
    /// use helios_transact::types::LogicalId;
    ///
    /// let id = LogicalId::parse("Patient/p1/_history/3").unwrap();
    /// assert_eq!(id.to_string(), "Patient/p1");
    ///
    /// assert!(LogicalId::parse("urn:uuid:6b7e9c2a").is_none());
    /// assert!(LogicalId::parse("#contained").is_none());
    /// assert!(LogicalId::parse("Patient?identifier=x").is_none());
    /// ```
    pub fn parse(reference: &str) -> Option<LogicalId> {
        if reference.is_empty()
            || reference.starts_with('#')
            || reference.starts_with("urn:")
            || reference.contains('?')
        {
            return None;
        }

        let mut segments: Vec<&str> = reference.split('/').collect();

        // Strip a trailing _history/<version> qualifier.
        if segments.len() >= 2 && segments[segments.len() - 2] == "_history" {
            segments.truncate(segments.len() - 2);
        }

        if segments.len() < 2 {
            return None;
        }
        let id = segments[segments.len() - 1];
        let resource_type = segments[segments.len() - 2];
        if id.is_empty() || !is_resource_type_shaped(resource_type) {
            return None;
        }

        Some(LogicalId::new(resource_type, id))
    }

    /// Returns the resource type part.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Returns the id part.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns `true` if the id part parses as an integer.
    ///
    /// Stores that assign numeric server ids use this to tell server-assigned
    /// ids apart from client-assigned ones.
    pub fn id_part_is_numeric(&self) -> bool {
        self.id.parse::<i64>().is_ok()
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// Resource type names are ASCII alphanumeric and start with an uppercase
/// letter.
fn is_resource_type_shaped(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => chars.all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}

/// Persistent identity of a stored resource row.
///
/// A `Pid` is immutable: resolved version numbers are tracked separately by
/// the transaction context rather than mutated into the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pid {
    id: i64,
    partition: Option<PartitionId>,
}

impl Pid {
    /// Creates a persistent id with no partition.
    pub const fn new(id: i64) -> Self {
        Pid {
            id,
            partition: None,
        }
    }

    /// Creates a persistent id within a partition.
    pub const fn in_partition(id: i64, partition: PartitionId) -> Self {
        Pid {
            id,
            partition: Some(partition),
        }
    }

    /// Creates a persistent id from a row's (id, partition) columns.
    pub fn from_parts(id: i64, partition: Option<PartitionId>) -> Self {
        Pid { id, partition }
    }

    /// Returns the numeric row id.
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// Returns the partition this row lives in, if any.
    pub const fn partition(&self) -> Option<PartitionId> {
        self.partition
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Why an identity is being pre-resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefetchReason {
    /// The identity appears in a resource reference inside a body being
    /// written. Its deleted status matters, because a deleted resource must
    /// not be referenced, but its body contents do not.
    ReferenceTarget,

    /// The identity is the direct target of an update or patch. Its deleted
    /// status does not matter, because the write resurrects it, but its
    /// current body must be loaded so the write can diff against it.
    DirectTarget,
}
