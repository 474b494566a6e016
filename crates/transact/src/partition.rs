//! Partition scoping types.
//!
//! Transactions execute within a partition scope that every storage lookup
//! must honor. The engine never widens a scope: identities, match URLs, and
//! prefetched bodies are only ever resolved inside the partition the request
//! arrived with.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric identifier of a storage partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(i32);

impl PartitionId {
    /// Creates a partition id from its numeric value.
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the numeric value of this partition id.
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PartitionId {
    fn from(id: i32) -> Self {
        PartitionId::new(id)
    }
}

/// The partition scope a transaction executes in.
///
/// # Examples
///
/// ```
/// use helios_transact::partition::RequestPartition;
///
/// let scope = RequestPartition::single(42);
/// assert!(!scope.is_all());
/// assert_eq!(scope.ids().unwrap().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestPartition {
    /// All partitions are visible.
    All,

    /// The default partition only. Stores may map the default partition to a
    /// concrete id or to a NULL partition column, per [`PartitionSettings`].
    Default,

    /// A fixed set of partitions.
    Ids(Vec<PartitionId>),
}

impl RequestPartition {
    /// Creates a scope covering exactly one partition.
    pub fn single(id: i32) -> Self {
        RequestPartition::Ids(vec![PartitionId::new(id)])
    }

    /// Returns `true` if all partitions are visible.
    pub fn is_all(&self) -> bool {
        matches!(self, RequestPartition::All)
    }

    /// Returns `true` if this is the default-partition scope.
    pub fn is_default(&self) -> bool {
        matches!(self, RequestPartition::Default)
    }

    /// Returns the concrete partition ids of this scope, if it has any.
    pub fn ids(&self) -> Option<&[PartitionId]> {
        match self {
            RequestPartition::Ids(ids) => Some(ids),
            _ => None,
        }
    }

    /// Returns the single concrete partition id this scope maps to, if any.
    ///
    /// The default scope maps through [`PartitionSettings::default_partition_id`].
    /// Scopes covering zero or several partitions map to `None`.
    pub fn sole_id(&self, settings: &PartitionSettings) -> Option<PartitionId> {
        match self {
            RequestPartition::All => None,
            RequestPartition::Default => settings.default_partition_id,
            RequestPartition::Ids(ids) if ids.len() == 1 => Some(ids[0]),
            RequestPartition::Ids(_) => None,
        }
    }
}

impl fmt::Display for RequestPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestPartition::All => write!(f, "all"),
            RequestPartition::Default => write!(f, "default"),
            RequestPartition::Ids(ids) => {
                let rendered: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                write!(f, "[{}]", rendered.join(","))
            }
        }
    }
}

/// Partition behavior of the backing store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionSettings {
    /// Whether the store separates data into partitions at all.
    pub partitioning_enabled: bool,

    /// Whether search index hashes mix the partition id into the hashed
    /// value. When they do, token-hash lookups need no partition predicate.
    pub include_partition_in_search_hashes: bool,

    /// The concrete id backing the default partition, or `None` when the
    /// default partition is stored with a NULL partition column.
    pub default_partition_id: Option<PartitionId>,
}

impl Default for PartitionSettings {
    fn default() -> Self {
        PartitionSettings {
            partitioning_enabled: false,
            include_partition_in_search_hashes: false,
            default_partition_id: None,
        }
    }
}

/// The partition predicate an indexed lookup must apply.
///
/// Token hashes are partition-agnostic unless the store mixes partition ids
/// into them, so lookups on a partitioned store normally need an explicit
/// column predicate alongside the hash condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionFilter {
    /// No partition predicate.
    Unfiltered,

    /// Match rows whose partition column is NULL (the default partition on
    /// stores without a concrete default partition id).
    DefaultIsNull,

    /// Match rows whose partition column is one of the given ids.
    In(Vec<PartitionId>),
}

impl PartitionFilter {
    /// Chooses the predicate a token-hash lookup must apply for a scope.
    pub fn for_hash_lookup(settings: &PartitionSettings, scope: &RequestPartition) -> Self {
        if !settings.partitioning_enabled || settings.include_partition_in_search_hashes {
            return PartitionFilter::Unfiltered;
        }
        match scope {
            RequestPartition::All => PartitionFilter::Unfiltered,
            RequestPartition::Default => match settings.default_partition_id {
                None => PartitionFilter::DefaultIsNull,
                Some(id) => PartitionFilter::In(vec![id]),
            },
            RequestPartition::Ids(ids) => PartitionFilter::In(ids.clone()),
        }
    }
}
