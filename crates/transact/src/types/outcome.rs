//! Per-entry write outcomes and their aggregation.
//!
//! Outcomes are kept as an explicit ordered sequence of
//! (entry index, outcome) pairs, in the order entries were executed, with a
//! side index by logical id for point lookups. The rendered resource-type
//! summary is used in flush failure diagnostics.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::types::identity::{LogicalId, Pid};

/// The action a write executor performed for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteAction {
    /// A new resource was created.
    Created,
    /// An existing resource was replaced.
    Updated,
    /// An existing resource was partially updated.
    Patched,
    /// A resource was deleted.
    Deleted,
    /// Nothing was written; a conditional create matched an existing
    /// resource.
    Unchanged,
}

/// Result of executing one bundle entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryOutcome {
    /// The concrete identity the entry resolved to.
    pub id: LogicalId,
    /// The persistent id written or matched, when the store reported one.
    pub pid: Option<Pid>,
    /// What the executor did.
    pub action: WriteAction,
    /// The stored version after the write, when known.
    pub version: Option<i64>,
}

impl EntryOutcome {
    /// Creates an outcome for the given identity and action.
    pub fn new(id: LogicalId, action: WriteAction) -> Self {
        EntryOutcome {
            id,
            pid: None,
            action,
            version: None,
        }
    }

    /// Attaches the persistent id the write landed on.
    pub fn with_pid(mut self, pid: Pid) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Attaches the stored version after the write.
    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }
}

/// Ordered per-entry outcomes of a transaction's write phase.
#[derive(Debug, Clone, Default)]
pub struct EntryOutcomes {
    ordered: Vec<(usize, EntryOutcome)>,
    by_id: HashMap<LogicalId, usize>,
}

impl EntryOutcomes {
    /// Creates an empty outcome sequence.
    pub fn new() -> Self {
        EntryOutcomes::default()
    }

    /// Records the outcome of one entry.
    ///
    /// Recording order is preserved. If the same logical id is recorded
    /// twice, the side index points at the most recent outcome.
    pub fn record(&mut self, entry_index: usize, outcome: EntryOutcome) {
        self.by_id.insert(outcome.id.clone(), self.ordered.len());
        self.ordered.push((entry_index, outcome));
    }

    /// Looks up the outcome for a logical id.
    pub fn get(&self, id: &LogicalId) -> Option<&EntryOutcome> {
        self.by_id.get(id).map(|&pos| &self.ordered[pos].1)
    }

    /// Iterates outcomes in recording order, with their entry indexes.
    pub fn iter(&self) -> impl Iterator<Item = &(usize, EntryOutcome)> {
        self.ordered.iter()
    }

    /// Returns the number of recorded outcomes.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Returns `true` if no outcomes have been recorded.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Renders the resource types touched so far, with counts.
    ///
    /// Types are listed alphabetically and the count suffix is omitted for
    /// types that appear once, e.g. `[Observation (x14), Patient]`.
    pub fn describe_resource_types(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for (_, outcome) in &self.ordered {
            *counts.entry(outcome.id.resource_type()).or_insert(0) += 1;
        }

        let mut description = String::from("[");
        for (i, (resource_type, count)) in counts.iter().enumerate() {
            if i > 0 {
                description.push_str(", ");
            }
            description.push_str(resource_type);
            if *count > 1 {
                description.push_str(&format!(" (x{count})"));
            }
        }
        description.push(']');
        description
    }
}
