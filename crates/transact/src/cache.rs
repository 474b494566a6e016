//! Shared caches that outlive individual transactions.
//!
//! Two caches back the fast paths of pre-resolution: resolved conditional
//! expressions and resource version numbers. Only positive results are
//! stored. An expression that matched nothing is never cached here, since
//! the next transaction may create the resource it asks for. The engine
//! publishes into these caches through commit hooks, so a transaction
//! that rolls back never publishes anything.

use moka::sync::Cache;

use crate::partition::RequestPartition;
use crate::types::Pid;

const DEFAULT_MATCH_URL_CAPACITY: u64 = 10_000;
const DEFAULT_VERSION_CAPACITY: u64 = 10_000;

/// Key for resolved conditional expressions. The partition scope is part
/// of the key so one partition's match never answers another's.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MatchUrlKey {
    resource_type: String,
    url: String,
    partition: RequestPartition,
}

/// Process-wide caches consulted during transaction pre-resolution.
pub struct SharedCaches {
    match_urls: Cache<MatchUrlKey, Pid>,
    versions: Cache<Pid, i64>,
}

impl SharedCaches {
    /// Creates caches with default capacities.
    pub fn new() -> Self {
        SharedCaches::with_capacities(DEFAULT_MATCH_URL_CAPACITY, DEFAULT_VERSION_CAPACITY)
    }

    /// Creates caches with explicit entry capacities.
    pub fn with_capacities(match_url_entries: u64, version_entries: u64) -> Self {
        SharedCaches {
            match_urls: Cache::builder().max_capacity(match_url_entries).build(),
            versions: Cache::builder().max_capacity(version_entries).build(),
        }
    }

    /// Looks up a previously resolved conditional expression.
    pub fn lookup_match_url(
        &self,
        resource_type: &str,
        url: &str,
        partition: &RequestPartition,
    ) -> Option<Pid> {
        self.match_urls.get(&MatchUrlKey {
            resource_type: resource_type.to_string(),
            url: url.to_string(),
            partition: partition.clone(),
        })
    }

    /// Records a resolved conditional expression.
    pub fn store_match_url(
        &self,
        resource_type: &str,
        url: &str,
        partition: &RequestPartition,
        pid: Pid,
    ) {
        self.match_urls.insert(
            MatchUrlKey {
                resource_type: resource_type.to_string(),
                url: url.to_string(),
                partition: partition.clone(),
            },
            pid,
        );
    }

    /// Looks up a cached current version.
    pub fn lookup_version(&self, pid: Pid) -> Option<i64> {
        self.versions.get(&pid)
    }

    /// Records a current version.
    pub fn store_version(&self, pid: Pid, version: i64) {
        self.versions.insert(pid, version);
    }

    /// Drops every cached entry.
    pub fn invalidate_all(&self) {
        self.match_urls.invalidate_all();
        self.versions.invalidate_all();
    }
}

impl Default for SharedCaches {
    fn default() -> Self {
        SharedCaches::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::PartitionId;

    #[test]
    fn test_match_url_roundtrip() {
        let caches = SharedCaches::new();
        let partition = RequestPartition::All;
        let url = "Patient?identifier=http://acme.org|123";

        assert!(caches.lookup_match_url("Patient", url, &partition).is_none());
        caches.store_match_url("Patient", url, &partition, Pid::new(42));
        assert_eq!(
            caches.lookup_match_url("Patient", url, &partition),
            Some(Pid::new(42))
        );
    }

    #[test]
    fn test_match_url_partition_isolation() {
        let caches = SharedCaches::new();
        let url = "Patient?identifier=123";
        let p1 = RequestPartition::single(1);
        let p2 = RequestPartition::single(2);

        caches.store_match_url("Patient", url, &p1, Pid::in_partition(7, PartitionId::new(1)));
        assert!(caches.lookup_match_url("Patient", url, &p2).is_none());
        assert!(caches.lookup_match_url("Patient", url, &p1).is_some());
    }

    #[test]
    fn test_match_url_type_isolation() {
        let caches = SharedCaches::new();
        let partition = RequestPartition::All;

        caches.store_match_url("Patient", "Patient?identifier=1", &partition, Pid::new(1));
        assert!(caches
            .lookup_match_url("Observation", "Patient?identifier=1", &partition)
            .is_none());
    }

    #[test]
    fn test_version_roundtrip() {
        let caches = SharedCaches::new();
        assert!(caches.lookup_version(Pid::new(9)).is_none());
        caches.store_version(Pid::new(9), 4);
        assert_eq!(caches.lookup_version(Pid::new(9)), Some(4));
    }

    #[test]
    fn test_invalidate_all() {
        let caches = SharedCaches::new();
        let partition = RequestPartition::All;
        caches.store_match_url("Patient", "Patient?identifier=1", &partition, Pid::new(1));
        caches.store_version(Pid::new(1), 2);

        caches.invalidate_all();
        assert!(caches
            .lookup_match_url("Patient", "Patient?identifier=1", &partition)
            .is_none());
        assert!(caches.lookup_version(Pid::new(1)).is_none());
    }
}
