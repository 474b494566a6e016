//! Write-phase seam.

use async_trait::async_trait;

use crate::error::TransactResult;
use crate::partition::RequestPartition;
use crate::txn::TransactionContext;
use crate::types::{BundleEntry, EntryOutcome};

/// Executes one bundle entry against the backend.
///
/// The processor resolves everything it can up front, then walks the
/// bundle calling this trait per entry. Implementations write through the
/// same session the processor flushes, and read resolved identities from
/// the context instead of querying for them again.
#[async_trait]
pub trait WriteExecutor: Send + Sync {
    /// Applies one entry and reports what happened to it.
    ///
    /// # Arguments
    ///
    /// * `context` - Pre-resolved identities and match URLs for the batch
    /// * `partition` - The partition scope of the request
    /// * `index` - Position of the entry within the bundle
    /// * `entry` - The entry to apply
    ///
    /// # Errors
    ///
    /// * `TransactError::Request` - If the entry is invalid
    /// * `TransactError::Store` - If the backend write fails
    async fn execute(
        &self,
        context: &TransactionContext,
        partition: &RequestPartition,
        index: usize,
        entry: &BundleEntry,
    ) -> TransactResult<EntryOutcome>;
}
