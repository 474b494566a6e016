//! In-memory fakes for driving the transaction processor in tests.
//!
//! The fakes record every call the engine makes, so tests can assert on
//! batching behavior (how many storage round trips, with which arguments)
//! as well as on outcomes.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use helios_transact::cache::SharedCaches;
use helios_transact::config::StorageSettings;
use helios_transact::core::{
    FlushMode, HashColumn, IdentityLookup, ResolveMode, TokenHashRow, TransactionStore,
    WriteExecutor, WriteSession,
};
use helios_transact::error::{StoreError, StoreResult, TransactResult};
use helios_transact::matchurl::MatchUrlQuery;
use helios_transact::model::{JsonModelAdapter, ModelAdapter};
use helios_transact::partition::{PartitionFilter, RequestPartition};
use helios_transact::txn::{ProcessedBundle, TransactionContext, TransactionProcessor};
use helios_transact::types::{
    BundleEntry, BundleMethod, EntryOutcome, LogicalId, Pid, TransactionBundle, WriteAction,
};

use super::fixtures::test_adapter;

// ============================================================================
// Storage fake
// ============================================================================

/// One recorded token-hash lookup.
#[derive(Debug, Clone)]
pub struct HashLookupCall {
    pub column: HashColumn,
    pub hashes: Vec<u64>,
    pub max_results: usize,
}

/// In-memory [`TransactionStore`] with full call recording.
///
/// Tests seed identities, token index rows, versions, and fallback search
/// results up front, then assert on the calls the engine made.
#[derive(Default)]
pub struct InMemoryStore {
    identities: Mutex<HashMap<LogicalId, IdentityLookup>>,
    system_value_rows: Mutex<Vec<TokenHashRow>>,
    value_rows: Mutex<Vec<TokenHashRow>>,
    versions: Mutex<HashMap<Pid, i64>>,
    search_results: Mutex<HashMap<String, Vec<Pid>>>,

    resolve_calls: Mutex<Vec<(Vec<LogicalId>, ResolveMode)>>,
    hash_calls: Mutex<Vec<HashLookupCall>>,
    search_calls: Mutex<Vec<String>>,
    body_calls: Mutex<Vec<(Vec<Pid>, bool)>>,
    version_calls: Mutex<Vec<Vec<Pid>>>,
    url_deletions: Mutex<Vec<Vec<Pid>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }

    /// Seeds an identity mapping the store will resolve.
    pub fn seed_identity(&self, id: LogicalId, lookup: IdentityLookup) {
        self.identities.lock().insert(id, lookup);
    }

    /// Seeds one token index row in the given hash column.
    pub fn seed_token_row(&self, column: HashColumn, hash: u64, pid: Pid) {
        let row = TokenHashRow { pid, hash };
        match column {
            HashColumn::SystemAndValue => self.system_value_rows.lock().push(row),
            HashColumn::Value => self.value_rows.lock().push(row),
        }
    }

    /// Seeds a stored version number.
    pub fn seed_version(&self, pid: Pid, version: i64) {
        self.versions.lock().insert(pid, version);
    }

    /// Stubs the result of fallback searches against one resource type.
    pub fn stub_search(&self, resource_type: &str, pids: Vec<Pid>) {
        self.search_results
            .lock()
            .insert(resource_type.to_string(), pids);
    }

    pub fn resolve_calls(&self) -> Vec<(Vec<LogicalId>, ResolveMode)> {
        self.resolve_calls.lock().clone()
    }

    pub fn hash_calls(&self) -> Vec<HashLookupCall> {
        self.hash_calls.lock().clone()
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.search_calls.lock().clone()
    }

    pub fn body_calls(&self) -> Vec<(Vec<Pid>, bool)> {
        self.body_calls.lock().clone()
    }

    pub fn version_calls(&self) -> Vec<Vec<Pid>> {
        self.version_calls.lock().clone()
    }

    pub fn url_deletions(&self) -> Vec<Vec<Pid>> {
        self.url_deletions.lock().clone()
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn resolve_identities(
        &self,
        _partition: &RequestPartition,
        ids: &[LogicalId],
        mode: ResolveMode,
    ) -> StoreResult<HashMap<LogicalId, IdentityLookup>> {
        self.resolve_calls.lock().push((ids.to_vec(), mode));

        let identities = self.identities.lock();
        let mut found = HashMap::new();
        for id in ids {
            if let Some(lookup) = identities.get(id) {
                found.insert(id.clone(), *lookup);
            }
        }
        Ok(found)
    }

    async fn lookup_token_hashes(
        &self,
        _filter: &PartitionFilter,
        column: HashColumn,
        hashes: &[u64],
        max_results: usize,
    ) -> StoreResult<Vec<TokenHashRow>> {
        self.hash_calls.lock().push(HashLookupCall {
            column,
            hashes: hashes.to_vec(),
            max_results,
        });

        let rows = match column {
            HashColumn::SystemAndValue => self.system_value_rows.lock().clone(),
            HashColumn::Value => self.value_rows.lock().clone(),
        };
        let mut matched: Vec<TokenHashRow> = rows
            .into_iter()
            .filter(|row| hashes.contains(&row.hash))
            .collect();
        matched.truncate(max_results);
        Ok(matched)
    }

    async fn match_search(
        &self,
        _partition: &RequestPartition,
        query: &MatchUrlQuery,
    ) -> StoreResult<Vec<Pid>> {
        self.search_calls.lock().push(query.resource_type().to_string());
        Ok(self
            .search_results
            .lock()
            .get(query.resource_type())
            .cloned()
            .unwrap_or_default())
    }

    async fn preload_bodies(&self, pids: &[Pid], include_deleted: bool) -> StoreResult<()> {
        self.body_calls.lock().push((pids.to_vec(), include_deleted));
        Ok(())
    }

    async fn load_versions(&self, pids: &[Pid]) -> StoreResult<Vec<(Pid, i64)>> {
        self.version_calls.lock().push(pids.to_vec());

        let versions = self.versions.lock();
        Ok(pids
            .iter()
            .filter_map(|pid| versions.get(pid).map(|version| (*pid, *version)))
            .collect())
    }

    async fn delete_search_urls(&self, pids: &[Pid]) -> StoreResult<()> {
        self.url_deletions.lock().push(pids.to_vec());
        Ok(())
    }
}

// ============================================================================
// Session fake
// ============================================================================

/// One observable session event, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ModeChanged(FlushMode),
    Flushed,
}

/// [`WriteSession`] fake that records mode switches and flushes.
#[derive(Default)]
pub struct RecordingSession {
    mode: Mutex<FlushMode>,
    events: Mutex<Vec<SessionEvent>>,
    pending_inserts: AtomicUsize,
    pending_updates: AtomicUsize,
    fail_flush: AtomicBool,
}

impl RecordingSession {
    pub fn new() -> Self {
        RecordingSession::default()
    }

    /// Sets the buffered work the session reports.
    pub fn set_pending(&self, inserts: usize, updates: usize) {
        self.pending_inserts.store(inserts, Ordering::SeqCst);
        self.pending_updates.store(updates, Ordering::SeqCst);
    }

    /// Makes every subsequent flush fail.
    pub fn fail_flushes(&self) {
        self.fail_flush.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    pub fn flush_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, SessionEvent::Flushed))
            .count()
    }
}

#[async_trait]
impl WriteSession for RecordingSession {
    fn flush_mode(&self) -> FlushMode {
        *self.mode.lock()
    }

    fn set_flush_mode(&self, mode: FlushMode) {
        *self.mode.lock() = mode;
        self.events.lock().push(SessionEvent::ModeChanged(mode));
    }

    async fn flush(&self) -> StoreResult<()> {
        if self.fail_flush.load(Ordering::SeqCst) {
            return Err(StoreError::Internal {
                message: "flush rejected".to_string(),
                source: None,
            });
        }
        self.events.lock().push(SessionEvent::Flushed);
        Ok(())
    }

    fn pending_inserts(&self) -> usize {
        self.pending_inserts.load(Ordering::SeqCst)
    }

    fn pending_updates(&self) -> usize {
        self.pending_updates.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Executor fake
// ============================================================================

/// The transaction-cache state the executor observed for one lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The engine had recorded a match.
    Found(Pid),
    /// The engine had recorded an explicit not-found.
    NotFound,
    /// The engine had recorded nothing for this key.
    Unrecorded,
}

impl Resolution {
    fn of(answer: Option<Option<Pid>>) -> Self {
        match answer {
            Some(Some(pid)) => Resolution::Found(pid),
            Some(None) => Resolution::NotFound,
            None => Resolution::Unrecorded,
        }
    }

    pub fn pid(&self) -> Option<Pid> {
        match self {
            Resolution::Found(pid) => Some(*pid),
            _ => None,
        }
    }
}

/// What the executor fake observed while applying one entry.
#[derive(Debug, Clone)]
pub struct ExecutedEntry {
    pub index: usize,
    pub method: BundleMethod,
    pub url: String,
    /// Context answer for the entry's conditional expression, when it had
    /// one.
    pub condition: Option<Resolution>,
    /// Context answer for the entry's direct `Type/id` target, when it had
    /// one.
    pub target: Option<Resolution>,
    /// Context answers for every reference in the body, keyed by the
    /// reference value as written.
    pub references: Vec<(String, Resolution)>,
    /// Prefetched version of the matched resource, for guarded creates
    /// that matched.
    pub matched_version: Option<i64>,
}

/// [`WriteExecutor`] fake.
///
/// Every entry snapshots what the transaction context knew at execution
/// time, then fabricates a plausible outcome: matched conditions reuse the
/// matched pid, everything else gets a fresh pid from a counter. No state
/// is written anywhere.
pub struct RecordingExecutor {
    adapter: Arc<JsonModelAdapter>,
    next_pid: AtomicI64,
    executed: Mutex<Vec<ExecutedEntry>>,
}

impl RecordingExecutor {
    pub fn new(adapter: Arc<JsonModelAdapter>) -> Self {
        RecordingExecutor {
            adapter,
            next_pid: AtomicI64::new(1000),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// The entries executed so far, in execution order.
    pub fn executed(&self) -> Vec<ExecutedEntry> {
        self.executed.lock().clone()
    }

    fn fresh_pid(&self) -> Pid {
        Pid::new(self.next_pid.fetch_add(1, Ordering::SeqCst))
    }

    fn create(&self, resource_type: &str) -> EntryOutcome {
        let pid = self.fresh_pid();
        EntryOutcome::new(
            LogicalId::new(resource_type, format!("new-{}", pid.id())),
            WriteAction::Created,
        )
        .with_pid(pid)
        .with_version(1)
    }

    fn body_type(&self, entry: &BundleEntry) -> String {
        entry
            .resource
            .as_ref()
            .and_then(|resource| self.adapter.body_resource_type(resource))
            .or_else(|| self.adapter.resource_type_in_url(&entry.url))
            .unwrap_or_else(|| "Resource".to_string())
    }
}

#[async_trait]
impl WriteExecutor for RecordingExecutor {
    async fn execute(
        &self,
        context: &TransactionContext,
        _partition: &RequestPartition,
        index: usize,
        entry: &BundleEntry,
    ) -> TransactResult<EntryOutcome> {
        let mut observed = ExecutedEntry {
            index,
            method: entry.method,
            url: entry.url.clone(),
            condition: None,
            target: None,
            references: Vec::new(),
            matched_version: None,
        };

        if let Some(resource) = entry.resource.as_ref() {
            for reference in self.adapter.collect_references(resource) {
                let answer = match LogicalId::parse(&reference) {
                    Some(id) => context.resolved_id(&id),
                    None => context.resolved_match_url(&reference),
                };
                observed.references.push((reference, Resolution::of(answer)));
            }
        }

        let outcome = match entry.method {
            BundleMethod::Post => {
                let resource_type = self.body_type(entry);
                match entry.if_none_exist.as_deref() {
                    Some(condition) => {
                        let resolution = Resolution::of(context.resolved_match_url(condition));
                        observed.condition = Some(resolution);
                        if let Resolution::Found(pid) = resolution {
                            observed.matched_version = context.resolved_version(pid);
                            let mut outcome = EntryOutcome::new(
                                LogicalId::new(&resource_type, pid.to_string()),
                                WriteAction::Unchanged,
                            )
                            .with_pid(pid);
                            if let Some(version) = observed.matched_version {
                                outcome = outcome.with_version(version);
                            }
                            outcome
                        } else {
                            self.create(&resource_type)
                        }
                    }
                    None => self.create(&resource_type),
                }
            }
            BundleMethod::Put | BundleMethod::Patch => {
                let action = if entry.method == BundleMethod::Put {
                    WriteAction::Updated
                } else {
                    WriteAction::Patched
                };
                if entry.url.contains('?') {
                    let resolution = Resolution::of(context.resolved_match_url(&entry.url));
                    observed.condition = Some(resolution);
                    let resource_type = self.body_type(entry);
                    match resolution {
                        Resolution::Found(pid) => EntryOutcome::new(
                            LogicalId::new(&resource_type, pid.to_string()),
                            action,
                        )
                        .with_pid(pid),
                        _ => self.create(&resource_type),
                    }
                } else if let Some(id) = LogicalId::parse(&entry.url) {
                    let resolution = Resolution::of(context.resolved_id(&id));
                    observed.target = Some(resolution);
                    match resolution {
                        Resolution::Found(pid) => EntryOutcome::new(id, action).with_pid(pid),
                        _ => EntryOutcome::new(id, WriteAction::Created)
                            .with_pid(self.fresh_pid())
                            .with_version(1),
                    }
                } else {
                    self.create(&self.body_type(entry))
                }
            }
            BundleMethod::Delete => match LogicalId::parse(&entry.url) {
                Some(id) => {
                    let resolution = Resolution::of(context.resolved_id(&id));
                    observed.target = Some(resolution);
                    let pid = resolution.pid().unwrap_or_else(|| self.fresh_pid());
                    EntryOutcome::new(id, WriteAction::Deleted).with_pid(pid)
                }
                None => {
                    let resource_type = self
                        .adapter
                        .resource_type_in_url(&entry.url)
                        .unwrap_or_else(|| "Resource".to_string());
                    EntryOutcome::new(LogicalId::new(resource_type, "unresolved"), WriteAction::Deleted)
                        .with_pid(self.fresh_pid())
                }
            },
            BundleMethod::Get => EntryOutcome::new(
                LogicalId::new("Bundle", format!("read-{index}")),
                WriteAction::Unchanged,
            ),
        };

        self.executed.lock().push(observed);
        Ok(outcome)
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A fully wired processor over the in-memory fakes.
pub struct EngineHarness {
    pub store: Arc<InMemoryStore>,
    pub session: Arc<RecordingSession>,
    pub executor: Arc<RecordingExecutor>,
    pub caches: Arc<SharedCaches>,
    pub partition: RequestPartition,
    processor: TransactionProcessor,
}

impl EngineHarness {
    pub fn new() -> Self {
        EngineHarness::with_settings(StorageSettings::default())
    }

    pub fn with_settings(settings: StorageSettings) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let session = Arc::new(RecordingSession::new());
        let executor = Arc::new(RecordingExecutor::new(test_adapter()));
        let caches = Arc::new(SharedCaches::new());
        let processor = TransactionProcessor::new(
            store.clone(),
            executor.clone(),
            test_adapter(),
        )
        .with_caches(caches.clone())
        .with_settings(settings);

        EngineHarness {
            store,
            session,
            executor,
            caches,
            partition: RequestPartition::All,
            processor,
        }
    }

    /// Runs one bundle through the processor.
    pub async fn process(&self, bundle: &TransactionBundle) -> TransactResult<ProcessedBundle> {
        self.processor
            .process(self.session.as_ref(), &self.partition, bundle)
            .await
    }
}

impl Default for EngineHarness {
    fn default() -> Self {
        EngineHarness::new()
    }
}
