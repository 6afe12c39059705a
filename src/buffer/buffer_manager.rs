//! Buffer Manager - the residency cache.
//!
//! The [`BufferManager`] provides:
//! - Registration of large byte buffers under stable [`BufferId`]s
//! - Lock-count based pinning through [`ScopedLock`]
//! - Transparent dump to and restore from temporary files
//! - Runtime-swappable eviction policies

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::{ArcMutexGuard, RawMutex, RwLock};
use tracing::{debug, info, warn};

use crate::buffer::policy::{EvictionPolicy, NeverDump, PolicyRegistry};
use crate::buffer::record::Slot;
use crate::buffer::{
    AlignedBytes, BufferInfo, BufferRecord, CacheStatistics, ManagerStats, Residency, ScopedLock,
};
use crate::common::{BufferId, CacheError, LogicalClock, ManagerConfig, Result};
use crate::notify::{CacheEvent, NotificationChannel, RegistryChange};
use crate::storage::{DumpFile, TempStore};

/// A dump whose bytes have left their record but whose file is not
/// installed yet.
struct PendingDump {
    record: Arc<BufferRecord>,
    bytes: AlignedBytes,
    _transfer: ArcMutexGuard<RawMutex, ()>,
}

/// Records plus the policy that judges them, swapped under one lock.
struct Table {
    records: HashMap<BufferId, Arc<BufferRecord>>,
    policy: Box<dyn EvictionPolicy>,
}

/// Owns every registered buffer and decides which of them stay in memory.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                        BufferManager                         │
/// │  ┌───────────────────────────────────────────────────────┐   │
/// │  │ table: RwLock<Table>                                  │   │
/// │  │   records: BufferId → Arc<BufferRecord>               │   │
/// │  │   policy:  Box<dyn EvictionPolicy>                    │   │
/// │  └───────────────────────────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐    │
/// │  │  registry    │  │    clock     │  │     channel      │    │
/// │  │ name→factory │  │ LogicalClock │  │ CacheEvent fan-out│   │
/// │  └──────────────┘  └──────────────┘  └──────────────────┘    │
/// │  ┌──────────────┐  ┌──────────────┐                          │
/// │  │    stats     │  │  temp_store  │ ← dropped last           │
/// │  │ ManagerStats │  │  TempStore   │                          │
/// │  └──────────────┘  └──────────────┘                          │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `table`: `RwLock` - lookups and fast-path locks share it; register,
///   unregister, dump, restore and policy swaps take it exclusively
/// - `registry`: `RwLock` - read on every policy switch
/// - record lock counts: atomic, so pinning a resident buffer never waits
///   on other pins
/// - `stats`, `clock`, `next_id`: atomics
///
/// A dump takes a buffer's bytes out of its record under the exclusive
/// table lock after checking its lock count, writes the file with no table
/// lock held, and installs it under the exclusive lock again. A buffer is
/// only pinned under the table lock while its bytes are in place, so a dump
/// never races a pin.
///
/// # Lock Order
/// Table lock, then a record's slot lock, and only for records nobody has
/// pinned. Anything that may wait on a pinned buffer's slot first clones
/// the record and releases the table.
///
/// # Usage
/// ```
/// use residency::BufferManager;
///
/// let manager = BufferManager::new();
/// let id = manager.register(4000).unwrap();
///
/// manager.dump(id).unwrap();
/// assert!(manager.is_dumped(id).unwrap());
///
/// // Locking restores transparently.
/// let lock = manager.lock(id).unwrap();
/// assert_eq!(lock.read().len(), 4000);
/// assert!(!manager.is_dumped(id).unwrap());
/// ```
pub struct BufferManager {
    /// Records and the active policy.
    table: RwLock<Table>,

    /// Policy factories by name.
    registry: RwLock<PolicyRegistry>,

    /// Access ticks for least-recently-accessed ordering.
    clock: LogicalClock,

    /// Next handle to hand out. Handles are never reused.
    next_id: AtomicU64,

    /// Cumulative counters.
    stats: ManagerStats,

    /// Observers of registrations and residency changes.
    channel: NotificationChannel,

    /// Run the policy after register and reallocate.
    auto_evict: AtomicBool,

    /// Dump file storage, shared with other managers under the same parent.
    /// Declared last so it outlives every dump file.
    temp_store: Arc<TempStore>,
}

impl BufferManager {
    /// Create a manager with the default configuration.
    ///
    /// Dump files go under the platform temp directory and the `never`
    /// policy is active, so nothing is dumped until asked.
    pub fn new() -> Self {
        let config = ManagerConfig::default();
        Self::from_parts(
            PolicyRegistry::with_builtins(),
            Box::new(NeverDump::new()),
            TempStore::shared(config.temp_parent),
            config.auto_evict,
        )
    }

    /// Create a manager from a configuration.
    ///
    /// # Errors
    /// - `CacheError::UnknownPolicy` if `config.policy` is not a built-in
    /// - `CacheError::UnknownParameter` / `InvalidParameter` from
    ///   `config.params`
    pub fn with_config(config: ManagerConfig) -> Result<Self> {
        Self::with_registry(config, PolicyRegistry::with_builtins())
    }

    /// Create a manager that resolves policy names through `registry`.
    ///
    /// Managers with the same `temp_parent` share one temp root.
    pub fn with_registry(config: ManagerConfig, registry: PolicyRegistry) -> Result<Self> {
        let temp_store = TempStore::shared(config.temp_parent.clone());
        Self::with_temp_store(config, registry, temp_store)
    }

    /// Create a manager that dumps into `temp_store`.
    ///
    /// `config.temp_parent` is ignored.
    pub fn with_temp_store(
        config: ManagerConfig,
        registry: PolicyRegistry,
        temp_store: Arc<TempStore>,
    ) -> Result<Self> {
        let mut policy = registry.create(&config.policy)?;
        for (name, value) in &config.params {
            policy.set_param(name, value)?;
        }

        info!(
            policy = policy.name(),
            temp_parent = %temp_store.parent().display(),
            auto_evict = config.auto_evict,
            "buffer manager created"
        );

        Ok(Self::from_parts(registry, policy, temp_store, config.auto_evict))
    }

    fn from_parts(
        registry: PolicyRegistry,
        policy: Box<dyn EvictionPolicy>,
        temp_store: Arc<TempStore>,
        auto_evict: bool,
    ) -> Self {
        Self {
            table: RwLock::new(Table {
                records: HashMap::new(),
                policy,
            }),
            registry: RwLock::new(registry),
            clock: LogicalClock::new(),
            next_id: AtomicU64::new(0),
            stats: ManagerStats::new(),
            channel: NotificationChannel::new(),
            auto_evict: AtomicBool::new(auto_evict),
            temp_store,
        }
    }

    // ========================================================================
    // Public API: Registration
    // ========================================================================

    /// Register a new zeroed buffer of `size` bytes.
    ///
    /// Runs automatic eviction afterwards if enabled; failures there are
    /// logged and never reported to this caller.
    ///
    /// # Errors
    /// - `CacheError::Allocation` if the memory cannot be obtained
    pub fn register(&self, size: usize) -> Result<BufferId> {
        let bytes = AlignedBytes::zeroed(size)?;
        Ok(self.insert(bytes))
    }

    /// Register a buffer holding a copy of `bytes`.
    pub fn register_bytes(&self, bytes: &[u8]) -> Result<BufferId> {
        let bytes = AlignedBytes::from_slice(bytes)?;
        Ok(self.insert(bytes))
    }

    /// Remove a buffer, deleting its dump file if it has one.
    ///
    /// # Errors
    /// - `CacheError::UnknownBuffer` if `id` is not registered
    /// - `CacheError::BufferLocked` if scoped locks are outstanding
    pub fn unregister(&self, id: BufferId) -> Result<()> {
        let mut table = self.table.write();

        let record = table
            .records
            .get(&id)
            .ok_or(CacheError::UnknownBuffer(id))?;
        if record.is_locked() {
            return Err(CacheError::BufferLocked(id));
        }

        if let Some(record) = table.records.remove(&id) {
            let size = record.size();
            record.install(Slot::Released);
            self.channel.publish(CacheEvent::Registry {
                id,
                change: RegistryChange::Unregistered,
                size,
            });
            debug!(%id, size, "unregistered buffer");
        }

        Ok(())
    }

    /// Replace a buffer's storage with `size` fresh zeroed bytes.
    ///
    /// Any dump file is discarded; the buffer is resident afterwards.
    ///
    /// # Errors
    /// - `CacheError::Allocation` if the memory cannot be obtained (the old
    ///   storage is kept)
    /// - `CacheError::UnknownBuffer` if `id` is not registered
    /// - `CacheError::BufferLocked` if scoped locks are outstanding
    pub fn reallocate(&self, id: BufferId, size: usize) -> Result<()> {
        let bytes = AlignedBytes::zeroed(size)?;

        {
            let table = self.table.write();
            let record = table
                .records
                .get(&id)
                .ok_or(CacheError::UnknownBuffer(id))?;
            if record.is_locked() {
                return Err(CacheError::BufferLocked(id));
            }

            let was_dumped = record.is_dumped();
            record.install(Slot::Resident(bytes));
            record.touch(self.clock.tick());
            if was_dumped {
                self.channel.publish(CacheEvent::Residency {
                    id,
                    residency: Residency::Resident,
                    size,
                });
            }
            debug!(%id, size, was_dumped, "reallocated buffer");
        }

        self.maybe_evict();
        Ok(())
    }

    // ========================================================================
    // Public API: Locking
    // ========================================================================

    /// Pin a buffer in memory, restoring it first if it was dumped.
    ///
    /// The buffer cannot be dumped until every returned [`ScopedLock`] (and
    /// its clones) is dropped.
    ///
    /// # Errors
    /// - `CacheError::UnknownBuffer` if `id` is not registered
    /// - `CacheError::Io` / `CacheError::Allocation` if a needed restore fails
    pub fn lock(&self, id: BufferId) -> Result<ScopedLock> {
        // Fast path: resident buffers are pinned under the shared lock.
        {
            let table = self.table.read();
            let record = table
                .records
                .get(&id)
                .ok_or(CacheError::UnknownBuffer(id))?;
            if record.is_resident() {
                return Ok(self.pin(record));
            }
        }

        self.restore_internal(id, true)?
            .ok_or(CacheError::UnknownBuffer(id))
    }

    // ========================================================================
    // Public API: Dump and restore
    // ========================================================================

    /// Write a buffer to a temp file and free its memory.
    ///
    /// Dumping an already dumped buffer does nothing.
    ///
    /// # Errors
    /// - `CacheError::UnknownBuffer` if `id` is not registered
    /// - `CacheError::BufferLocked` if scoped locks are outstanding
    /// - `CacheError::Io` / `CacheError::TempAllocation` if the write fails;
    ///   the buffer stays resident
    pub fn dump(&self, id: BufferId) -> Result<()> {
        let pending = {
            let table = self.table.write();
            let record = table
                .records
                .get(&id)
                .ok_or(CacheError::UnknownBuffer(id))?;
            self.begin_dump(record)?
        };

        if let Some(pending) = pending {
            let written = DumpFile::write(&self.temp_store, pending.bytes.as_slice());
            let _table = self.table.write();
            self.finish_dump(pending, written)?;
        }
        Ok(())
    }

    /// Read a dumped buffer back into memory and delete its dump file.
    ///
    /// Restoring a resident buffer does nothing.
    ///
    /// # Errors
    /// - `CacheError::UnknownBuffer` if `id` is not registered
    /// - `CacheError::Io` if the dump file is missing, truncated or corrupt;
    ///   the buffer stays dumped
    /// - `CacheError::Allocation` if the memory cannot be obtained
    pub fn restore(&self, id: BufferId) -> Result<()> {
        self.restore_internal(id, false).map(|_| ())
    }

    /// Dump every unlocked resident buffer. Returns how many were dumped.
    ///
    /// Locked buffers are skipped.
    ///
    /// # Errors
    /// The first dump failure. Every other buffer is still attempted, and
    /// the ones that failed stay resident.
    pub fn dump_all(&self) -> Result<usize> {
        let pending: Vec<PendingDump> = {
            let table = self.table.write();
            table
                .records
                .values()
                .filter_map(|record| self.begin_dump(record).ok().flatten())
                .collect()
        };

        let written = self.write_dumps(pending);

        let _table = self.table.write();
        let mut dumped = 0;
        let mut first_error = None;
        for (pending, result) in written {
            match self.finish_dump(pending, result) {
                Ok(true) => dumped += 1,
                Ok(false) => {}
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        info!(dumped, "dumped all unlocked buffers");
        match first_error {
            Some(e) => Err(e),
            None => Ok(dumped),
        }
    }

    /// Ask the active policy for victims and dump them.
    ///
    /// Victims that are locked by now are skipped; failed dumps are logged
    /// and counted. Returns how many buffers were dumped.
    pub fn trigger_eviction(&self) -> usize {
        let (policy, pending) = {
            let table = self.table.write();

            let infos: Vec<BufferInfo> = table.records.values().map(|r| r.info()).collect();
            let stats = CacheStatistics::from_infos(&infos);
            let victims = table.policy.decide(&infos, &stats);
            if victims.is_empty() {
                return 0;
            }

            let mut pending = Vec::with_capacity(victims.len());
            for id in victims {
                let Some(record) = table.records.get(&id) else {
                    continue;
                };
                match self.begin_dump(record) {
                    Ok(Some(dump)) => pending.push(dump),
                    Ok(None) => {}
                    Err(_) => {
                        self.stats.evictions_skipped.fetch_add(1, Ordering::Relaxed);
                        debug!(%id, "skipping locked eviction victim");
                    }
                }
            }
            (table.policy.name().to_string(), pending)
        };

        if pending.is_empty() {
            return 0;
        }
        let written = self.write_dumps(pending);

        let _table = self.table.write();
        let mut dumped = 0;
        for (pending, result) in written {
            let id = pending.record.id();
            match self.finish_dump(pending, result) {
                Ok(true) => dumped += 1,
                Ok(false) => {}
                Err(e) => {
                    self.stats.evictions_failed.fetch_add(1, Ordering::Relaxed);
                    warn!(%id, error = %e, "automatic dump failed");
                }
            }
        }

        debug!(%policy, dumped, "eviction finished");
        dumped
    }

    // ========================================================================
    // Public API: Queries
    // ========================================================================

    pub fn contains(&self, id: BufferId) -> bool {
        self.table.read().records.contains_key(&id)
    }

    pub fn is_dumped(&self, id: BufferId) -> Result<bool> {
        self.with_record(id, |record| record.is_dumped())
    }

    pub fn lock_count(&self, id: BufferId) -> Result<u32> {
        self.with_record(id, |record| record.lock_count())
    }

    pub fn buffer_info(&self, id: BufferId) -> Result<BufferInfo> {
        self.with_record(id, |record| record.info())
    }

    /// Every registered buffer, ordered by id.
    pub fn list_buffers(&self) -> Vec<BufferInfo> {
        let mut infos: Vec<BufferInfo> = self
            .table
            .read()
            .records
            .values()
            .map(|record| record.info())
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Number of registered buffers.
    pub fn buffer_count(&self) -> usize {
        self.table.read().records.len()
    }

    /// Managed and dumped byte totals, recomputed from the records.
    pub fn compute_statistics(&self) -> CacheStatistics {
        let table = self.table.read();
        let infos: Vec<BufferInfo> = table.records.values().map(|r| r.info()).collect();
        CacheStatistics::from_infos(&infos)
    }

    /// Cumulative counters.
    pub fn stats(&self) -> &ManagerStats {
        &self.stats
    }

    pub fn temp_store(&self) -> &TempStore {
        &self.temp_store
    }

    /// Path of a dumped buffer's file, if it is dumped.
    pub fn dump_path(&self, id: BufferId) -> Result<Option<PathBuf>> {
        let record = self.record(id)?;
        let slot = record.slot().read_recursive();
        Ok(match &*slot {
            Slot::Dumped(dump) => Some(dump.path().to_path_buf()),
            _ => None,
        })
    }

    // ========================================================================
    // Public API: Policy
    // ========================================================================

    /// Install a new policy. In-flight decisions finish with the old one.
    pub fn set_policy(&self, policy: Box<dyn EvictionPolicy>) {
        let mut table = self.table.write();
        info!(from = table.policy.name(), to = policy.name(), "switching eviction policy");
        table.policy = policy;
    }

    /// Install a fresh policy from the registry.
    ///
    /// # Errors
    /// `CacheError::UnknownPolicy` if nothing is registered under `name`.
    pub fn set_active_policy(&self, name: &str) -> Result<()> {
        let policy = self.registry.read().create(name)?;
        self.set_policy(policy);
        Ok(())
    }

    /// Run `f` against the active policy.
    pub fn with_policy<R>(&self, f: impl FnOnce(&dyn EvictionPolicy) -> R) -> R {
        let table = self.table.read();
        f(table.policy.as_ref())
    }

    pub fn active_policy_name(&self) -> String {
        self.with_policy(|policy| policy.name().to_string())
    }

    pub fn list_policy_names(&self) -> Vec<String> {
        self.registry.read().names()
    }

    /// Make a custom policy available to [`set_active_policy`](Self::set_active_policy).
    pub fn register_policy_factory<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn EvictionPolicy> + Send + Sync + 'static,
    {
        self.registry.write().register(name, factory);
    }

    /// Parameter names of the active policy.
    pub fn param_names(&self) -> Vec<String> {
        self.with_policy(|policy| {
            policy
                .param_names()
                .iter()
                .map(|name| name.to_string())
                .collect()
        })
    }

    pub fn get_param(&self, name: &str) -> Result<String> {
        self.with_policy(|policy| policy.get_param(name))
    }

    pub fn set_param(&self, name: &str, value: &str) -> Result<()> {
        let mut table = self.table.write();
        table.policy.set_param(name, value)?;
        info!(policy = table.policy.name(), name, value, "policy parameter set");
        Ok(())
    }

    // ========================================================================
    // Public API: Notifications and settings
    // ========================================================================

    /// Receive registry and residency events from now on.
    pub fn subscribe(&self) -> Receiver<CacheEvent> {
        self.channel.subscribe()
    }

    pub fn auto_evict(&self) -> bool {
        self.auto_evict.load(Ordering::Relaxed)
    }

    pub fn set_auto_evict(&self, enabled: bool) {
        self.auto_evict.store(enabled, Ordering::Relaxed);
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// The record for `id`, detached from the table lock.
    ///
    /// Use this before touching the slot of a buffer that may be pinned.
    pub(crate) fn record(&self, id: BufferId) -> Result<Arc<BufferRecord>> {
        self.table
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or(CacheError::UnknownBuffer(id))
    }

    /// Run `f` on a record under the shared table lock.
    ///
    /// `f` must not take the record's slot lock.
    pub(crate) fn with_record<R>(
        &self,
        id: BufferId,
        f: impl FnOnce(&BufferRecord) -> R,
    ) -> Result<R> {
        let table = self.table.read();
        table
            .records
            .get(&id)
            .map(|record| f(record))
            .ok_or(CacheError::UnknownBuffer(id))
    }

    fn insert(&self, bytes: AlignedBytes) -> BufferId {
        let id = BufferId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let size = bytes.len();
        let record = Arc::new(BufferRecord::new(id, bytes, self.clock.tick()));

        {
            let mut table = self.table.write();
            table.records.insert(id, record);
            self.channel.publish(CacheEvent::Registry {
                id,
                change: RegistryChange::Registered,
                size,
            });
        }
        debug!(%id, size, "registered buffer");

        self.maybe_evict();
        id
    }

    fn maybe_evict(&self) {
        if self.auto_evict() {
            self.trigger_eviction();
        }
    }

    /// Pin a resident record. Caller holds the table lock.
    fn pin(&self, record: &Arc<BufferRecord>) -> ScopedLock {
        record.pin();
        record.touch(self.clock.tick());
        ScopedLock::new(Arc::clone(record))
    }

    /// Take an unlocked record's bytes for dumping. Caller holds the table
    /// write lock.
    ///
    /// Returns `None` if the record is already dumped or a dump of it is in
    /// flight.
    fn begin_dump(&self, record: &Arc<BufferRecord>) -> Result<Option<PendingDump>> {
        if record.is_dumped() {
            return Ok(None);
        }
        if record.is_locked() {
            return Err(CacheError::BufferLocked(record.id()));
        }

        let Some(transfer) = record.try_transfer() else {
            return Ok(None);
        };
        Ok(record.take_for_dump().map(|bytes| PendingDump {
            record: Arc::clone(record),
            bytes,
            _transfer: transfer,
        }))
    }

    /// Write the files of `pending` dumps. No table lock is held.
    fn write_dumps(&self, pending: Vec<PendingDump>) -> Vec<(PendingDump, Result<DumpFile>)> {
        pending
            .into_iter()
            .map(|dump| {
                let written = DumpFile::write(&self.temp_store, dump.bytes.as_slice());
                (dump, written)
            })
            .collect()
    }

    /// Install a written dump, or hand the bytes back if writing failed.
    /// Caller holds the table write lock.
    ///
    /// Returns `false` if the buffer was unregistered or reallocated while
    /// the file was written; the file is then deleted.
    fn finish_dump(&self, pending: PendingDump, written: Result<DumpFile>) -> Result<bool> {
        let PendingDump { record, bytes, .. } = pending;
        let id = record.id();

        if !record.is_dumping() {
            debug!(%id, "buffer replaced during dump, discarding file");
            return Ok(false);
        }

        let dump = match written {
            Ok(dump) => dump,
            Err(e) => {
                record.install(Slot::Resident(bytes));
                return Err(e);
            }
        };

        let size = dump.len();
        debug!(%id, size, path = %dump.path().display(), "dumped buffer");
        record.install(Slot::Dumped(dump));
        self.stats.record_dump(size);
        self.channel.publish(CacheEvent::Residency {
            id,
            residency: Residency::Dumped,
            size,
        });
        Ok(true)
    }

    /// Restore a record, reading the file outside the table lock.
    ///
    /// With `pin`, the record is pinned before the table lock is released
    /// so the returned lock always sees it resident. Returns `None` only
    /// when not pinning.
    fn restore_internal(&self, id: BufferId, pin: bool) -> Result<Option<ScopedLock>> {
        loop {
            let record = {
                let table = self.table.read();
                let record = table
                    .records
                    .get(&id)
                    .ok_or(CacheError::UnknownBuffer(id))?;
                if record.is_resident() {
                    return Ok(pin.then(|| self.pin(record)));
                }
                Arc::clone(record)
            };

            if record.is_dumping() {
                record.wait_for_transfer();
                continue;
            }

            let read = {
                let slot = record.slot().read();
                match &*slot {
                    Slot::Dumped(dump) => Some((dump.read_back()?, dump.path().to_path_buf())),
                    Slot::Released => return Err(CacheError::UnknownBuffer(id)),
                    Slot::Resident(_) | Slot::Dumping => None,
                }
            };
            let Some((bytes, path)) = read else {
                continue;
            };

            let table = self.table.write();
            let current = match table.records.get(&id) {
                Some(current) if Arc::ptr_eq(current, &record) => current,
                Some(_) => continue,
                None => return Err(CacheError::UnknownBuffer(id)),
            };

            // Someone else restored or re-dumped it while we were reading.
            // Only a dumped record's slot is safe to take here.
            let unchanged = current.is_dumped()
                && matches!(
                    &*current.slot().read(),
                    Slot::Dumped(dump) if dump.path() == path.as_path()
                );
            if !unchanged {
                continue;
            }

            let size = bytes.len();
            current.install(Slot::Resident(bytes));
            self.stats.record_restore(size);
            self.channel.publish(CacheEvent::Residency {
                id,
                residency: Residency::Resident,
                size,
            });
            debug!(%id, size, "restored buffer");

            if pin {
                return Ok(Some(self.pin(current)));
            }
            current.touch(self.clock.tick());
            return Ok(None);
        }
    }
}

impl Default for BufferManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BufferManager {
    fn drop(&mut self) {
        let table = self.table.get_mut();
        let count = table.records.len();
        for (_, record) in table.records.drain() {
            record.install(Slot::Released);
        }
        debug!(count, "buffer manager released all buffers");
    }
}

impl std::fmt::Debug for BufferManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.read();
        f.debug_struct("BufferManager")
            .field("buffers", &table.records.len())
            .field("policy", &table.policy.name())
            .field("auto_evict", &self.auto_evict())
            .finish()
    }
}
