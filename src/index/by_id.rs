//! Identifier-keyed working-set index.
//!
//! Indexes externally-owned entities by their numeric identifier, using the
//! id directly as a dense array position. Lookup, incremental add, and
//! incremental remove are all O(1) with no hashing on the lookup path; a
//! compact active-id list keeps full iteration proportional to the live
//! count rather than the table width.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     IdIndexCore<T> Layout                           │
//! │                                                                     │
//! │   DenseTable<Weak<T>>                                               │
//! │                                                                     │
//! │   table:  [None] [e1] [e2] [None] [None] [e5]     slot per id       │
//! │   active: [1, 5, 2]                               gap-free          │
//! │   id→pos: {1→0, 5→1, 2→2}                         swap-pop support  │
//! │                                                                     │
//! │   The index stores Weak handles; the owner keeps the Arcs.          │
//! │   A destroyed-but-not-removed entity is skipped by reads.           │
//! └─────────────────────────────────────────────────────────────────────┘
//!
//! Rebuild Flow
//! ────────────
//!
//!   rebuild(snapshot):
//!     1. Build a fresh table from the snapshot (outside any lock)
//!     2. Swap it in whole (under the write lock, in the concurrent form)
//!
//! Incremental Flow
//! ────────────────
//!
//!   add(e):    no-op if e.id present, else grow table / store / append
//!   remove(e): no-op if e.id absent, else swap-pop the active list and
//!              clear the table slot
//! ```
//!
//! ## Operations
//!
//! | Operation    | Time   | Lock (concurrent form)                     |
//! |--------------|--------|--------------------------------------------|
//! | `get`        | O(1)   | shared                                     |
//! | `add`        | O(1)*  | exclusive (*amortized, table growth)       |
//! | `remove`     | O(1)   | exclusive                                  |
//! | `rebuild`    | O(n)   | exclusive for the swap only                |
//! | `snapshot`   | O(n)   | shared                                     |
//! | `for_each`   | O(max id) | shared, held across visitor calls       |
//!
//! ## Iteration Orders
//!
//! `snapshot` walks the active-id list (insertion order as disturbed by
//! swap-pop removals); `for_each` walks the table (ascending id). The two
//! orders differ; callers that need a specific order must pick the matching
//! operation.
//!
//! ## Duplicate Identifiers
//!
//! `rebuild` trusts the snapshot: a duplicate id silently wins the table
//! slot last-write (while the active list keeps the earlier entry), leaving
//! `len()` over-counting. `add` has the opposite policy and ignores a
//! duplicate entirely. Callers that cannot guarantee uniqueness should use
//! `try_rebuild`, which rejects such snapshots, or audit with
//! `check_invariants`.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use indexkit::index::ConcurrentIdIndex;
//!
//! // The owner holds the Arcs; the index holds weak handles
//! let owned: Vec<Arc<u64>> = vec![Arc::new(1), Arc::new(5), Arc::new(2)];
//!
//! let index: ConcurrentIdIndex<u64> = ConcurrentIdIndex::new();
//! index.rebuild(&owned);
//!
//! assert_eq!(index.len(), 3);
//! assert_eq!(index.get(5).as_deref(), Some(&5));
//!
//! index.remove(&owned[1]);
//! assert_eq!(index.len(), 2);
//! assert_eq!(index.get(5), None);
//! ```
//!
//! ## Thread Safety
//!
//! - [`IdIndexCore`]: not thread-safe, `&mut self` mutation.
//! - [`ConcurrentIdIndex`]: one `parking_lot::RwLock` around the core.
//!   Mutators exclude everything; readers run concurrently. `for_each`
//!   holds the read lock across visitor calls, so the visitor must not
//!   re-enter the same instance (the lock is not re-entrant); prefer
//!   `snapshot` + iterate when the visitor needs the index back.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::ds::DenseTable;
use crate::error::{InvariantError, SnapshotError};
use crate::stats::{IndexStats, StatsRecorder};
use crate::traits::{ConcurrentIndex, CoreIndex, EntityId, IdIndex, Identified};

/// Single-threaded identifier index core.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use indexkit::index::IdIndexCore;
///
/// let mut index = IdIndexCore::new();
/// let entity = Arc::new(9u64);
///
/// assert!(index.add(&entity));
/// assert!(!index.add(&entity)); // duplicate id, silent no-op
/// assert_eq!(index.get(9).as_deref(), Some(&9));
/// ```
#[derive(Debug)]
pub struct IdIndexCore<T> {
    table: DenseTable<Weak<T>>,
}

impl<T> IdIndexCore<T> {
    pub fn new() -> Self {
        Self {
            table: DenseTable::new(),
        }
    }

    /// Pre-sizes the active list and position map for roughly `capacity`
    /// entities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: DenseTable::with_capacity(capacity),
        }
    }

    /// O(1) lookup by identifier.
    ///
    /// Returns `None` if the id is not indexed or its entity has been
    /// destroyed since it was added.
    #[inline]
    pub fn get(&self, id: EntityId) -> Option<Arc<T>> {
        self.table.get(id).and_then(|weak| weak.upgrade())
    }

    /// Index membership by identifier. A destroyed-but-not-removed entity
    /// still counts as a member; use [`get`](Self::get) for liveness.
    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.table.contains(id)
    }

    /// Removes by identifier alone. Returns `false` if the id is absent.
    pub fn remove_id(&mut self, id: EntityId) -> bool {
        self.table.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Count of active identifiers.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Copies out all live references in active-id order.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.table
            .iter_active()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect()
    }

    /// Visits every live reference in table order (ascending id).
    ///
    /// Note the order difference from [`snapshot`](Self::snapshot).
    pub fn for_each<V: FnMut(&Arc<T>)>(&self, mut visitor: V) {
        for weak in self.table.iter_slots() {
            if let Some(entity) = weak.upgrade() {
                visitor(&entity);
            }
        }
    }

    /// The compact active-identifier list.
    #[inline]
    pub fn active_ids(&self) -> &[EntityId] {
        self.table.active_ids()
    }

    /// Current dense-table width (highest seen id + 1).
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.table.slot_count()
    }

    /// Validates the table / active-list / position-map triple.
    ///
    /// Reports the stale-duplicate state a permissive rebuild fed
    /// duplicate identifiers leaves behind. Never called implicitly.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.table.check_invariants()
    }
}

impl<T: Identified> IdIndexCore<T> {
    /// Builds an index from a full snapshot.
    ///
    /// Trusts the snapshot to contain unique identifiers: a duplicate id
    /// wins the table slot last-write while the active list keeps the
    /// earlier entry, so `len()` over-counts until the next duplicate-free
    /// rebuild. Use [`try_from_snapshot`](Self::try_from_snapshot) to
    /// reject such input instead.
    pub fn from_snapshot(entities: &[Arc<T>]) -> Self {
        let mut table = DenseTable::with_capacity(entities.len());
        for entity in entities {
            table.push_unchecked(entity.entity_id(), Arc::downgrade(entity));
        }
        Self { table }
    }

    /// Strict snapshot build: rejects duplicate identifiers.
    pub fn try_from_snapshot(entities: &[Arc<T>]) -> Result<Self, SnapshotError> {
        let mut table = DenseTable::with_capacity(entities.len());
        for entity in entities {
            let id = entity.entity_id();
            if !table.insert(id, Arc::downgrade(entity)) {
                return Err(SnapshotError::new(format!(
                    "duplicate identifier {} in rebuild snapshot",
                    id
                )));
            }
        }
        Ok(Self { table })
    }

    /// Replaces the whole index from a full snapshot (permissive form).
    pub fn rebuild(&mut self, entities: &[Arc<T>]) {
        *self = Self::from_snapshot(entities);
    }

    /// Strict rebuild: on duplicate identifiers the existing state is left
    /// untouched and an error is returned.
    pub fn try_rebuild(&mut self, entities: &[Arc<T>]) -> Result<(), SnapshotError> {
        *self = Self::try_from_snapshot(entities)?;
        Ok(())
    }

    /// Adds one entity. Returns `false` (and changes nothing) if the
    /// identifier is already present — the opposite policy from `rebuild`,
    /// where a later duplicate wins.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use indexkit::index::IdIndexCore;
    ///
    /// let mut index = IdIndexCore::new();
    /// let first = Arc::new(4u64);
    /// let impostor = Arc::new(4u64);
    ///
    /// assert!(index.add(&first));
    /// assert!(!index.add(&impostor));
    /// assert!(Arc::ptr_eq(&index.get(4).unwrap(), &first));
    /// ```
    pub fn add(&mut self, entity: &Arc<T>) -> bool {
        self.table
            .insert(entity.entity_id(), Arc::downgrade(entity))
    }

    /// Removes one entity by its identifier. Returns `false` if absent.
    pub fn remove(&mut self, entity: &Arc<T>) -> bool {
        self.remove_id(entity.entity_id())
    }
}

impl<T> Default for IdIndexCore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identified> CoreIndex<T> for IdIndexCore<T> {
    fn rebuild(&mut self, entities: &[Arc<T>]) {
        IdIndexCore::rebuild(self, entities);
    }

    fn add(&mut self, entity: &Arc<T>) -> bool {
        IdIndexCore::add(self, entity)
    }

    fn remove(&mut self, entity: &Arc<T>) -> bool {
        IdIndexCore::remove(self, entity)
    }

    fn clear(&mut self) {
        IdIndexCore::clear(self);
    }

    fn len(&self) -> usize {
        IdIndexCore::len(self)
    }

    fn snapshot(&self) -> Vec<Arc<T>> {
        IdIndexCore::snapshot(self)
    }

    fn for_each<V: FnMut(&Arc<T>)>(&self, visitor: V) {
        IdIndexCore::for_each(self, visitor);
    }
}

impl<T: Identified> IdIndex<T> for IdIndexCore<T> {
    fn get(&self, id: EntityId) -> Option<Arc<T>> {
        IdIndexCore::get(self, id)
    }

    fn contains(&self, id: EntityId) -> bool {
        IdIndexCore::contains(self, id)
    }

    fn remove_id(&mut self, id: EntityId) -> bool {
        IdIndexCore::remove_id(self, id)
    }

    fn active_ids(&self) -> &[EntityId] {
        IdIndexCore::active_ids(self)
    }

    fn slot_count(&self) -> usize {
        IdIndexCore::slot_count(self)
    }
}

/// Thread-safe identifier index: [`IdIndexCore`] behind one
/// `parking_lot::RwLock`, plus mutation counters.
///
/// Mutators (`rebuild`, `add`, `remove`, `remove_id`, `clear`) take the
/// write lock; readers (`len`, `get`, `contains`, `snapshot`,
/// `active_ids`, `for_each`) take the read lock and run concurrently.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use indexkit::index::ConcurrentIdIndex;
///
/// let index: Arc<ConcurrentIdIndex<u64>> = Arc::new(ConcurrentIdIndex::new());
/// let entity = Arc::new(1u64);
/// index.add(&entity);
///
/// let reader = {
///     let index = index.clone();
///     thread::spawn(move || index.len())
/// };
/// assert_eq!(reader.join().unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct ConcurrentIdIndex<T> {
    inner: RwLock<IdIndexCore<T>>,
    stats: StatsRecorder,
}

impl<T> ConcurrentIdIndex<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(IdIndexCore::new()),
            stats: StatsRecorder::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(IdIndexCore::with_capacity(capacity)),
            stats: StatsRecorder::new(),
        }
    }

    /// O(1) lookup under the shared lock.
    pub fn get(&self, id: EntityId) -> Option<Arc<T>> {
        self.inner.read().get(id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.inner.read().contains(id)
    }

    /// Removes by identifier alone. Returns `false` if absent.
    pub fn remove_id(&self, id: EntityId) -> bool {
        let removed = self.inner.write().remove_id(id);
        if removed {
            self.stats.record_remove();
        } else {
            self.stats.record_missed_remove();
        }
        removed
    }

    pub fn clear(&self) {
        self.inner.write().clear();
        self.stats.record_clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Copies out all live references in active-id order.
    ///
    /// The copy is taken under one shared-lock acquisition, so it is a
    /// consistent cut, and it stays valid after the lock is released.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.inner.read().snapshot()
    }

    /// Visits every live reference in table order, holding the read lock
    /// across all visitor calls.
    ///
    /// The visitor must not call back into this instance: the lock is not
    /// re-entrant and a mutating re-entry would deadlock rather than fail
    /// fast. Use [`snapshot`](Self::snapshot) and iterate the copy when
    /// the visitor needs the index back.
    pub fn for_each<V: FnMut(&Arc<T>)>(&self, visitor: V) {
        self.inner.read().for_each(visitor);
    }

    /// Owned copy of the active-identifier list.
    pub fn active_ids(&self) -> Vec<EntityId> {
        self.inner.read().active_ids().to_vec()
    }

    /// Runs `f` over the active-identifier list under the shared lock,
    /// without copying.
    ///
    /// Same re-entrancy obligation as [`for_each`](Self::for_each).
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use indexkit::index::ConcurrentIdIndex;
    ///
    /// let index: ConcurrentIdIndex<u64> = ConcurrentIdIndex::new();
    /// index.add(&Arc::new(3u64));
    /// index.add(&Arc::new(8u64));
    ///
    /// let sum: u64 = index.with_active_ids(|ids| ids.iter().sum());
    /// assert_eq!(sum, 11);
    /// ```
    pub fn with_active_ids<R>(&self, f: impl FnOnce(&[EntityId]) -> R) -> R {
        let core = self.inner.read();
        f(core.active_ids())
    }

    pub fn slot_count(&self) -> usize {
        self.inner.read().slot_count()
    }

    /// Snapshot of the mutation counters.
    pub fn stats(&self) -> IndexStats {
        self.stats.snapshot()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.read().check_invariants()
    }
}

impl<T: Identified> ConcurrentIdIndex<T> {
    /// Replaces the whole index from a full snapshot.
    ///
    /// The fresh table is built before the write lock is taken; the
    /// exclusive section is just the swap, so readers observe either the
    /// old generation or the new one, never a mix.
    pub fn rebuild(&self, entities: &[Arc<T>]) {
        let fresh = IdIndexCore::from_snapshot(entities);
        *self.inner.write() = fresh;
        self.stats.record_rebuild();
    }

    /// Strict rebuild: rejects snapshots with duplicate identifiers,
    /// leaving the current state untouched.
    pub fn try_rebuild(&self, entities: &[Arc<T>]) -> Result<(), SnapshotError> {
        let fresh = IdIndexCore::try_from_snapshot(entities)?;
        *self.inner.write() = fresh;
        self.stats.record_rebuild();
        Ok(())
    }

    /// Adds one entity. `false` if the identifier was already present.
    pub fn add(&self, entity: &Arc<T>) -> bool {
        let added = self.inner.write().add(entity);
        if added {
            self.stats.record_add();
        } else {
            self.stats.record_duplicate_add();
        }
        added
    }

    /// Removes one entity by its identifier. `false` if absent.
    pub fn remove(&self, entity: &Arc<T>) -> bool {
        self.remove_id(entity.entity_id())
    }
}

impl<T> Default for ConcurrentIdIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> ConcurrentIndex for ConcurrentIdIndex<T> {}
