//! # Index Trait Hierarchy
//!
//! This module defines the trait hierarchy for the working-set index
//! subsystem, providing a unified interface for the two indexing strategies
//! (dense identifier table, category buckets) while keeping mode-specific
//! operation sets out of reach of the wrong strategy.
//!
//! ## Architecture
//!
//! ```text
//!                      ┌─────────────────────────────────────────┐
//!                      │            CoreIndex<T>                 │
//!                      │                                         │
//!                      │  rebuild(&mut, &[Arc<T>])               │
//!                      │  add(&mut, &Arc<T>) → bool              │
//!                      │  remove(&mut, &Arc<T>) → bool           │
//!                      │  clear(&mut)                            │
//!                      │  len(&) → usize                         │
//!                      │  is_empty(&) → bool                     │
//!                      │  snapshot(&) → Vec<Arc<T>>              │
//!                      │  for_each(&, visitor)                   │
//!                      └──────────────────┬──────────────────────┘
//!                                         │
//!                    ┌────────────────────┴────────────────────┐
//!                    │                                         │
//!                    ▼                                         ▼
//!   ┌────────────────────────────────┐       ┌─────────────────────────────────┐
//!   │        IdIndex<T>              │       │      CategoryIndex<T, C>        │
//!   │                                │       │                                 │
//!   │  get(id) → Option<Arc<T>>      │       │  categories(&) → &[C]           │
//!   │  contains(id) → bool           │       │  bucket_len(&C) → usize         │
//!   │  remove_id(&mut, id) → bool    │       │  for_each_category(&C, visitor) │
//!   │  active_ids(&) → &[EntityId]   │       │                                 │
//!   │  slot_count(&) → usize         │       │  ⚠ O(bucket) removal!           │
//!   │                                │       └─────────────────────────────────┘
//!   │  O(1) removal via swap-pop     │
//!   └────────────────────────────────┘
//! ```
//!
//! ## Trait Design
//!
//! - `CoreIndex`: the operation set both strategies share. An index holds
//!   non-owning [`Weak`](std::sync::Weak) references to externally-owned
//!   entities; mutation entry points take `&Arc<T>` so the index can derive
//!   the weak handle (and, in id mode, the identifier).
//! - `IdIndex` / `CategoryIndex`: strategy-specific extensions. A type
//!   implements exactly one of the two, so wrong-mode calls on the typed
//!   cores fail at compile time. The runtime-moded
//!   [`EntityIndex`](crate::builder::EntityIndex) wrapper signals
//!   [`ModeError`](crate::error::ModeError) instead.
//! - `ConcurrentIndex`: `Send + Sync` marker implemented by the lock-guarded
//!   wrappers ([`ConcurrentIdIndex`](crate::index::ConcurrentIdIndex),
//!   [`ConcurrentCategoryIndex`](crate::index::ConcurrentCategoryIndex)).
//!
//! The single-threaded cores take `&mut self` for mutation; the concurrent
//! wrappers expose the same surface through `&self` behind one
//! `parking_lot::RwLock` per instance.
//!
//! ## Strategy Comparison
//!
//! | Strategy | Keyed by            | remove   | Best For                     |
//! |----------|---------------------|----------|------------------------------|
//! | Id       | dense numeric id    | O(1)     | id-addressed working sets    |
//! | Category | classification value| O(bucket)| per-group iteration          |

use std::sync::Arc;

/// Numeric entity identifier used as a dense table position.
///
/// Identifiers are assumed small relative to the active set size: the id
/// table costs O(max id) slots, not O(count). Pathologically sparse id
/// spaces waste memory.
pub type EntityId = u64;

/// Entities that expose a numeric identifier.
///
/// Required by the identifier-indexing strategy, which uses the id directly
/// as an array position. The id must be stable for the lifetime of the
/// entity's membership in an index.
///
/// # Example
///
/// ```
/// use indexkit::traits::{EntityId, Identified};
///
/// struct Unit {
///     id: u64,
///     hp: u32,
/// }
///
/// impl Identified for Unit {
///     fn entity_id(&self) -> EntityId {
///         self.id
///     }
/// }
///
/// let unit = Unit { id: 7, hp: 100 };
/// assert_eq!(unit.entity_id(), 7);
/// ```
pub trait Identified {
    /// Returns the entity's numeric identifier.
    fn entity_id(&self) -> EntityId;
}

// Integer entities are their own identifier. Mainly for tests and examples.
impl Identified for u64 {
    #[inline]
    fn entity_id(&self) -> EntityId {
        *self
    }
}

impl Identified for u32 {
    #[inline]
    fn entity_id(&self) -> EntityId {
        u64::from(*self)
    }
}

impl Identified for usize {
    #[inline]
    fn entity_id(&self) -> EntityId {
        *self as EntityId
    }
}

/// Core operations both indexing strategies support.
///
/// An index stores non-owning references to externally-owned entities. The
/// caller owns entity lifetimes: destroy-without-remove is caught (the dead
/// reference is skipped by reads), but callers should remove before
/// destroying to keep `len()` meaningful.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use indexkit::index::IdIndexCore;
/// use indexkit::traits::CoreIndex;
///
/// fn repopulate<T, I: CoreIndex<T>>(index: &mut I, entities: &[Arc<T>]) {
///     index.rebuild(entities);
/// }
///
/// let mut index: IdIndexCore<u64> = IdIndexCore::new();
/// let entities: Vec<Arc<u64>> = (0..4u64).map(Arc::new).collect();
/// repopulate(&mut index, &entities);
/// assert_eq!(index.len(), 4);
/// ```
pub trait CoreIndex<T> {
    /// Replaces the entire index state from a full snapshot of the working
    /// set.
    fn rebuild(&mut self, entities: &[Arc<T>]);

    /// Adds a single entity. Returns `false` if the strategy treats the call
    /// as a no-op (id mode: identifier already present).
    fn add(&mut self, entity: &Arc<T>) -> bool;

    /// Removes a single entity. Returns `false` if nothing was removed.
    fn remove(&mut self, entity: &Arc<T>) -> bool;

    /// Empties the index. Referenced entities are untouched.
    fn clear(&mut self);

    /// Number of indexed entries.
    fn len(&self) -> usize;

    /// Returns `true` if the index holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies out all live references, in the strategy's snapshot order.
    ///
    /// The copy is safe to use after any surrounding lock is released.
    /// References whose entity has been destroyed are skipped.
    fn snapshot(&self) -> Vec<Arc<T>>;

    /// Visits every live reference, in the strategy's iteration order.
    fn for_each<V: FnMut(&Arc<T>)>(&self, visitor: V);
}

/// Identifier-strategy operations (dense table, O(1) everything).
///
/// Note that iteration order differs between [`CoreIndex::snapshot`]
/// (active-id order, i.e. insertion order disturbed by swap-pop removals)
/// and [`CoreIndex::for_each`] (table order, i.e. ascending identifier).
pub trait IdIndex<T>: CoreIndex<T> {
    /// O(1) lookup by identifier. `None` if the id is not indexed or its
    /// entity has been destroyed.
    fn get(&self, id: EntityId) -> Option<Arc<T>>;

    /// Returns `true` if the identifier is indexed. Membership, not
    /// liveness: a destroyed-but-not-removed entity still counts.
    fn contains(&self, id: EntityId) -> bool;

    /// Removes by identifier alone. Returns `false` if absent.
    fn remove_id(&mut self, id: EntityId) -> bool;

    /// The compact active-identifier list, gap-free, in snapshot order.
    fn active_ids(&self) -> &[EntityId];

    /// Current width of the dense table (highest seen id + 1).
    fn slot_count(&self) -> usize;
}

/// Category-strategy operations (buckets keyed by classification value).
///
/// Removal is O(bucket size): bucket-local positions are deliberately not
/// tracked, so `remove` linearly scans the one bucket the entity classifies
/// into.
pub trait CategoryIndex<T, C>: CoreIndex<T> {
    /// Distinct categories seen, in discovery order.
    fn categories(&self) -> &[C];

    /// Number of references in one category's bucket (0 if unknown).
    fn bucket_len(&self, category: &C) -> usize;

    /// Visits every live reference in one category's bucket.
    fn for_each_category<V: FnMut(&Arc<T>)>(&self, category: &C, visitor: V);
}

/// Marker trait for index types that are safe to share between threads.
///
/// Implemented by the lock-guarded concurrent wrappers. Use as a bound when
/// generic code must be handed a thread-safe index:
///
/// ```
/// use indexkit::traits::ConcurrentIndex;
///
/// fn spawn_readers<I: ConcurrentIndex>(_index: &I) {
///     // safe to share across threads
/// }
/// ```
pub trait ConcurrentIndex: Send + Sync {}
