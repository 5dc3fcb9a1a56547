//! Category-keyed working-set index.
//!
//! Partitions externally-owned entities into buckets by a classification
//! value computed from each entity by a categorizer supplied at
//! construction. Designed for per-group iteration: finding one category's
//! members costs one hash lookup and a slice walk, and the category list
//! keeps a stable discovery order so repeated sweeps see groups in the
//! same sequence.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  CategoryIndexCore<T, C, F> Layout                  │
//! │                                                                     │
//! │   categorizer: F                Fn(&T) -> C, fixed at construction  │
//! │                                                                     │
//! │   CategoryBuckets<C, Weak<T>>                                       │
//! │     categories: [red, blue]            discovery order              │
//! │     cat→pos:    {red→0, blue→1}        one hash per mutation        │
//! │     buckets:    [[e1, e3], [e2]]       Weak handles per group       │
//! │                                                                     │
//! │   A reference lives in the bucket its category named at add time.   │
//! │   Reclassification without remove+add is NOT detected (drift).      │
//! └─────────────────────────────────────────────────────────────────────┘
//!
//! Remove Flow
//! ───────────
//!
//!   remove(e):
//!     1. Classify e to find its bucket (current classification!)
//!     2. Linear scan for the pointer-identical reference
//!     3. Swap-pop if found, silent no-op otherwise
//! ```
//!
//! ## Operations
//!
//! | Operation           | Time       | Lock (concurrent form)           |
//! |---------------------|------------|----------------------------------|
//! | `add`               | O(1)*      | exclusive (*amortized)           |
//! | `remove`            | O(bucket)  | exclusive — linear scan!         |
//! | `rebuild`           | O(n)       | exclusive for the swap only      |
//! | `snapshot`          | O(n)       | shared                           |
//! | `for_each_category` | O(bucket)  | shared for the copy only         |
//! | `for_each`          | O(n)       | shared, held across visitors     |
//!
//! Removal deliberately costs O(bucket size), unlike the identifier
//! strategy's O(1): bucket-local positions are not tracked.
//!
//! ## Category Drift
//!
//! The categorizer must be deterministic for a given entity state. If an
//! entity's classification changes while indexed, `remove` searches the
//! *new* category's bucket and misses; the reference stays in the bucket
//! computed when it was added. Remove-then-mutate-then-add, or rebuild.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use indexkit::index::ConcurrentCategoryIndex;
//!
//! // Partition integers by parity
//! let index = ConcurrentCategoryIndex::boxed(|v: &u64| v % 2);
//! let owned: Vec<Arc<u64>> = (0..6u64).map(Arc::new).collect();
//! index.rebuild(&owned);
//!
//! assert_eq!(index.len(), 6);
//! assert_eq!(index.bucket_len(&0), 3);
//!
//! let mut evens = Vec::new();
//! index.for_each_category(&0, |e| evens.push(**e));
//! assert_eq!(evens, vec![0, 2, 4]);
//! ```
//!
//! ## Thread Safety
//!
//! - [`CategoryIndexCore`]: not thread-safe, `&mut self` mutation.
//! - [`ConcurrentCategoryIndex`]: one `parking_lot::RwLock` around the
//!   core. `for_each_category` copies the bucket under the read lock and
//!   visits after releasing it, so its visitor may freely re-enter the
//!   index, mutating operations included. `for_each` is the direct form:
//!   it holds the read lock across visitor calls and the visitor must not
//!   re-enter.

use std::hash::Hash;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::ds::CategoryBuckets;
use crate::error::InvariantError;
use crate::stats::{IndexStats, StatsRecorder};
use crate::traits::{CategoryIndex, ConcurrentIndex, CoreIndex};

/// Single-threaded category index core.
///
/// Generic over the entity type `T`, the category value `C`, and the
/// categorizer `F`. Unlike the identifier strategy, no id is needed:
/// entities are located by classification plus pointer identity.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use indexkit::index::CategoryIndexCore;
///
/// let mut index = CategoryIndexCore::new(|v: &u64| v % 3);
/// let entity = Arc::new(7u64);
/// index.add(&entity);
///
/// assert_eq!(index.categories(), &[1]);
/// assert_eq!(index.bucket_len(&1), 1);
/// ```
#[derive(Debug)]
pub struct CategoryIndexCore<T, C, F> {
    /// Fixed classification function.
    categorizer: F,
    buckets: CategoryBuckets<C, Weak<T>>,
}

impl<T, C, F> CategoryIndexCore<T, C, F>
where
    C: Clone + Eq + Hash,
    F: Fn(&T) -> C,
{
    pub fn new(categorizer: F) -> Self {
        Self {
            categorizer,
            buckets: CategoryBuckets::new(),
        }
    }

    /// Applies the categorizer to one entity.
    #[inline]
    pub fn classify(&self, entity: &T) -> C {
        (self.categorizer)(entity)
    }

    /// Replaces the whole partition from a full snapshot.
    ///
    /// Classifies every entity, discovers the distinct categories, and
    /// pre-sizes each bucket to roughly `snapshot / categories` before
    /// filling.
    pub fn rebuild(&mut self, entities: &[Arc<T>]) {
        let pairs: Vec<(C, Weak<T>)> = entities
            .iter()
            .map(|entity| (self.classify(entity.as_ref()), Arc::downgrade(entity)))
            .collect();
        self.buckets = CategoryBuckets::from_pairs(pairs);
    }

    pub(crate) fn install(&mut self, buckets: CategoryBuckets<C, Weak<T>>) {
        self.buckets = buckets;
    }

    /// Appends one entity to its category's bucket, discovering the
    /// category if unseen. Never deduplicates: adding the same entity
    /// twice yields two bucket entries.
    pub fn add(&mut self, entity: &Arc<T>) {
        let category = self.classify(entity.as_ref());
        self.buckets.push(category, Arc::downgrade(entity));
    }

    /// Removes one entity: classifies it to find the bucket, then scans
    /// that bucket for the pointer-identical reference and swap-pops it.
    ///
    /// Returns `false` if the category is unknown or the reference is not
    /// in it — including the drift case, where the entity was added under
    /// a classification it no longer has.
    pub fn remove(&mut self, entity: &Arc<T>) -> bool {
        let category = self.classify(entity.as_ref());
        let target = Arc::downgrade(entity);
        self.buckets
            .remove_where(&category, |candidate| Weak::ptr_eq(candidate, &target))
            .is_some()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Total references across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Copies out all live references in bucket-discovery order.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.buckets.iter().filter_map(Weak::upgrade).collect()
    }

    /// Visits every live reference, bucket by bucket.
    pub fn for_each<V: FnMut(&Arc<T>)>(&self, mut visitor: V) {
        for weak in self.buckets.iter() {
            if let Some(entity) = weak.upgrade() {
                visitor(&entity);
            }
        }
    }

    /// Visits every live reference in one category's bucket, or nothing
    /// if the category is unknown.
    pub fn for_each_category<V: FnMut(&Arc<T>)>(&self, category: &C, mut visitor: V) {
        if let Some(bucket) = self.buckets.bucket(category) {
            for weak in bucket {
                if let Some(entity) = weak.upgrade() {
                    visitor(&entity);
                }
            }
        }
    }

    /// Distinct categories seen, in discovery order.
    #[inline]
    pub fn categories(&self) -> &[C] {
        self.buckets.categories()
    }

    #[inline]
    pub fn category_count(&self) -> usize {
        self.buckets.category_count()
    }

    /// One category's raw bucket (weak handles), or `None` if unknown.
    pub fn bucket(&self, category: &C) -> Option<&[Weak<T>]> {
        self.buckets.bucket(category)
    }

    /// Number of references in one category's bucket (0 if unknown).
    pub fn bucket_len(&self, category: &C) -> usize {
        self.buckets.bucket_len(category)
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.buckets.check_invariants()
    }
}

impl<T, C, F> CoreIndex<T> for CategoryIndexCore<T, C, F>
where
    C: Clone + Eq + Hash,
    F: Fn(&T) -> C,
{
    fn rebuild(&mut self, entities: &[Arc<T>]) {
        CategoryIndexCore::rebuild(self, entities);
    }

    fn add(&mut self, entity: &Arc<T>) -> bool {
        CategoryIndexCore::add(self, entity);
        true
    }

    fn remove(&mut self, entity: &Arc<T>) -> bool {
        CategoryIndexCore::remove(self, entity)
    }

    fn clear(&mut self) {
        CategoryIndexCore::clear(self);
    }

    fn len(&self) -> usize {
        CategoryIndexCore::len(self)
    }

    fn snapshot(&self) -> Vec<Arc<T>> {
        CategoryIndexCore::snapshot(self)
    }

    fn for_each<V: FnMut(&Arc<T>)>(&self, visitor: V) {
        CategoryIndexCore::for_each(self, visitor);
    }
}

impl<T, C, F> CategoryIndex<T, C> for CategoryIndexCore<T, C, F>
where
    C: Clone + Eq + Hash,
    F: Fn(&T) -> C,
{
    fn categories(&self) -> &[C] {
        CategoryIndexCore::categories(self)
    }

    fn bucket_len(&self, category: &C) -> usize {
        CategoryIndexCore::bucket_len(self, category)
    }

    fn for_each_category<V: FnMut(&Arc<T>)>(&self, category: &C, visitor: V) {
        CategoryIndexCore::for_each_category(self, category, visitor);
    }
}

/// Thread-safe category index: [`CategoryIndexCore`] behind one
/// `parking_lot::RwLock`, plus mutation counters.
///
/// The categorizer parameter defaults to a boxed function so the type is
/// nameable; use [`boxed`](ConcurrentCategoryIndex::boxed) to construct
/// that form from a closure, or [`new`](ConcurrentCategoryIndex::new) to
/// keep a concrete categorizer type.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use indexkit::index::ConcurrentCategoryIndex;
///
/// let index = ConcurrentCategoryIndex::boxed(|v: &u64| v % 2);
/// let odd = Arc::new(3u64);
/// index.add(&odd);
///
/// assert_eq!(index.categories(), vec![1]);
/// assert_eq!(index.len(), 1);
/// ```
#[derive(Debug)]
pub struct ConcurrentCategoryIndex<T, C, F = Box<dyn Fn(&T) -> C + Send + Sync>> {
    inner: RwLock<CategoryIndexCore<T, C, F>>,
    stats: StatsRecorder,
}

impl<T, C> ConcurrentCategoryIndex<T, C>
where
    C: Clone + Eq + Hash,
{
    /// Constructs the boxed-categorizer form from any closure.
    pub fn boxed(categorizer: impl Fn(&T) -> C + Send + Sync + 'static) -> Self {
        Self::new(Box::new(categorizer))
    }
}

impl<T, C, F> ConcurrentCategoryIndex<T, C, F>
where
    C: Clone + Eq + Hash,
    F: Fn(&T) -> C,
{
    pub fn new(categorizer: F) -> Self {
        Self {
            inner: RwLock::new(CategoryIndexCore::new(categorizer)),
            stats: StatsRecorder::new(),
        }
    }

    /// Replaces the whole partition from a full snapshot.
    ///
    /// Classification and bucket construction happen before the write
    /// lock is taken (classification runs under the read lock, which only
    /// blocks writers); the exclusive section is just the swap.
    pub fn rebuild(&self, entities: &[Arc<T>]) {
        let pairs: Vec<(C, Weak<T>)> = {
            let core = self.inner.read();
            entities
                .iter()
                .map(|entity| (core.classify(entity.as_ref()), Arc::downgrade(entity)))
                .collect()
        };
        let fresh = CategoryBuckets::from_pairs(pairs);
        self.inner.write().install(fresh);
        self.stats.record_rebuild();
    }

    /// Appends one entity to its category's bucket. Never deduplicates.
    pub fn add(&self, entity: &Arc<T>) {
        self.inner.write().add(entity);
        self.stats.record_add();
    }

    /// Removes one entity from the bucket its *current* classification
    /// names. `false` on a miss (absent, or drifted — see the module
    /// docs).
    pub fn remove(&self, entity: &Arc<T>) -> bool {
        let removed = self.inner.write().remove(entity);
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

    /// Copies out all live references in bucket-discovery order, under one
    /// shared-lock acquisition.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.inner.read().snapshot()
    }

    /// Visits every live reference, holding the read lock across all
    /// visitor calls.
    ///
    /// The visitor must not call back into this instance; the lock is not
    /// re-entrant. Use [`snapshot`](Self::snapshot) or
    /// [`for_each_category`](Self::for_each_category) when it needs to.
    pub fn for_each<V: FnMut(&Arc<T>)>(&self, visitor: V) {
        self.inner.read().for_each(visitor);
    }

    /// Visits every live reference in one category's bucket.
    ///
    /// The bucket is copied under the read lock and visited after the
    /// lock is released, so the visitor may re-enter this instance —
    /// mutating operations included — without deadlocking. Mutations made
    /// during the visit are not reflected in the copy being walked.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use indexkit::index::ConcurrentCategoryIndex;
    ///
    /// let index = ConcurrentCategoryIndex::boxed(|v: &u64| v % 2);
    /// let owned: Vec<Arc<u64>> = (0..4u64).map(Arc::new).collect();
    /// index.rebuild(&owned);
    ///
    /// // The visitor may mutate the index it is iterating
    /// let extra = Arc::new(6u64);
    /// index.for_each_category(&0, |_| {
    ///     index.add(&extra);
    /// });
    /// assert_eq!(index.len(), 6);
    /// ```
    pub fn for_each_category<V: FnMut(&Arc<T>)>(&self, category: &C, mut visitor: V) {
        let local: Vec<Weak<T>> = {
            let core = self.inner.read();
            core.bucket(category).map(|b| b.to_vec()).unwrap_or_default()
        };
        for weak in &local {
            if let Some(entity) = weak.upgrade() {
                visitor(&entity);
            }
        }
    }

    /// Owned copy of the category list, in discovery order.
    pub fn categories(&self) -> Vec<C> {
        self.inner.read().categories().to_vec()
    }

    pub fn category_count(&self) -> usize {
        self.inner.read().category_count()
    }

    pub fn bucket_len(&self, category: &C) -> usize {
        self.inner.read().bucket_len(category)
    }

    /// Snapshot of the mutation counters.
    pub fn stats(&self) -> IndexStats {
        self.stats.snapshot()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.read().check_invariants()
    }
}

impl<T, C, F> ConcurrentIndex for ConcurrentCategoryIndex<T, C, F>
where
    T: Send + Sync,
    C: Clone + Eq + Hash + Send + Sync,
    F: Fn(&T) -> C + Send + Sync,
{
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn rebuild_partitions_the_snapshot() {
        let owned: Vec<Arc<u64>> = (0..9u64).map(Arc::new).collect();
        let mut index = CategoryIndexCore::new(|v: &u64| v % 3);
        index.rebuild(&owned);

        assert_eq!(index.len(), 9);
        assert_eq!(index.categories(), &[0, 1, 2]);
        for category in 0..3u64 {
            assert_eq!(index.bucket_len(&category), 3);
        }
        assert!(index.check_invariants().is_ok());
    }

    #[test]
    fn add_discovers_categories_in_order() {
        let mut index = CategoryIndexCore::new(|v: &u64| v % 2);
        index.add(&Arc::new(3u64));
        index.add(&Arc::new(2u64));
        index.add(&Arc::new(5u64));

        // Odd was seen first, so it owns position 0
        assert_eq!(index.categories(), &[1, 0]);
        assert_eq!(index.bucket_len(&1), 2);
    }

    #[test]
    fn remove_matches_on_pointer_identity() {
        let mut index = CategoryIndexCore::new(|v: &u64| v % 2);
        let a = Arc::new(7u64);
        let twin = Arc::new(7u64); // equal payload, different allocation
        index.add(&a);
        index.add(&twin);

        assert!(index.remove(&a));
        assert_eq!(index.len(), 1);
        let survivor = &index.snapshot()[0];
        assert!(Arc::ptr_eq(survivor, &twin));

        // Removing again misses: the exact reference is gone
        assert!(!index.remove(&a));
    }

    #[test]
    fn remove_under_unknown_category_is_a_noop() {
        let mut index = CategoryIndexCore::new(|v: &u64| v % 2);
        index.add(&Arc::new(2u64));
        assert!(!index.remove(&Arc::new(3u64)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn drifted_entity_stays_in_its_old_bucket() {
        struct Tagged {
            team: Cell<u64>,
        }
        let mut index = CategoryIndexCore::new(|t: &Tagged| t.team.get());
        let entity = Arc::new(Tagged { team: Cell::new(0) });
        index.add(&entity);

        // Reclassify behind the index's back
        entity.team.set(1);

        // remove searches team 1's bucket and misses; the reference is
        // still parked under team 0
        assert!(!index.remove(&entity));
        assert_eq!(index.len(), 1);
        assert_eq!(index.bucket_len(&0), 1);
        assert_eq!(index.bucket_len(&1), 0);

        // Restoring the old classification makes remove find it again
        entity.team.set(0);
        assert!(index.remove(&entity));
        assert!(index.is_empty());
    }

    #[test]
    fn add_never_deduplicates() {
        let index = ConcurrentCategoryIndex::boxed(|v: &u64| v % 2);
        let entity = Arc::new(4u64);
        index.add(&entity);
        index.add(&entity);

        assert_eq!(index.len(), 2);
        assert_eq!(index.stats().adds, 2);

        // Each remove takes out one of the two entries
        assert!(index.remove(&entity));
        assert_eq!(index.len(), 1);
        assert!(index.remove(&entity));
        assert!(index.is_empty());
    }

    #[test]
    fn snapshot_concatenates_in_discovery_order() {
        let index = ConcurrentCategoryIndex::boxed(|v: &u64| v % 2);
        for value in [1u64, 2, 3, 4] {
            index.add(&Arc::new(value));
        }
        // Hold the owners so the weak handles stay live
        let owned: Vec<Arc<u64>> = (5..7u64).map(Arc::new).collect();
        for entity in &owned {
            index.add(entity);
        }

        // Entities 1..=4 were dropped right after adding; only the owned
        // two survive the upgrade
        let snap: Vec<u64> = index.snapshot().iter().map(|e| **e).collect();
        assert_eq!(snap, vec![5, 6]);
        assert_eq!(index.len(), 6);
    }

    #[test]
    fn clear_forgets_categories() {
        let index = ConcurrentCategoryIndex::boxed(|v: &u64| v % 2);
        let owned: Vec<Arc<u64>> = (0..4u64).map(Arc::new).collect();
        index.rebuild(&owned);

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.category_count(), 0);
        assert_eq!(index.stats().clears, 1);
    }

    #[test]
    fn rebuild_replaces_the_previous_partition() {
        let index = ConcurrentCategoryIndex::boxed(|v: &u64| v % 2);
        let first: Vec<Arc<u64>> = (0..4u64).map(Arc::new).collect();
        let second: Vec<Arc<u64>> = vec![Arc::new(1), Arc::new(3)];

        index.rebuild(&first);
        assert_eq!(index.len(), 4);

        index.rebuild(&second);
        assert_eq!(index.len(), 2);
        assert_eq!(index.categories(), vec![1]);
        assert_eq!(index.stats().rebuilds, 2);
    }
}
