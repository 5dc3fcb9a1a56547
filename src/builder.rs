//! Unified builder for runtime-moded indexes.
//!
//! Provides a single wrapper type holding either indexing strategy, for
//! callers that pick the mode at run time (e.g. from configuration). Mode
//! is fixed at construction for the instance's lifetime; operations that
//! belong to the other mode fail fast with a
//! [`ModeError`](crate::error::ModeError). Callers that know the mode at
//! compile time should use the typed wrappers from [`crate::index`]
//! directly, where wrong-mode calls do not exist.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use indexkit::builder::{IndexBuilder, IndexMode};
//!
//! let owned: Vec<Arc<u64>> = (0..4u64).map(Arc::new).collect();
//!
//! let index = IndexBuilder::new().with_capacity(64).build_by_id::<u64>();
//! index.rebuild(&owned);
//!
//! assert_eq!(index.mode(), IndexMode::ById);
//! assert_eq!(index.len(), 4);
//! assert!(index.active_ids().is_ok());
//! assert!(index.categories().is_err()); // wrong mode, signalled
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::{InvariantError, ModeError, SnapshotError};
use crate::index::{ConcurrentCategoryIndex, ConcurrentIdIndex};
use crate::stats::IndexStats;
use crate::traits::{EntityId, Identified};

/// The two indexing strategies a runtime-moded index can be fixed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexMode {
    /// Dense identifier table; O(1) lookup/add/remove.
    ById,
    /// Category buckets; per-group iteration, O(bucket) removal.
    ByCategory,
}

impl fmt::Display for IndexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexMode::ById => f.write_str("id"),
            IndexMode::ByCategory => f.write_str("category"),
        }
    }
}

fn wrong_mode(operation: &str, required: IndexMode, actual: IndexMode) -> ModeError {
    ModeError::new(format!(
        "{} requires {} mode, index is in {} mode",
        operation, required, actual
    ))
}

/// Runtime-moded index wrapper over the concurrent strategies.
///
/// Shared operations dispatch to whichever strategy the instance holds;
/// mode-specific operations return `Err(ModeError)` on the wrong variant.
/// The category type parameter defaults to `()` for id-moded instances.
pub struct EntityIndex<T, C = ()> {
    inner: IndexInner<T, C>,
}

enum IndexInner<T, C> {
    ById(ConcurrentIdIndex<T>),
    ByCategory(ConcurrentCategoryIndex<T, C>),
}

impl<T, C> EntityIndex<T, C>
where
    T: Identified,
    C: Clone + Eq + Hash,
{
    /// The mode this instance was fixed to at construction.
    pub fn mode(&self) -> IndexMode {
        match &self.inner {
            IndexInner::ById(_) => IndexMode::ById,
            IndexInner::ByCategory(_) => IndexMode::ByCategory,
        }
    }

    /// Replaces the whole index from a full snapshot.
    pub fn rebuild(&self, entities: &[Arc<T>]) {
        match &self.inner {
            IndexInner::ById(index) => index.rebuild(entities),
            IndexInner::ByCategory(index) => index.rebuild(entities),
        }
    }

    /// Strict rebuild. In id mode this rejects duplicate identifiers; the
    /// category strategy has no identifier precondition, so a
    /// category-moded instance rebuilds permissively and returns `Ok`.
    pub fn try_rebuild(&self, entities: &[Arc<T>]) -> Result<(), SnapshotError> {
        match &self.inner {
            IndexInner::ById(index) => index.try_rebuild(entities),
            IndexInner::ByCategory(index) => {
                index.rebuild(entities);
                Ok(())
            },
        }
    }

    /// Adds one entity. `false` means the id strategy ignored a duplicate
    /// identifier; the category strategy always appends.
    pub fn add(&self, entity: &Arc<T>) -> bool {
        match &self.inner {
            IndexInner::ById(index) => index.add(entity),
            IndexInner::ByCategory(index) => {
                index.add(entity);
                true
            },
        }
    }

    /// Removes one entity. `false` if nothing was removed.
    pub fn remove(&self, entity: &Arc<T>) -> bool {
        match &self.inner {
            IndexInner::ById(index) => index.remove(entity),
            IndexInner::ByCategory(index) => index.remove(entity),
        }
    }

    pub fn clear(&self) {
        match &self.inner {
            IndexInner::ById(index) => index.clear(),
            IndexInner::ByCategory(index) => index.clear(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            IndexInner::ById(index) => index.len(),
            IndexInner::ByCategory(index) => index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies out all live references in the strategy's snapshot order.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        match &self.inner {
            IndexInner::ById(index) => index.snapshot(),
            IndexInner::ByCategory(index) => index.snapshot(),
        }
    }

    /// Visits every live reference under the shared lock. The visitor must
    /// not re-enter this instance; see the strategy docs.
    pub fn for_each<V: FnMut(&Arc<T>)>(&self, visitor: V) {
        match &self.inner {
            IndexInner::ById(index) => index.for_each(visitor),
            IndexInner::ByCategory(index) => index.for_each(visitor),
        }
    }

    /// Snapshot of the mutation counters.
    pub fn stats(&self) -> IndexStats {
        match &self.inner {
            IndexInner::ById(index) => index.stats(),
            IndexInner::ByCategory(index) => index.stats(),
        }
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        match &self.inner {
            IndexInner::ById(index) => index.check_invariants(),
            IndexInner::ByCategory(index) => index.check_invariants(),
        }
    }

    // -- id mode only -----------------------------------------------------

    /// O(1) lookup by identifier (id mode only).
    pub fn get(&self, id: EntityId) -> Result<Option<Arc<T>>, ModeError> {
        match &self.inner {
            IndexInner::ById(index) => Ok(index.get(id)),
            IndexInner::ByCategory(_) => Err(wrong_mode("get", IndexMode::ById, self.mode())),
        }
    }

    /// Index membership by identifier (id mode only).
    pub fn contains(&self, id: EntityId) -> Result<bool, ModeError> {
        match &self.inner {
            IndexInner::ById(index) => Ok(index.contains(id)),
            IndexInner::ByCategory(_) => {
                Err(wrong_mode("contains", IndexMode::ById, self.mode()))
            },
        }
    }

    /// Owned copy of the active-identifier list (id mode only).
    pub fn active_ids(&self) -> Result<Vec<EntityId>, ModeError> {
        match &self.inner {
            IndexInner::ById(index) => Ok(index.active_ids()),
            IndexInner::ByCategory(_) => {
                Err(wrong_mode("active_ids", IndexMode::ById, self.mode()))
            },
        }
    }

    // -- category mode only -----------------------------------------------

    /// Owned copy of the discovered category list (category mode only).
    pub fn categories(&self) -> Result<Vec<C>, ModeError> {
        match &self.inner {
            IndexInner::ById(_) => {
                Err(wrong_mode("categories", IndexMode::ByCategory, self.mode()))
            },
            IndexInner::ByCategory(index) => Ok(index.categories()),
        }
    }

    /// Bucket size for one category (category mode only).
    pub fn bucket_len(&self, category: &C) -> Result<usize, ModeError> {
        match &self.inner {
            IndexInner::ById(_) => {
                Err(wrong_mode("bucket_len", IndexMode::ByCategory, self.mode()))
            },
            IndexInner::ByCategory(index) => Ok(index.bucket_len(category)),
        }
    }

    /// Visits one category's bucket, copy-under-lock then visit-outside
    /// (category mode only). The visitor may re-enter the index.
    pub fn for_each_category<V: FnMut(&Arc<T>)>(
        &self,
        category: &C,
        visitor: V,
    ) -> Result<(), ModeError> {
        match &self.inner {
            IndexInner::ById(_) => Err(wrong_mode(
                "for_each_category",
                IndexMode::ByCategory,
                self.mode(),
            )),
            IndexInner::ByCategory(index) => {
                index.for_each_category(category, visitor);
                Ok(())
            },
        }
    }
}

/// Builder for runtime-moded index instances.
///
/// The capacity hint pre-sizes the identifier strategy's active list and
/// position map; the category strategy sizes its buckets at rebuild time.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use indexkit::builder::IndexBuilder;
///
/// // The owner keeps the Arc; the index only holds a weak handle
/// let entity = Arc::new(3u64);
///
/// // Id mode
/// let by_id = IndexBuilder::new().build_by_id::<u64>();
/// by_id.add(&entity);
/// assert_eq!(by_id.get(3).unwrap().as_deref(), Some(&3));
///
/// // Category mode
/// let by_parity = IndexBuilder::new().build_by_category(|v: &u64| v % 2);
/// by_parity.add(&entity);
/// assert_eq!(by_parity.categories().unwrap(), vec![1]);
/// ```
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    capacity: usize,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self { capacity: 0 }
    }

    /// Sets the expected working-set size.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builds an id-moded instance.
    pub fn build_by_id<T: Identified>(self) -> EntityIndex<T> {
        EntityIndex {
            inner: IndexInner::ById(ConcurrentIdIndex::with_capacity(self.capacity)),
        }
    }

    /// Builds a category-moded instance around the given categorizer. The
    /// categorizer is boxed and fixed for the instance's lifetime.
    pub fn build_by_category<T, C>(
        self,
        categorizer: impl Fn(&T) -> C + Send + Sync + 'static,
    ) -> EntityIndex<T, C>
    where
        C: Clone + Eq + Hash,
    {
        EntityIndex {
            inner: IndexInner::ByCategory(ConcurrentCategoryIndex::boxed(categorizer)),
        }
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}
