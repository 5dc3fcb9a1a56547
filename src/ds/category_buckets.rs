//! Bucketed storage keyed by an externally-computed category value.
//!
//! The value store for the category-indexing strategy: one `Vec` bucket per
//! distinct category, a list of categories in discovery order, and a map
//! from category to its bucket position so iteration never re-hashes.
//! Buckets never disappear once discovered; an emptied bucket keeps its
//! position so category positions stay stable for the structure's lifetime.
//!
//! Removal is a linear scan of the one bucket the caller names, followed by
//! a swap-pop. Bucket-local positions are not tracked, so removal costs
//! O(bucket size), not O(1).

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::InvariantError;

/// Category-partitioned buckets with a stable discovery order.
///
/// # Example
///
/// ```
/// use indexkit::ds::CategoryBuckets;
///
/// let mut buckets = CategoryBuckets::new();
/// buckets.push("red", 1);
/// buckets.push("blue", 2);
/// buckets.push("red", 3);
///
/// assert_eq!(buckets.categories(), &["red", "blue"]);
/// assert_eq!(buckets.bucket(&"red"), Some(&[1, 3][..]));
/// assert_eq!(buckets.len(), 3);
/// ```
#[derive(Debug)]
pub struct CategoryBuckets<C, V> {
    /// Distinct categories in discovery order; positions are stable.
    categories: Vec<C>,
    /// Category → position in `categories` (and `buckets`).
    category_to_pos: FxHashMap<C, usize>,
    /// `buckets[p]` holds the values classified under `categories[p]`.
    buckets: Vec<Vec<V>>,
}

impl<C, V> CategoryBuckets<C, V>
where
    C: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
            category_to_pos: FxHashMap::default(),
            buckets: Vec::new(),
        }
    }

    /// Builds the partition from classified pairs in one pass over the
    /// categories and one pass over the values.
    ///
    /// Each bucket is pre-sized to roughly `pairs / categories` to avoid
    /// repeated reallocation while filling.
    pub fn from_pairs(pairs: Vec<(C, V)>) -> Self {
        let mut category_to_pos =
            FxHashMap::with_capacity_and_hasher(pairs.len(), Default::default());
        let mut categories = Vec::new();
        for (category, _) in &pairs {
            if !category_to_pos.contains_key(category) {
                category_to_pos.insert(category.clone(), categories.len());
                categories.push(category.clone());
            }
        }

        let average = if categories.is_empty() {
            0
        } else {
            pairs.len() / categories.len()
        };
        let mut buckets: Vec<Vec<V>> = (0..categories.len())
            .map(|_| Vec::with_capacity(average))
            .collect();
        for (category, value) in pairs {
            let pos = category_to_pos[&category];
            buckets[pos].push(value);
        }

        Self {
            categories,
            category_to_pos,
            buckets,
        }
    }

    /// Appends a value to its category's bucket, discovering the category
    /// if unseen. Never deduplicates: pushing the same value twice under
    /// one category yields two bucket entries.
    pub fn push(&mut self, category: C, value: V) {
        let pos = match self.category_to_pos.get(&category) {
            Some(&pos) => pos,
            None => {
                let pos = self.categories.len();
                self.category_to_pos.insert(category.clone(), pos);
                self.categories.push(category);
                self.buckets.push(Vec::new());
                pos
            },
        };
        self.buckets[pos].push(value);
    }

    /// Removes and returns the first value in `category`'s bucket matching
    /// the predicate, via swap-pop. `None` if the category is unknown or
    /// nothing matches. O(bucket size).
    pub fn remove_where<P>(&mut self, category: &C, mut predicate: P) -> Option<V>
    where
        P: FnMut(&V) -> bool,
    {
        let &pos = self.category_to_pos.get(category)?;
        let bucket = &mut self.buckets[pos];
        let idx = bucket.iter().position(|value| predicate(value))?;
        Some(bucket.swap_remove(idx))
    }

    pub fn clear(&mut self) {
        self.categories.clear();
        self.category_to_pos.clear();
        self.buckets.clear();
    }

    /// Total values across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Distinct categories seen, in discovery order.
    #[inline]
    pub fn categories(&self) -> &[C] {
        &self.categories
    }

    #[inline]
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// One category's bucket contents, or `None` if never discovered.
    pub fn bucket(&self, category: &C) -> Option<&[V]> {
        self.category_to_pos
            .get(category)
            .map(|&pos| self.buckets[pos].as_slice())
    }

    /// Number of values in one category's bucket (0 if unknown).
    pub fn bucket_len(&self, category: &C) -> usize {
        self.bucket(category).map_or(0, <[V]>::len)
    }

    /// Iterates every value in bucket-discovery, then in-bucket, order.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.buckets.iter().flatten()
    }

    /// Validates the category / position-map / bucket triple.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.categories.len() != self.buckets.len() {
            return Err(InvariantError::new(format!(
                "{} categories but {} buckets",
                self.categories.len(),
                self.buckets.len()
            )));
        }
        if self.categories.len() != self.category_to_pos.len() {
            return Err(InvariantError::new(format!(
                "{} categories but {} position-map entries",
                self.categories.len(),
                self.category_to_pos.len()
            )));
        }
        for (pos, category) in self.categories.iter().enumerate() {
            match self.category_to_pos.get(category) {
                Some(&mapped) if mapped == pos => {},
                _ => {
                    return Err(InvariantError::new(format!(
                        "category at position {} is missing or mispointed in the position map",
                        pos
                    )));
                },
            }
        }
        Ok(())
    }
}

impl<C, V> Default for CategoryBuckets<C, V>
where
    C: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
