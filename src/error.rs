//! Error types for the indexkit library.
//!
//! ## Key Components
//!
//! - [`ModeError`]: Returned when a mode-specific operation is invoked on a
//!   runtime-moded [`EntityIndex`](crate::builder::EntityIndex) fixed to the
//!   other mode. The typed cores make such calls unrepresentable instead.
//! - [`SnapshotError`]: Returned by strict rebuild variants when the supplied
//!   snapshot violates a caller-side precondition (duplicate identifiers).
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (explicit `check_invariants` methods).
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use indexkit::index::ConcurrentIdIndex;
//!
//! // Strict rebuild catches duplicate identifiers without touching state
//! let index: ConcurrentIdIndex<u64> = ConcurrentIdIndex::new();
//! let first = Arc::new(7u64);
//! let duplicate = Arc::new(7u64);
//! assert!(index.try_rebuild(&[first, duplicate]).is_err());
//! assert!(index.is_empty());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ModeError
// ---------------------------------------------------------------------------

/// Error returned when an operation is invoked on an index fixed to the
/// other mode.
///
/// Produced by the mode-specific accessors of
/// [`EntityIndex`](crate::builder::EntityIndex) (e.g. `active_ids` on a
/// category-moded instance). Carries a human-readable description naming the
/// operation and the instance's actual mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeError(String);

impl ModeError {
    /// Creates a new `ModeError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ModeError {}

// ---------------------------------------------------------------------------
// SnapshotError
// ---------------------------------------------------------------------------

/// Error returned when a rebuild snapshot violates a caller precondition.
///
/// Produced by strict rebuild variants such as
/// [`ConcurrentIdIndex::try_rebuild`](crate::index::ConcurrentIdIndex::try_rebuild)
/// when the snapshot contains duplicate identifiers. The permissive `rebuild`
/// accepts the same input silently (last write wins in the table); the strict
/// form rejects it and leaves the existing index state untouched.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use indexkit::index::ConcurrentIdIndex;
///
/// let index: ConcurrentIdIndex<u64> = ConcurrentIdIndex::new();
/// let err = index
///     .try_rebuild(&[Arc::new(3u64), Arc::new(3u64)])
///     .unwrap_err();
/// assert!(err.to_string().contains("duplicate"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotError(String);

impl SnapshotError {
    /// Creates a new `SnapshotError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SnapshotError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal index invariants are violated.
///
/// Produced by explicit `check_invariants` methods on the index types
/// (e.g. [`DenseTable::check_invariants`](crate::ds::DenseTable::check_invariants)).
/// Carries a human-readable description of which invariant failed. A
/// permissive rebuild fed duplicate identifiers leaves a state this check
/// reports; see the rebuild documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
