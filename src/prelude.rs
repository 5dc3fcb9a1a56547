pub use crate::builder::{EntityIndex, IndexBuilder, IndexMode};
pub use crate::ds::{CategoryBuckets, DenseTable};
pub use crate::error::{InvariantError, ModeError, SnapshotError};
pub use crate::index::{
    CategoryIndexCore, ConcurrentCategoryIndex, ConcurrentIdIndex, IdIndexCore,
};
pub use crate::stats::IndexStats;
pub use crate::traits::{
    CategoryIndex, ConcurrentIndex, CoreIndex, EntityId, IdIndex, Identified,
};
