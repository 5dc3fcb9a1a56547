pub mod by_category;
pub mod by_id;

pub use by_category::{CategoryIndexCore, ConcurrentCategoryIndex};
pub use by_id::{ConcurrentIdIndex, IdIndexCore};
