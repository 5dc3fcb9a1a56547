pub mod category_buckets;
pub mod dense_table;

pub use category_buckets::CategoryBuckets;
pub use dense_table::DenseTable;
