//! indexkit: working-set indexing primitives for externally-owned entities.
//!
//! Two interchangeable strategies behind one contract: a dense identifier
//! table with O(1) swap-pop mutation, and category buckets driven by a
//! caller-supplied classification function. Each comes as a
//! single-threaded core and a reader/writer-locked concurrent wrapper;
//! the index stores checked weak references and never owns an entity.
//!
//! ```
//! use std::sync::Arc;
//! use indexkit::prelude::*;
//!
//! let owned: Vec<Arc<u64>> = (0..4u64).map(Arc::new).collect();
//!
//! let index = IndexBuilder::new().build_by_id::<u64>();
//! index.rebuild(&owned);
//! assert_eq!(index.get(2).unwrap().as_deref(), Some(&2));
//! ```

pub mod builder;
pub mod ds;
pub mod error;
pub mod index;
pub mod prelude;
pub mod stats;
pub mod traits;
