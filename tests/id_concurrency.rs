// ==============================================
// IDENTIFIER INDEX CONCURRENCY TESTS (integration)
// ==============================================
//
// Mutator exclusivity, atomic rebuild visibility, and reader consistency
// for ConcurrentIdIndex. These require multi-threaded execution and
// cannot live inline.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use indexkit::index::ConcurrentIdIndex;
use indexkit::traits::{EntityId, Identified};

#[derive(Debug)]
struct Unit {
    id: u64,
    generation: u64,
}

impl Identified for Unit {
    fn entity_id(&self) -> EntityId {
        self.id
    }
}

fn generation_set(generation: u64, count: u64) -> Vec<Arc<Unit>> {
    (0..count)
        .map(|id| Arc::new(Unit { id, generation }))
        .collect()
}

// ==============================================
// Mutator Exclusivity: Concurrent Adds
// ==============================================
//
// Two adds racing on different identifiers must both land; the triple
// (table, active list, position map) is patched under one write lock.

mod concurrent_adds {
    use super::*;

    #[test]
    fn distinct_ids_from_many_threads_all_land() {
        let threads = 8;
        let per_thread = 64u64;

        let index: Arc<ConcurrentIdIndex<Unit>> = Arc::new(ConcurrentIdIndex::new());
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|tid| {
                let index = index.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    let owned: Vec<Arc<Unit>> = (0..per_thread)
                        .map(|i| {
                            Arc::new(Unit {
                                id: tid as u64 * per_thread + i,
                                generation: 0,
                            })
                        })
                        .collect();
                    barrier.wait();
                    for entity in &owned {
                        assert!(index.add(entity));
                    }
                    owned // keep the Arcs alive past the asserts below
                })
            })
            .collect();

        let _owned: Vec<Vec<Arc<Unit>>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let total = threads as u64 * per_thread;
        assert_eq!(index.len(), total as usize);
        for id in 0..total {
            assert!(index.contains(id), "id {} missing after concurrent adds", id);
        }
        assert!(index.check_invariants().is_ok());
    }
}

// ==============================================
// Mutator Exclusivity: Concurrent Removes
// ==============================================

mod concurrent_removes {
    use super::*;

    #[test]
    fn disjoint_removes_all_take_effect() {
        let threads = 8;
        let per_thread = 64u64;
        let total = threads as u64 * per_thread;

        let owned = generation_set(0, total);
        let index: Arc<ConcurrentIdIndex<Unit>> = Arc::new(ConcurrentIdIndex::new());
        index.rebuild(&owned);

        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|tid| {
                let index = index.clone();
                let barrier = barrier.clone();
                let slice: Vec<u64> = (0..per_thread)
                    .map(|i| tid as u64 * per_thread + i)
                    .collect();
                thread::spawn(move || {
                    barrier.wait();
                    for id in slice {
                        assert!(index.remove_id(id));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(index.is_empty());
        assert!(index.check_invariants().is_ok());
        drop(owned);
    }

    #[test]
    fn removing_every_other_entry_leaves_the_rest() {
        let total = 256u64;
        let owned = generation_set(0, total);
        let index: Arc<ConcurrentIdIndex<Unit>> = Arc::new(ConcurrentIdIndex::new());
        index.rebuild(&owned);

        let threads = 4;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|tid| {
                let index = index.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    // Each thread removes a disjoint quarter of the evens
                    let mut id = tid as u64 * 2;
                    while id < total {
                        assert!(index.remove_id(id));
                        id += threads as u64 * 2;
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(index.len(), total as usize / 2);
        for id in 0..total {
            assert_eq!(index.contains(id), id % 2 == 1);
        }
        assert!(index.check_invariants().is_ok());
    }
}

// ==============================================
// Atomic Rebuild Visibility
// ==============================================
//
// rebuild builds the fresh table outside the lock and swaps it in whole,
// so a snapshot taken under one read-lock acquisition never mixes
// entities from two generations.

mod rebuild_atomicity {
    use super::*;

    #[test]
    fn snapshot_never_mixes_generations() {
        let count = 100u64;
        let index: Arc<ConcurrentIdIndex<Unit>> = Arc::new(ConcurrentIdIndex::new());
        let gen_a = generation_set(0, count);
        let gen_b = generation_set(1, count);
        index.rebuild(&gen_a);

        let stop = Arc::new(AtomicBool::new(false));
        let mixed = Arc::new(AtomicUsize::new(0));

        let index_r = index.clone();
        let stop_r = stop.clone();
        let mixed_r = mixed.clone();
        let reader = thread::spawn(move || {
            while !stop_r.load(Ordering::Relaxed) {
                let snap = index_r.snapshot();
                if snap.len() != count as usize {
                    mixed_r.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                let generation = snap[0].generation;
                if snap.iter().any(|e| e.generation != generation) {
                    mixed_r.fetch_add(1, Ordering::Relaxed);
                }
            }
        });

        let index_w = index.clone();
        let stop_w = stop.clone();
        let writer = thread::spawn(move || {
            for round in 0..500 {
                if round % 2 == 0 {
                    index_w.rebuild(&gen_b);
                } else {
                    index_w.rebuild(&gen_a);
                }
            }
            stop_w.store(true, Ordering::Relaxed);
        });

        reader.join().unwrap();
        writer.join().unwrap();

        assert_eq!(
            mixed.load(Ordering::Relaxed),
            0,
            "snapshot observed a partially applied rebuild"
        );
    }
}

// ==============================================
// Readers During Clear/Repopulate Cycles
// ==============================================
//
// clear empties under one write lock and rebuild installs under another,
// so readers only ever observe the empty state or a complete generation.

mod readers_during_clear {
    use super::*;

    #[test]
    fn snapshots_are_empty_or_complete() {
        let count = 100u64;
        let owned = generation_set(7, count);
        let index: Arc<ConcurrentIdIndex<Unit>> = Arc::new(ConcurrentIdIndex::new());
        index.rebuild(&owned);

        let stop = Arc::new(AtomicBool::new(false));
        let partial = Arc::new(AtomicUsize::new(0));

        let index_r = index.clone();
        let stop_r = stop.clone();
        let partial_r = partial.clone();
        let reader = thread::spawn(move || {
            while !stop_r.load(Ordering::Relaxed) {
                let snap = index_r.snapshot();
                if !(snap.is_empty() || snap.len() == count as usize) {
                    partial_r.fetch_add(1, Ordering::Relaxed);
                }
            }
        });

        let index_w = index.clone();
        let stop_w = stop.clone();
        let writer = thread::spawn(move || {
            for _ in 0..500 {
                index_w.clear();
                index_w.rebuild(&owned);
            }
            stop_w.store(true, Ordering::Relaxed);
        });

        reader.join().unwrap();
        writer.join().unwrap();

        assert_eq!(
            partial.load(Ordering::Relaxed),
            0,
            "snapshot observed a half-applied clear or rebuild"
        );
    }
}
