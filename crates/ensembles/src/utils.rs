//! Common utilities used across the crate.
//!
//! Provides the insertion-ordered set used for feature-name deduplication
//! and the parallelism helpers shared by batch inference.

use std::collections::HashMap;
use std::hash::Hash;

use rayon::prelude::*;

// =============================================================================
// Ordered Set
// =============================================================================

/// A set that preserves first-insertion order.
///
/// Backed by a sequence plus a membership index, so iteration yields items
/// in the order they were first inserted regardless of hashing.
#[derive(Debug, Clone, Default)]
pub struct OrderedSet<T> {
    items: Vec<T>,
    index: HashMap<T, usize>,
}

impl<T: Clone + Eq + Hash> OrderedSet<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert an item, returning `true` if it was not already present.
    pub fn insert(&mut self, item: T) -> bool {
        if self.index.contains_key(&item) {
            return false;
        }
        self.index.insert(item.clone(), self.items.len());
        self.items.push(item);
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.index.contains_key(item)
    }

    /// Position of an item in insertion order.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.index.get(item).copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Consume the set, yielding items in insertion order.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// Components receive this flag instead of managing thread pools themselves;
/// the pool is set up at the API boundary via [`run_with_threads`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map over an iterator, in parallel when allowed.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use all available cores)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
#[inline]
pub fn run_with_threads<T: Send>(n_threads: usize, f: impl FnOnce(Parallelism) -> T + Send) -> T {
    let parallelism = Parallelism::from_threads(n_threads);

    match parallelism {
        Parallelism::Sequential => f(Parallelism::Sequential),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()
                .expect("Failed to create thread pool");
            pool.install(|| f(Parallelism::Parallel))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_set_preserves_insertion_order() {
        let mut set = OrderedSet::new();
        assert!(set.insert("b"));
        assert!(set.insert("a"));
        assert!(!set.insert("b"));
        assert!(set.insert("c"));

        let items: Vec<_> = set.iter().copied().collect();
        assert_eq!(items, vec!["b", "a", "c"]);
        assert_eq!(set.index_of(&"a"), Some(1));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn ordered_set_into_vec() {
        let mut set = OrderedSet::new();
        set.insert(2);
        set.insert(1);
        set.insert(2);
        assert_eq!(set.into_vec(), vec![2, 1]);
    }

    #[test]
    fn parallelism_from_threads() {
        assert_eq!(Parallelism::from_threads(1), Parallelism::Sequential);
        assert_eq!(Parallelism::from_threads(4), Parallelism::Parallel);
    }

    #[test]
    fn maybe_par_map_sequential_matches_parallel() {
        let seq = Parallelism::Sequential.maybe_par_map(0..8usize, |i| i * 2);
        let par = Parallelism::Parallel.maybe_par_map(0..8usize, |i| i * 2);
        assert_eq!(seq, par);
    }
}
