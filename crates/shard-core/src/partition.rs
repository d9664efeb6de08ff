//! Shard assignment - split a test universe into balanced contiguous groups
//!
//! The universe is optionally shuffled with a seeded RNG, then cut into
//! `total` contiguous groups whose sizes differ by at most one. The first
//! `N % total` groups carry the extra element.

use crate::discovery::{TestCase, TestUniverse};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::ops::Range;
use std::path::Path;

/// Seed value that disables shuffling
pub const NO_SHUFFLE: i64 = 0;

/// The tests one shard is responsible for, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardAssignment {
    tests: Vec<TestCase>,
}

impl ShardAssignment {
    pub fn new(tests: Vec<TestCase>) -> Self {
        Self { tests }
    }

    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    /// Assigned test names in order
    pub fn names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name.as_str()).collect()
    }

    /// Distinct files declaring at least one assigned test, sorted
    pub fn paths(&self) -> BTreeSet<&Path> {
        self.tests.iter().map(|t| t.path.as_path()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }
}

/// Compute the assignment for shard `index` of `total`.
///
/// A `seed` of [`NO_SHUFFLE`] keeps discovery order. Any other seed permutes
/// the universe first; the same seed always yields the same permutation.
/// An out-of-range `index` (or `total == 0`) yields an empty assignment.
pub fn assign(universe: &TestUniverse, index: usize, total: usize, seed: i64) -> ShardAssignment {
    let mut tests = universe.tests().to_vec();
    shuffle(&mut tests, seed);

    let range = group_range(tests.len(), index, total);
    tracing::debug!(
        "shard {}/{}: tests {}..{} of {}",
        index,
        total,
        range.start,
        range.end,
        tests.len()
    );

    ShardAssignment::new(tests.drain(range).collect())
}

/// Every shard's assignment, indexed by shard
pub fn assign_all(universe: &TestUniverse, total: usize, seed: i64) -> Vec<ShardAssignment> {
    let mut tests = universe.tests().to_vec();
    shuffle(&mut tests, seed);

    (0..total)
        .map(|index| ShardAssignment::new(tests[group_range(tests.len(), index, total)].to_vec()))
        .collect()
}

/// Fisher-Yates over the slice, keyed only by `seed`
pub fn shuffle<T>(items: &mut [T], seed: i64) {
    if seed == NO_SHUFFLE {
        return;
    }
    let mut rng = StdRng::seed_from_u64(seed as u64);
    items.shuffle(&mut rng);
}

/// Positions of group `index` when `len` items are cut into `total` groups.
///
/// Group `i` holds `len / total` items, plus one when `i < len % total`.
pub fn group_range(len: usize, index: usize, total: usize) -> Range<usize> {
    if total == 0 || index >= total {
        return 0..0;
    }
    let base = len / total;
    let extra = len % total;
    let start = index * base + index.min(extra);
    let size = base + usize::from(index < extra);
    start..start + size
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn universe(names: &[(&str, &str)]) -> TestUniverse {
        TestUniverse::new(
            names
                .iter()
                .enumerate()
                .map(|(line, (path, name))| TestCase::new(*path, *name, line + 1))
                .collect(),
        )
    }

    #[test]
    fn test_group_range_remainder_goes_first() {
        assert_eq!(group_range(10, 0, 3), 0..4);
        assert_eq!(group_range(10, 1, 3), 4..7);
        assert_eq!(group_range(10, 2, 3), 7..10);
    }

    #[test]
    fn test_group_range_even_split() {
        assert_eq!(group_range(6, 0, 3), 0..2);
        assert_eq!(group_range(6, 1, 3), 2..4);
        assert_eq!(group_range(6, 2, 3), 4..6);
    }

    #[test]
    fn test_group_range_more_shards_than_items() {
        assert_eq!(group_range(2, 0, 4), 0..1);
        assert_eq!(group_range(2, 1, 4), 1..2);
        assert_eq!(group_range(2, 2, 4), 2..2);
        assert_eq!(group_range(2, 3, 4), 2..2);
    }

    #[test]
    fn test_group_range_out_of_range() {
        assert_eq!(group_range(5, 3, 3), 0..0);
        assert_eq!(group_range(5, 0, 0), 0..0);
    }

    #[test]
    fn test_two_shards_over_three_tests() {
        let u = universe(&[("fileA", "T1"), ("fileA", "T2"), ("fileB", "T3")]);

        let first = assign(&u, 0, 2, 0);
        assert_eq!(first.names(), vec!["T1", "T2"]);
        assert_eq!(first.paths().into_iter().collect::<Vec<_>>(), vec![Path::new("fileA")]);

        let second = assign(&u, 1, 2, 0);
        assert_eq!(second.names(), vec!["T3"]);
        assert_eq!(second.paths().into_iter().collect::<Vec<_>>(), vec![Path::new("fileB")]);
    }

    #[test]
    fn test_one_test_per_shard() {
        let u = universe(&[("fileA", "T1"), ("fileA", "T2"), ("fileB", "T3")]);
        let names: Vec<_> = (0..3).map(|i| assign(&u, i, 3, 0).names().join(",")).collect();
        assert_eq!(names, vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn test_shuffle_zero_seed_is_identity() {
        let mut items: Vec<u32> = (0..20).collect();
        shuffle(&mut items, NO_SHUFFLE);
        assert_eq!(items, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut items: Vec<u32> = (0..50).collect();
        shuffle(&mut items, 7);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_negative_seed_shuffles() {
        let mut a: Vec<u32> = (0..50).collect();
        let mut b = a.clone();
        shuffle(&mut a, -1);
        shuffle(&mut b, -1);
        assert_eq!(a, b);
        assert_ne!(a, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_assign_all_matches_assign() {
        let u = universe(&[
            ("a", "T1"),
            ("a", "T2"),
            ("b", "T3"),
            ("b", "T4"),
            ("c", "T5"),
        ]);
        let all = assign_all(&u, 3, 99);
        for (index, shard) in all.iter().enumerate() {
            assert_eq!(shard, &assign(&u, index, 3, 99));
        }
    }

    #[test]
    fn test_empty_universe() {
        let u = TestUniverse::default();
        for index in 0..4 {
            assert!(assign(&u, index, 4, 0).is_empty());
            assert!(assign(&u, index, 4, 12345).is_empty());
        }
    }
}
