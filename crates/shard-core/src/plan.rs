//! Options and the discover-assign-select pipeline

use crate::discovery::TestUniverse;
use crate::error::{ShardError, ShardResult};
use crate::partition::{self, NO_SHUFFLE};
use crate::selection::{compile_exclude, Selection};
use std::path::PathBuf;

/// Everything one invocation needs. Negative `index`/`total` mean unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardOptions {
    /// Directory to search for tests
    pub root: PathBuf,
    /// Shard to compute, starting at 0
    pub index: i64,
    /// Number of shards
    pub total: i64,
    /// Shuffle seed, 0 for no shuffle
    pub seed: i64,
    /// Regex of paths to drop after partitioning, empty for none
    pub exclude: String,
}

impl Default for ShardOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            index: -1,
            total: -1,
            seed: NO_SHUFFLE,
            exclude: String::new(),
        }
    }
}

impl ShardOptions {
    pub fn new(index: i64, total: i64) -> Self {
        Self {
            index,
            total,
            ..Default::default()
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_exclude(mut self, exclude: impl Into<String>) -> Self {
        self.exclude = exclude.into();
        self
    }

    /// Check index and total, returning them as `(index, total)`
    pub fn validate(&self) -> ShardResult<(usize, usize)> {
        if self.index < 0 {
            return Err(ShardError::configuration("index is required"));
        }
        if self.total < 0 {
            return Err(ShardError::configuration("total is required"));
        }
        if self.index >= self.total {
            return Err(ShardError::configuration("index must be less than total"));
        }
        let index = usize::try_from(self.index)
            .map_err(|_| ShardError::configuration("index is too large"))?;
        let total = usize::try_from(self.total)
            .map_err(|_| ShardError::configuration("total is too large"))?;
        Ok((index, total))
    }
}

/// Discover tests under `options.root` and select this shard's share
pub fn plan(options: &ShardOptions) -> ShardResult<Selection> {
    let (index, total) = options.validate()?;
    let exclude = compile_exclude(&options.exclude)?;

    let universe = TestUniverse::collect(&options.root)?;
    let assignment = partition::assign(&universe, index, total, options.seed);
    tracing::info!(
        "shard {} of {} owns {} of {} tests",
        index,
        total,
        assignment.len(),
        universe.len()
    );

    Ok(Selection::new(
        &assignment,
        index,
        total,
        options.seed,
        exclude.as_ref(),
        &options.root,
    ))
}
