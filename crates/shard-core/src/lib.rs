//! Shard: split a Go test suite across parallel CI workers
//!
//! Discovers `Test*`, `Fuzz*` and `Example*` functions in `*_test.go` files
//! under a root directory and deterministically assigns them to shards, so
//! `N` workers each run a disjoint slice and together run everything.
//!
//! # Pipeline
//!
//! 1. [`discovery`] walks the tree and builds an ordered [`TestUniverse`]
//! 2. [`partition`] optionally shuffles it with a seed and cuts out one shard
//! 3. [`selection`] drops excluded paths and renders runner arguments
//!
//! # Example
//!
//! ```no_run
//! use shard_core::{plan, OutputFormat, ShardOptions};
//!
//! let options = ShardOptions::new(0, 4).with_root("./services").with_seed(42);
//! let selection = plan(&options).unwrap();
//! println!("{}", selection.render(OutputFormat::Env).unwrap());
//! ```

pub mod discovery;
pub mod error;
pub mod partition;
pub mod plan;
pub mod selection;

// Re-export main types
pub use discovery::{collect, TestCase, TestUniverse};
pub use error::{ShardError, ShardResult};
pub use partition::{assign, assign_all, ShardAssignment, NO_SHUFFLE};
pub use plan::{plan, ShardOptions};
pub use selection::{OutputFormat, Selection, NO_TESTS_PLACEHOLDER};
