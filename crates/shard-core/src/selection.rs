//! Selection output - turn a shard assignment into runner arguments
//!
//! Exclusion runs after partitioning: excluded paths and the tests that
//! only they declare are dropped from this shard's output, never handed to
//! another shard.

use crate::error::{ShardError, ShardResult};
use crate::partition::ShardAssignment;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Test name emitted when a shard has nothing to run; matches no Go test
pub const NO_TESTS_PLACEHOLDER: &str = "NoTestsFound";

/// How a selection is printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// `-run <pattern>  <paths>`: a `-run` selector followed by the test files
    #[default]
    Default,
    /// `SHARD_TESTS=...` and `SHARD_PATHS=...` lines
    Env,
    /// A single JSON object
    Json,
}

impl FromStr for OutputFormat {
    type Err = ShardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "default" => Ok(Self::Default),
            "env" => Ok(Self::Env),
            "json" => Ok(Self::Json),
            other => Err(ShardError::configuration(format!(
                "unknown output format '{}' (expected env, default or json)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Env => write!(f, "env"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// The tests and paths a shard worker should hand to the test runner.
/// Serializes as the `json` output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub index: usize,
    pub total: usize,
    pub seed: i64,
    /// Test names in assignment order, without repeats
    #[serde(rename = "tests")]
    pub names: Vec<String>,
    /// Distinct paths, sorted
    pub paths: Vec<String>,
    /// Anchored alternation matching exactly `names`
    pub pattern: String,
    /// True when nothing was left and the no-op placeholder was substituted
    pub fallback: bool,
}

impl Selection {
    /// Build the selection for one shard.
    ///
    /// Paths matching `exclude` are removed along with tests declared only
    /// in them. If no path survives, the selection becomes a no-op: `root`
    /// as the only path and [`NO_TESTS_PLACEHOLDER`] as the only name.
    pub fn new(
        assignment: &ShardAssignment,
        index: usize,
        total: usize,
        seed: i64,
        exclude: Option<&Regex>,
        root: &Path,
    ) -> Self {
        let is_excluded = |path: &str| exclude.is_some_and(|re| re.is_match(path));

        let mut paths = Vec::new();
        for path in assignment.paths() {
            let path = path.to_string_lossy();
            if is_excluded(&path) {
                tracing::debug!("excluding {}", path);
            } else {
                paths.push(path.into_owned());
            }
        }

        let mut seen = HashSet::new();
        let names: Vec<String> = assignment
            .tests()
            .iter()
            .filter(|t| !is_excluded(&t.path.to_string_lossy()))
            .filter(|t| seen.insert(t.name.as_str()))
            .map(|t| t.name.clone())
            .collect();

        let fallback = paths.is_empty();
        let (names, paths) = if fallback {
            (
                vec![NO_TESTS_PLACEHOLDER.to_string()],
                vec![root.to_string_lossy().into_owned()],
            )
        } else {
            (names, paths)
        };

        Self {
            index,
            total,
            seed,
            pattern: format!("^(?:{})$", names.join("|")),
            names,
            paths,
            fallback,
        }
    }

    /// `pattern` with the `$` anchor escaped for shell evaluation
    pub fn shell_pattern(&self) -> String {
        format!("^(?:{})\\$", self.names.join("|"))
    }

    pub fn render(&self, format: OutputFormat) -> ShardResult<String> {
        let paths = self.paths.join(" ");
        let output = match format {
            OutputFormat::Env => {
                format!("SHARD_TESTS={}\nSHARD_PATHS={}", self.shell_pattern(), paths)
            }
            OutputFormat::Default => format!("-run {}  {}", self.shell_pattern(), paths),
            OutputFormat::Json => serde_json::to_string(self)?,
        };
        Ok(output)
    }
}

/// Compile an exclude pattern; an empty pattern excludes nothing
pub fn compile_exclude(pattern: &str) -> ShardResult<Option<Regex>> {
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(pattern)
        .map(Some)
        .map_err(|error| ShardError::InvalidExclude {
            pattern: pattern.to_string(),
            error,
        })
}
