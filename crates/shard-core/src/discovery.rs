//! Test discovery - find Go test functions in a source tree

use crate::error::{ShardError, ShardResult};
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Function name prefixes that `go test -run` selects
const TEST_PREFIXES: [&str; 3] = ["Test", "Fuzz", "Example"];

/// Directories the Go tool never descends into
const IGNORED_DIRS: [&str; 2] = ["vendor", "testdata"];

/// A discovered test function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// File declaring the test
    pub path: PathBuf,
    /// Name of the test function (e.g., "TestAddition")
    pub name: String,
    /// 1-based line of the declaration
    pub line: usize,
}

impl TestCase {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, line: usize) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            line,
        }
    }
}

/// Every test found under a root, ordered by file then declaration line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestUniverse {
    tests: Vec<TestCase>,
}

impl TestUniverse {
    /// Build a universe from cases already in the desired order
    pub fn new(tests: Vec<TestCase>) -> Self {
        Self { tests }
    }

    /// Discover all test functions in a directory tree
    pub fn collect(root: &Path) -> ShardResult<Self> {
        let metadata = fs::metadata(root).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ShardError::RootNotFound {
                path: root.to_path_buf(),
            },
            _ => ShardError::read(root, e),
        })?;
        if !metadata.is_dir() {
            return Err(ShardError::RootNotDirectory {
                path: root.to_path_buf(),
            });
        }

        let mut tests = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_ignored(entry));

        for entry in walker {
            let entry = entry.map_err(|error| ShardError::Walk {
                root: root.to_path_buf(),
                error,
            })?;
            if entry.file_type().is_dir() || !is_test_file(entry.file_name()) {
                continue;
            }

            let found = discover_tests_in_file(entry.path())?;
            tracing::debug!(
                "{}: {} test{}",
                entry.path().display(),
                found.len(),
                if found.len() == 1 { "" } else { "s" }
            );
            tests.extend(found);
        }

        // Sort by file, then by line for deterministic order
        tests.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.line.cmp(&b.line)));

        let universe = Self { tests };
        for (name, paths) in universe.name_collisions() {
            tracing::warn!(
                "test name {} is declared in {} files; its selector matches all of them",
                name,
                paths.len()
            );
        }
        tracing::info!("discovered {} tests under {}", universe.len(), root.display());

        Ok(universe)
    }

    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestCase> {
        self.tests.iter()
    }

    /// Check if the universe has any tests
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Get count of tests
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Names declared in more than one file, with the files declaring them.
    ///
    /// Selector patterns match on name only and cannot tell these apart.
    pub fn name_collisions(&self) -> BTreeMap<&str, Vec<&Path>> {
        let mut by_name: BTreeMap<&str, Vec<&Path>> = BTreeMap::new();
        for test in &self.tests {
            let paths = by_name.entry(test.name.as_str()).or_default();
            if !paths.contains(&test.path.as_path()) {
                paths.push(test.path.as_path());
            }
        }
        by_name.retain(|_, paths| paths.len() > 1);
        by_name
    }
}

impl<'a> IntoIterator for &'a TestUniverse {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.tests.iter()
    }
}

/// Discover all test functions in a directory tree
pub fn collect(root: &Path) -> ShardResult<TestUniverse> {
    TestUniverse::collect(root)
}

fn is_ignored(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') || name.starts_with('_') {
        return true;
    }
    entry.file_type().is_dir() && IGNORED_DIRS.contains(&&*name)
}

fn is_test_file(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.ends_with("_test.go") && !name.starts_with('.') && !name.starts_with('_')
}

/// Discover test functions in a single file
fn discover_tests_in_file(path: &Path) -> ShardResult<Vec<TestCase>> {
    let source = fs::read_to_string(path).map_err(|e| ShardError::read(path, e))?;

    let mut tests = Vec::new();
    let mut seen = HashSet::new();
    for (line, name) in test_declarations(&source) {
        // A repeated name is a compile error in Go; keep the first
        if seen.insert(name) {
            tests.push(TestCase::new(path, name, line));
        } else {
            tracing::debug!("{}:{}: duplicate declaration of {}", path.display(), line, name);
        }
    }

    Ok(tests)
}

/// Scan Go source for top-level test function declarations.
///
/// Declarations are expected at the start of a line, as gofmt leaves them,
/// with the whole parameter list on that line. Lines inside `/* ... */`
/// comments opened at the start of a line, and lines inside backtick raw
/// strings, are skipped.
pub fn test_declarations(source: &str) -> Vec<(usize, &str)> {
    let mut found = Vec::new();
    let mut in_comment = false;
    let mut in_raw_string = false;

    for (idx, line) in source.lines().enumerate() {
        if in_comment {
            in_comment = !line.contains("*/");
            continue;
        }
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") {
            continue;
        }
        let started_in_raw_string = in_raw_string;
        if line.matches('`').count() % 2 == 1 {
            in_raw_string = !in_raw_string;
        }
        if started_in_raw_string {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("/*") {
            in_comment = !rest.contains("*/");
            continue;
        }
        if let Some((name, params)) = declared_function(line) {
            if is_test_function(name, params) {
                found.push((idx + 1, name));
            }
        }
    }

    found
}

/// Name and parameter list of a plain function declared on this line.
/// Methods (`func (r T) Name(`) are not matched.
fn declared_function(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("func")?;
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return None;
    }
    let end = trimmed
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    let (name, tail) = trimmed.split_at(end);
    let params = tail.trim_start().strip_prefix('(')?;
    let close = params.find(')')?;
    if name.is_empty() {
        return None;
    }
    Some((name, &params[..close]))
}

/// Prefix `go test` recognizes, honoring Go's rule that the prefix is
/// followed by nothing or a non-lowercase rune
fn test_prefix(name: &str) -> Option<&'static str> {
    TEST_PREFIXES.into_iter().find(|prefix| {
        name.strip_prefix(prefix)
            .map(|suffix| suffix.chars().next().map_or(true, |c| !c.is_lowercase()))
            .unwrap_or(false)
    })
}

/// Name and signature both match what `go test` runs
fn is_test_function(name: &str, params: &str) -> bool {
    match test_prefix(name) {
        Some("Test") => name != "TestMain" && single_param_of_type(params, "*testing.T"),
        Some("Fuzz") => single_param_of_type(params, "*testing.F"),
        Some("Example") => params.trim().is_empty(),
        _ => false,
    }
}

/// `t *testing.T` or an unnamed `*testing.T`, and nothing else
fn single_param_of_type(params: &str, ty: &str) -> bool {
    if params.contains(',') {
        return false;
    }
    let tokens: Vec<&str> = params.split_whitespace().collect();
    match tokens.as_slice() {
        [only] => *only == ty,
        [_, only] => *only == ty,
        _ => false,
    }
}
