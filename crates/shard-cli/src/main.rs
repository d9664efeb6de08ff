use anyhow::Result;
use clap::Parser;
use colored::*;
use shard_core::{plan, OutputFormat, ShardOptions};
use std::path::PathBuf;
use std::process::ExitCode;

mod config;

/// Flags that may also be spelled Go-style with a single dash (`-index 2`)
const LONG_FLAGS: [&str; 9] = [
    "root", "index", "total", "seed", "output", "exclude", "verbose", "help", "version",
];

/// Split a Go test suite across parallel CI workers.
///
/// Finds Test, Fuzz and Example functions in *_test.go files under a root
/// directory, assigns them to shards and prints the slice for one shard.
///
/// EXAMPLES:
///     shard -index 0 -total 4                       Print `-run` arguments for shard 0
///     shard -index 1 -total 4 -output env           Print SHARD_TESTS/SHARD_PATHS
///     shard -index 2 -total 4 -seed 7 -root ./svc   Shuffle with seed 7 first
///
/// OUTPUT:
///     A `-run` selector matching the shard's test names, followed by the
///     *_test.go files that declare them. The files are listed for runners
///     that accept file lists; `go test` itself wants package paths, so pass
///     the selector (SHARD_TESTS with `-output env`) and your own packages.
///
/// ENVIRONMENT VARIABLES:
///     SHARD_INDEX, SHARD_TOTAL, SHARD_SEED, SHARD_ROOT, SHARD_OUTPUT, SHARD_EXCLUDE
///                       Defaults for the matching flags
///     SHARD_LOG         Log filter for stderr diagnostics (default: warn)
///     NO_COLOR          Set to disable colored output
#[derive(Parser, Debug)]
#[command(name = "shard")]
#[command(version)]
struct Cli {
    /// Directory to search for tests
    #[arg(long, env = "SHARD_ROOT", default_value = ".")]
    root: PathBuf,
    /// Shard index to collect tests for, starting at 0
    #[arg(long, env = "SHARD_INDEX", default_value_t = -1, allow_negative_numbers = true)]
    index: i64,
    /// Total number of shards
    #[arg(long, env = "SHARD_TOTAL", default_value_t = -1, allow_negative_numbers = true)]
    total: i64,
    /// Randomly shuffle tests using this seed (0 keeps discovery order)
    #[arg(long, env = "SHARD_SEED", default_value_t = 0, allow_negative_numbers = true)]
    seed: i64,
    /// Output format
    #[arg(long, env = "SHARD_OUTPUT", default_value = "default", value_parser = ["default", "env", "json"])]
    output: String,
    /// Exclude paths matching this pattern from the output
    #[arg(long, env = "SHARD_EXCLUDE", default_value = "")]
    exclude: String,
    /// Log discovery and assignment details to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> ShardOptions {
        ShardOptions::new(self.index, self.total)
            .with_root(&self.root)
            .with_seed(self.seed)
            .with_exclude(&self.exclude)
    }
}

/// Rewrite Go-style `-flag` and `-flag=value` into `--flag` forms clap accepts.
/// Values (including negative numbers) and arguments after `--` are untouched.
fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Vec::new();
    let mut passthrough = false;

    for arg in args {
        if passthrough || arg == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }
        let rewritten = arg
            .strip_prefix('-')
            .filter(|rest| !rest.starts_with('-'))
            .filter(|&rest| {
                let name = rest.split('=').next().unwrap_or(rest);
                LONG_FLAGS.contains(&name)
            })
            .map(|rest| format!("--{}", rest));
        out.push(rewritten.unwrap_or(arg));
    }

    out
}

fn run(cli: &Cli) -> Result<String> {
    let format: OutputFormat = cli.output.parse()?;
    let selection = plan(&cli.options())?;
    if selection.fallback {
        tracing::info!("no tests to run on shard {}", selection.index);
    }
    Ok(selection.render(format)?)
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args()));
    let cli_config = config::Config::from_env();
    cli_config.init(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("shard: {} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn parse(list: &[&str]) -> Cli {
        Cli::parse_from(normalize_args(args(list)))
    }

    #[test]
    fn test_normalize_single_dash_flags() {
        assert_eq!(
            normalize_args(args(&["shard", "-index", "1", "-total=3", "-v"])),
            args(&["shard", "--index", "1", "--total=3", "-v"])
        );
    }

    #[test]
    fn test_normalize_leaves_values_alone() {
        assert_eq!(
            normalize_args(args(&["shard", "-seed", "-5", "-exclude", "-integration"])),
            args(&["shard", "--seed", "-5", "--exclude", "-integration"])
        );
        assert_eq!(
            normalize_args(args(&["shard", "--index", "0", "--", "-total"])),
            args(&["shard", "--index", "0", "--", "-total"])
        );
    }

    #[test]
    fn test_cli_defaults() {
        let cli = parse(&["shard"]);
        assert_eq!(cli.root, PathBuf::from("."));
        assert_eq!(cli.index, -1);
        assert_eq!(cli.total, -1);
        assert_eq!(cli.seed, 0);
        assert_eq!(cli.output, "default");
        assert!(cli.exclude.is_empty());
    }

    #[test]
    fn test_cli_go_style() {
        let cli = parse(&["shard", "-index", "2", "-total", "5", "-seed", "-9", "-output", "env"]);
        assert_eq!(cli.index, 2);
        assert_eq!(cli.total, 5);
        assert_eq!(cli.seed, -9);
        assert_eq!(cli.output, "env");
    }

    #[test]
    fn test_cli_gnu_style() {
        let cli = parse(&["shard", "--index=0", "--total=2", "--root", "src", "--exclude", "vendor"]);
        assert_eq!(cli.index, 0);
        assert_eq!(cli.total, 2);
        assert_eq!(cli.root, PathBuf::from("src"));
        assert_eq!(cli.exclude, "vendor");
    }

    #[test]
    fn test_cli_rejects_unknown_output() {
        let result = Cli::try_parse_from(normalize_args(args(&["shard", "-output", "yaml"])));
        assert!(result.is_err());
    }

    #[test]
    fn test_run_requires_index() {
        let cli = parse(&["shard", "-total", "2"]);
        let err = run(&cli).unwrap_err();
        assert_eq!(err.to_string(), "index is required");
    }
}
