//! CLI configuration via environment variables
//!
//! Shard flags can all be set from `SHARD_*` variables (handled by clap);
//! this module covers the settings that have no flag.

use colored::*;
use std::env;
use tracing_subscriber::EnvFilter;

/// Log filter used when neither `SHARD_LOG` nor `--verbose` is given
const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "debug";

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Log filter directives (SHARD_LOG=debug, SHARD_LOG=shard_core=info)
    pub log_filter: Option<String>,
    /// Disable colored output (SHARD_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            log_filter: env::var("SHARD_LOG").ok().filter(|v| !v.trim().is_empty()),
            no_color: env::var("SHARD_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok(),
        }
    }

    /// Filter directives to log with.
    ///
    /// Returns:
    /// 1. `debug` when `--verbose` is passed
    /// 2. SHARD_LOG if set
    /// 3. `warn` otherwise
    pub fn filter_directives(&self, verbose: bool) -> &str {
        if verbose {
            return VERBOSE_FILTER;
        }
        self.log_filter.as_deref().unwrap_or(DEFAULT_FILTER)
    }

    /// Build the log filter. An unparseable SHARD_LOG falls back to `warn`
    /// and the second value carries a warning for the user.
    pub fn env_filter(&self, verbose: bool) -> (EnvFilter, Option<String>) {
        let directives = self.filter_directives(verbose);
        match EnvFilter::try_new(directives) {
            Ok(filter) => (filter, None),
            Err(e) => (
                EnvFilter::new(DEFAULT_FILTER),
                Some(format!(
                    "invalid SHARD_LOG filter '{}' ({}), using '{}'",
                    directives, e, DEFAULT_FILTER
                )),
            ),
        }
    }

    /// Install the stderr log subscriber and apply color settings.
    /// Stdout is reserved for the shard selection.
    pub fn init(&self, verbose: bool) {
        if self.no_color {
            colored::control::set_override(false);
        }

        let (filter, warning) = self.env_filter(verbose);
        if let Some(warning) = warning {
            eprintln!("shard: {} {}", "warning:".yellow().bold(), warning);
        }
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(!self.no_color)
            .with_target(false)
            .without_time()
            .init();
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
