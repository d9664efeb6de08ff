/// Shard planning error types
use std::path::PathBuf;
use thiserror::Error;

pub type ShardResult<T> = Result<T, ShardError>;

#[derive(Debug, Error)]
pub enum ShardError {
    /// Caller misuse: missing or inconsistent shard parameters
    #[error("{0}")]
    Configuration(String),

    #[error("Invalid exclude pattern '{pattern}': {error}")]
    InvalidExclude {
        pattern: String,
        error: regex::Error,
    },

    #[error("Root directory not found: {}", .path.display())]
    RootNotFound { path: PathBuf },

    #[error("Root is not a directory: {}", .path.display())]
    RootNotDirectory { path: PathBuf },

    #[error("Failed to walk {}: {}", .root.display(), .error)]
    Walk {
        root: PathBuf,
        error: walkdir::Error,
    },

    #[error("Failed to read {}: {}", .path.display(), .error)]
    Read {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl ShardError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a read error with path context
    pub fn read(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            error,
        }
    }

    /// True for errors caused by invalid caller input rather than the file system
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::InvalidExclude { .. }
        )
    }

    /// True for errors raised while discovering tests
    pub fn is_discovery(&self) -> bool {
        matches!(
            self,
            Self::RootNotFound { .. }
                | Self::RootNotDirectory { .. }
                | Self::Walk { .. }
                | Self::Read { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message_is_verbatim() {
        let err = ShardError::configuration("index is required");
        assert_eq!(err.to_string(), "index is required");
        assert!(err.is_configuration());
        assert!(!err.is_discovery());
    }

    #[test]
    fn test_root_not_found_mentions_path() {
        let err = ShardError::RootNotFound {
            path: PathBuf::from("/no/such/dir"),
        };
        assert!(err.to_string().contains("/no/such/dir"));
        assert!(err.is_discovery());
    }

    #[test]
    fn test_read_error_kind() {
        let err = ShardError::read(
            "a_test.go",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_discovery());
        assert!(err.to_string().starts_with("Failed to read a_test.go"));
    }
}
