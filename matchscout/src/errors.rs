/// This module defines the error types for matchscout.
///
/// # Rust vs .NET Error Handling
///
/// A .NET scanner built on `Task.WhenAll` surfaces failures as an
/// `AggregateException` that callers have to unwrap:
/// ```csharp
/// try {
///     var matches = await scanner.ScanAsync(root, pattern);
/// } catch (AggregateException ex) when (ex.InnerException is UnauthorizedAccessException) {
///     // Handle permission error
/// }
/// ```
///
/// Here every stage returns a `ScanResult`, and the first failure of a
/// directory or file is what the scan reports:
/// ```rust,ignore
/// match scanner.scan(root, pattern, None).await {
///     Ok(matches) => // Process matches,
///     Err(ScanError::PermissionDenied(path)) => // Handle permission error,
///     Err(e) => // Handle other errors
/// }
/// ```
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur during a scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ScanError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::string::FromUtf8Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    /// Classifies an I/O error raised while touching `path`
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::file_not_found(path),
            io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// The path the error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::FileNotFound(path) | Self::PermissionDenied(path) => Some(path),
            Self::Io { path, .. } | Self::EncodingError { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<regex::Error> for ScanError {
    fn from(err: regex::Error) -> Self {
        Self::InvalidPattern(err.to_string())
    }
}

impl From<::config::ConfigError> for ScanError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}
