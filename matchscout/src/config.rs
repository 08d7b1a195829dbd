use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Maximum number of file reads in flight when nothing else is configured
pub const DEFAULT_READ_CONCURRENCY: usize = 200;

/// How invalid UTF-8 in a file's content is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Fail the read with an encoding error
    FailFast,
    /// Replace invalid sequences with U+FFFD and keep going
    #[default]
    Lossy,
}

/// Configuration for a scan.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.matchscout.yaml` in the current directory
/// 3. Global `$HOME/.config/matchscout/config.yaml`
///
/// # Configuration Format
///
/// ```yaml
/// # Content pattern (regular expression syntax)
/// pattern: "<title>"
///
/// # Directory the scan starts from
/// root_path: "./site"
///
/// # Only content-test files with this suffix
/// extension: ".html"
///
/// # Where the sorted JSON list is written
/// write_file_path: "matches.json"
///
/// # Maximum simultaneous file reads
/// read_concurrency: 200
///
/// # Invalid UTF-8 handling (failfast|lossy)
/// encoding_mode: "lossy"
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// Command-line arguments take precedence over config file values, see
/// [`ScanConfig::merge_with_cli`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory the scan starts from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Content pattern, compiled as a regular expression with no flags
    #[serde(default)]
    pub pattern: Option<String>,

    /// Optional file suffix filter such as ".html"
    /// If None, every file is content-tested
    #[serde(default)]
    pub extension: Option<String>,

    /// Output location of the JSON match list
    #[serde(default = "default_write_file_path")]
    pub write_file_path: PathBuf,

    /// Upper bound on simultaneously outstanding file reads
    #[serde(default = "default_read_concurrency")]
    pub read_concurrency: NonZeroUsize,

    /// How invalid UTF-8 content is decoded
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_write_file_path() -> PathBuf {
    PathBuf::from("matches.json")
}

pub(crate) fn default_read_concurrency() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_READ_CONCURRENCY).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            pattern: None,
            extension: None,
            write_file_path: default_write_file_path(),
            read_concurrency: default_read_concurrency(),
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from a specific file layered over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("matchscout/config.yaml")),
            Some(PathBuf::from(".matchscout.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values.
    ///
    /// A CLI value equal to the built-in default does not override the file.
    /// `encoding_mode` is not merged; callers apply an explicit mode themselves.
    pub fn merge_with_cli(mut self, cli_config: ScanConfig) -> Self {
        if cli_config.pattern.is_some() {
            self.pattern = cli_config.pattern;
        }
        if cli_config.root_path != default_root_path() {
            self.root_path = cli_config.root_path;
        }
        if cli_config.extension.is_some() {
            self.extension = cli_config.extension;
        }
        if cli_config.write_file_path != default_write_file_path() {
            self.write_file_path = cli_config.write_file_path;
        }
        if cli_config.read_concurrency != default_read_concurrency() {
            self.read_concurrency = cli_config.read_concurrency;
        }
        if cli_config.log_level != default_log_level() {
            self.log_level = cli_config.log_level;
        }
        self
    }
}
