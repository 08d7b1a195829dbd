use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use matchscout::{EncodingMode, ScanConfig, ScanOutput, Scanner};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Content pattern (regular expression syntax, no flags)
    #[arg(short = 'p', long)]
    pattern: Option<String>,

    /// Root directory to scan
    #[arg(short = 'd', long, default_value = ".")]
    root: PathBuf,

    /// Only content-test files with this suffix (e.g. .html)
    #[arg(short = 'e', long)]
    extension: Option<String>,

    /// Where to write the sorted JSON list of matches
    #[arg(short = 'o', long, default_value = "matches.json")]
    output: PathBuf,

    /// Maximum number of file reads in flight
    #[arg(short = 'j', long)]
    read_concurrency: Option<NonZeroUsize>,

    /// How to handle invalid UTF-8 sequences [default: lossy]
    #[arg(long, value_enum)]
    encoding: Option<EncodingArg>,

    /// Configuration file layered over the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print only the number of matches instead of every path
    #[arg(short, long)]
    stats: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EncodingArg {
    /// Fail the scan on the first file that is not valid UTF-8
    #[value(name = "failfast", alias = "fail-fast")]
    FailFast,
    /// Replace invalid sequences and keep going
    Lossy,
}

impl From<EncodingArg> for EncodingMode {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::FailFast => EncodingMode::FailFast,
            EncodingArg::Lossy => EncodingMode::Lossy,
        }
    }
}

impl Cli {
    fn to_config(&self) -> ScanConfig {
        let defaults = ScanConfig::default();
        ScanConfig {
            root_path: self.root.clone(),
            pattern: self.pattern.clone(),
            extension: self.extension.clone(),
            write_file_path: self.output.clone(),
            read_concurrency: self.read_concurrency.unwrap_or(defaults.read_concurrency),
            encoding_mode: self.encoding.map(EncodingMode::from).unwrap_or_default(),
            log_level: self.log_level.clone(),
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ScanConfig::load_from(Some(path))
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ScanConfig::load().context("Failed to load config")?,
    }
    .merge_with_cli(cli.to_config());
    // An explicit flag wins even when it names the default mode
    if let Some(encoding) = cli.encoding {
        config.encoding_mode = encoding.into();
    }

    init_tracing(&config.log_level);
    run(&config, cli.stats).await
}

async fn run(config: &ScanConfig, stats_only: bool) -> Result<()> {
    let scanner = Scanner::new(config);
    let output = scanner
        .run(config)
        .await
        .with_context(|| format!("Scan of {} failed", config.root_path.display()))?;

    output
        .matches
        .write_json(&config.write_file_path)
        .with_context(|| format!("Failed to write {}", config.write_file_path.display()))?;

    info!(
        "Scanned {} in {:.2?}, wrote {} matches to {}",
        config.root_path.display(),
        output.elapsed,
        output.matches.len(),
        config.write_file_path.display()
    );
    print_scan_results(&output, config, stats_only);
    Ok(())
}

fn print_scan_results(output: &ScanOutput, config: &ScanConfig, stats_only: bool) {
    if !stats_only {
        for path in output.matches.paths() {
            println!("{}", path.blue());
        }
    }

    println!(
        "Found {} matching files in {} files considered ({} directories) in {:.2?}",
        output.matches.len(),
        output.stats.files_considered,
        output.stats.directories_visited,
        output.elapsed
    );
    println!(
        "Wrote {}",
        config.write_file_path.display().to_string().green()
    );
}
