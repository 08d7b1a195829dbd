use futures::future::join_all;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use super::matcher::{ContentMatcher, MatchPattern};
use super::predicate::{evaluate, Verdict};
use super::traverse::{traverse, DirChild};
use crate::config::ScanConfig;
use crate::errors::{ScanError, ScanResult};
use crate::metrics::ScanMetrics;
use crate::reader::ThrottledReader;
use crate::results::{MatchList, ScanOutput};

/// Scans `root` with default settings and returns the matching file paths in
/// no particular order
pub async fn scan(
    root: impl AsRef<Path>,
    pattern: impl Into<MatchPattern>,
    extension: Option<&str>,
) -> ScanResult<Vec<PathBuf>> {
    Scanner::default().scan(root, pattern, extension).await
}

/// Aggregates matches over a whole directory tree.
///
/// The read gate is shared by every scan run on the same scanner; metrics are
/// kept per scan.
#[derive(Debug, Clone)]
pub struct Scanner {
    reader: ThrottledReader,
}

impl Scanner {
    /// Creates a scanner using the read limit and encoding of `config`
    pub fn new(config: &ScanConfig) -> Self {
        Self::with_reader(
            ThrottledReader::new(config.read_concurrency).encoding_mode(config.encoding_mode),
        )
    }

    /// Creates a scanner reading through `reader`
    pub fn with_reader(reader: ThrottledReader) -> Self {
        Self { reader }
    }

    /// Runs the scan configured by `config`.
    ///
    /// Fails with a configuration error when no pattern is set.
    pub async fn run(&self, config: &ScanConfig) -> ScanResult<ScanOutput> {
        let pattern = config
            .pattern
            .clone()
            .ok_or_else(|| ScanError::config_error("No pattern configured"))?;
        self.scan_output(&config.root_path, pattern, config.extension.as_deref())
            .await
    }

    /// Scans `root` and returns the sorted match list with the statistics of
    /// this scan
    pub async fn scan_output(
        &self,
        root: impl AsRef<Path>,
        pattern: impl Into<MatchPattern>,
        extension: Option<&str>,
    ) -> ScanResult<ScanOutput> {
        let started = Instant::now();
        let metrics = ScanMetrics::new();
        let matches = self
            .scan_with_metrics(root.as_ref(), pattern, extension, &metrics)
            .await?;
        Ok(ScanOutput {
            matches: MatchList::new(matches),
            stats: metrics.get_stats(),
            elapsed: started.elapsed(),
        })
    }

    /// Scans `root` and returns the matching file paths in no particular order.
    ///
    /// Every directory's files are tested concurrently; directory children are
    /// left to the traversal. The scan fails as a whole if any listing, stat or
    /// read fails, after all other work has finished.
    pub async fn scan(
        &self,
        root: impl AsRef<Path>,
        pattern: impl Into<MatchPattern>,
        extension: Option<&str>,
    ) -> ScanResult<Vec<PathBuf>> {
        self.scan_with_metrics(root.as_ref(), pattern, extension, &ScanMetrics::new())
            .await
    }

    async fn scan_with_metrics(
        &self,
        root: &Path,
        pattern: impl Into<MatchPattern>,
        extension: Option<&str>,
        metrics: &ScanMetrics,
    ) -> ScanResult<Vec<PathBuf>> {
        let matcher = ContentMatcher::new(pattern)?;
        info!(
            "Starting scan of {} with pattern {:?} (extension: {:?}, read limit: {})",
            root.display(),
            matcher.as_str(),
            extension,
            self.reader.limit()
        );

        // Clones share the semaphore, so the limit still spans concurrent scans
        let reader = self.reader.clone().metrics(metrics.clone());
        let found: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());
        traverse(root, |children| {
            match_children(children, &matcher, extension, &reader, metrics, &found)
        })
        .await?;

        let found = found.into_inner();
        metrics.log_stats();
        info!("Scan complete. Found {} matching files", found.len());
        Ok(found)
    }
}

/// Tests the non-directory children of one directory and appends matches
async fn match_children(
    children: Vec<DirChild>,
    matcher: &ContentMatcher,
    extension: Option<&str>,
    reader: &ThrottledReader,
    metrics: &ScanMetrics,
    found: &Mutex<Vec<PathBuf>>,
) -> ScanResult<()> {
    metrics.record_directory();

    let files: Vec<PathBuf> = children
        .into_iter()
        .filter(|child| !child.is_dir)
        .map(|child| child.path)
        .collect();

    let verdicts = join_all(
        files
            .iter()
            .map(|path| evaluate(path, matcher, extension, reader)),
    )
    .await;

    let mut matched = Vec::new();
    let mut first_error = None;
    for (path, verdict) in files.into_iter().zip(verdicts) {
        metrics.record_file_considered();
        match verdict {
            Ok(Verdict::Matched) => matched.push(path),
            Ok(Verdict::WrongExtension) => metrics.record_extension_rejection(),
            Ok(Verdict::NoMatch) => {}
            Err(e) => {
                debug!("Failed to test {}: {}", path.display(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }
    found.lock().extend(matched);
    Ok(())
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(&ScanConfig::default())
    }
}
