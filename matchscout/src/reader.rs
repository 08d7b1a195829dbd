//! Concurrency-limited file content reads.
//!
//! Every content read in a scan goes through a [`ThrottledReader`]. The reader
//! holds a fair semaphore with `limit` permits: a read acquires a permit before
//! touching the file and gives it back when the read finishes, whether it
//! succeeded or not. Requests beyond the limit queue up and are granted in the
//! order they arrived.
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{trace, warn};

use crate::config::{default_read_concurrency, EncodingMode};
use crate::errors::{ScanError, ScanResult};
use crate::metrics::ScanMetrics;

/// Raw byte source behind the reader.
///
/// [`FsSource`] reads from the filesystem; tests plug in instrumented sources
/// to observe how many reads are outstanding.
pub trait ContentSource: Send + Sync {
    fn read<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<Vec<u8>>>;
}

/// Reads whole files through tokio's filesystem API
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl ContentSource for FsSource {
    fn read<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<Vec<u8>>> {
        tokio::fs::read(path).boxed()
    }
}

/// Decodes file bytes into a String according to the encoding mode
fn decode_bytes(bytes: Vec<u8>, path: &Path, encoding_mode: EncodingMode) -> ScanResult<String> {
    match encoding_mode {
        EncodingMode::FailFast => {
            String::from_utf8(bytes).map_err(|e| ScanError::encoding_error(path, e))
        }
        EncodingMode::Lossy => match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("Invalid UTF-8 replaced in file: {}", path.display());
                Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        },
    }
}

/// Bounded-concurrency wrapper over a [`ContentSource`]
#[derive(Clone)]
pub struct ThrottledReader {
    source: Arc<dyn ContentSource>,
    permits: Arc<Semaphore>,
    limit: usize,
    encoding_mode: EncodingMode,
    metrics: ScanMetrics,
}

impl ThrottledReader {
    /// Creates a filesystem reader allowing `limit` reads in flight
    pub fn new(limit: NonZeroUsize) -> Self {
        Self::with_source(Arc::new(FsSource), limit)
    }

    /// Creates a reader over a custom byte source
    pub fn with_source(source: Arc<dyn ContentSource>, limit: NonZeroUsize) -> Self {
        let limit = limit.get().min(Semaphore::MAX_PERMITS);
        Self {
            source,
            permits: Arc::new(Semaphore::new(limit)),
            limit,
            encoding_mode: EncodingMode::default(),
            metrics: ScanMetrics::new(),
        }
    }

    /// Sets how invalid UTF-8 is handled
    pub fn encoding_mode(mut self, encoding_mode: EncodingMode) -> Self {
        self.encoding_mode = encoding_mode;
        self
    }

    /// Reports reads into the given metrics
    pub fn metrics(mut self, metrics: ScanMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// The concurrency ceiling
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of requests currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.limit - self.permits.available_permits()
    }

    /// Reads the full content of `path` as text, waiting for a free slot first.
    ///
    /// I/O failures are returned as-is (classified by kind); nothing is retried.
    pub async fn read(&self, path: &Path) -> ScanResult<String> {
        let bytes = {
            // The semaphore is never closed while the reader is alive
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| ScanError::config_error("read gate closed"))?;

            trace!("Reading file: {}", path.display());
            self.metrics.record_read_start();
            let result = self.source.read(path).await;
            self.metrics
                .record_read_end(result.as_ref().ok().map(|b| b.len() as u64));
            result.map_err(|e| ScanError::from_io(path, e))?
        };

        decode_bytes(bytes, path, self.encoding_mode)
    }
}

impl Default for ThrottledReader {
    fn default() -> Self {
        Self::new(default_read_concurrency())
    }
}

impl fmt::Debug for ThrottledReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrottledReader")
            .field("limit", &self.limit)
            .field("in_flight", &self.in_flight())
            .field("encoding_mode", &self.encoding_mode)
            .finish()
    }
}
