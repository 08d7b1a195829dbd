use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, trace};

/// Tracks traversal and read activity for a scan
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // Traversal metrics
    directories_visited: Arc<AtomicU64>,
    files_considered: Arc<AtomicU64>,
    extension_rejections: Arc<AtomicU64>,

    // Read metrics
    reads_completed: Arc<AtomicU64>,
    reads_failed: Arc<AtomicU64>,
    reads_in_flight: Arc<AtomicU64>,
    peak_reads_in_flight: Arc<AtomicU64>,
    bytes_read: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self {
            directories_visited: Arc::new(AtomicU64::new(0)),
            files_considered: Arc::new(AtomicU64::new(0)),
            extension_rejections: Arc::new(AtomicU64::new(0)),
            reads_completed: Arc::new(AtomicU64::new(0)),
            reads_failed: Arc::new(AtomicU64::new(0)),
            reads_in_flight: Arc::new(AtomicU64::new(0)),
            peak_reads_in_flight: Arc::new(AtomicU64::new(0)),
            bytes_read: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a directory whose children were listed
    pub fn record_directory(&self) {
        self.directories_visited.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file handed to the match predicate
    pub fn record_file_considered(&self) {
        self.files_considered.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file rejected by the extension filter without a read
    pub fn record_extension_rejection(&self) {
        self.extension_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the start of an underlying read, updating the in-flight peak
    pub fn record_read_start(&self) {
        let current = self.reads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let mut peak = self.peak_reads_in_flight.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_reads_in_flight.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => peak = actual,
            }
        }
    }

    /// Records the end of an underlying read
    pub fn record_read_end(&self, bytes: Option<u64>) {
        self.reads_in_flight.fetch_sub(1, Ordering::SeqCst);
        match bytes {
            Some(bytes) => {
                self.reads_completed.fetch_add(1, Ordering::Relaxed);
                self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
            }
            None => {
                self.reads_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        trace!(
            in_flight = self.reads_in_flight.load(Ordering::Relaxed),
            "Read finished"
        );
    }

    /// Number of reads currently outstanding
    pub fn reads_in_flight(&self) -> u64 {
        self.reads_in_flight.load(Ordering::SeqCst)
    }

    /// Gets current statistics
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            directories_visited: self.directories_visited.load(Ordering::Relaxed),
            files_considered: self.files_considered.load(Ordering::Relaxed),
            extension_rejections: self.extension_rejections.load(Ordering::Relaxed),
            reads_completed: self.reads_completed.load(Ordering::Relaxed),
            reads_failed: self.reads_failed.load(Ordering::Relaxed),
            peak_reads_in_flight: self.peak_reads_in_flight.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
        }
    }

    /// Logs current statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Directories visited: {}\n\
             Files considered: {}\n\
             Rejected by extension: {}\n\
             Reads completed/failed: {}/{}\n\
             Peak reads in flight: {}\n\
             Bytes read: {}",
            stats.directories_visited,
            stats.files_considered,
            stats.extension_rejections,
            stats.reads_completed,
            stats.reads_failed,
            stats.peak_reads_in_flight,
            stats.bytes_read
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of scan activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub directories_visited: u64,
    pub files_considered: u64,
    pub extension_rejections: u64,
    pub reads_completed: u64,
    pub reads_failed: u64,
    pub peak_reads_in_flight: u64,
    pub bytes_read: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_tracking() {
        let metrics = ScanMetrics::new();

        metrics.record_read_start();
        metrics.record_read_start();
        metrics.record_read_start();
        assert_eq!(metrics.reads_in_flight(), 3);

        metrics.record_read_end(Some(10));
        metrics.record_read_end(None);
        metrics.record_read_start();

        let stats = metrics.get_stats();
        assert_eq!(metrics.reads_in_flight(), 2);
        assert_eq!(stats.peak_reads_in_flight, 3); // Peak should remain unchanged
        assert_eq!(stats.reads_completed, 1);
        assert_eq!(stats.reads_failed, 1);
        assert_eq!(stats.bytes_read, 10);
    }

    #[test]
    fn test_traversal_counters() {
        let metrics = ScanMetrics::new();

        metrics.record_directory();
        metrics.record_directory();
        metrics.record_file_considered();
        metrics.record_file_considered();
        metrics.record_file_considered();
        metrics.record_extension_rejection();

        let stats = metrics.get_stats();
        assert_eq!(stats.directories_visited, 2);
        assert_eq!(stats.files_considered, 3);
        assert_eq!(stats.extension_rejections, 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = ScanMetrics::new();
        let clone = metrics.clone();

        clone.record_directory();
        assert_eq!(metrics.get_stats().directories_visited, 1);
    }
}
