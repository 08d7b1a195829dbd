/// This module holds the results of a scan.
///
/// The engine collects matches in whatever order directories finish. A
/// [`MatchList`] fixes that: it owns the paths as strings sorted in ascending
/// lexicographic order, which is also the order they are written out in.
///
/// ```rust,ignore
/// let list = MatchList::new(scanner.scan("site", "<title>", Some(".html")).await?);
/// list.write_json("matches.json")?;
/// ```
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::errors::{ScanError, ScanResult};
use crate::metrics::ScanStats;

/// Matching file paths, sorted ascending by their string form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchList {
    paths: Vec<String>,
}

impl MatchList {
    /// Builds a sorted list from unordered scan output.
    ///
    /// Paths that are not valid UTF-8 are kept with U+FFFD in place of the
    /// invalid bytes and reported with a warning.
    pub fn new(matches: Vec<PathBuf>) -> Self {
        let mut paths: Vec<String> = matches.into_iter().map(path_to_string).collect();
        paths.sort();
        Self { paths }
    }

    /// The sorted paths
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Renders the list as a JSON array indented with two spaces
    pub fn to_json(&self) -> ScanResult<String> {
        Ok(serde_json::to_string_pretty(&self.paths)?)
    }

    /// Writes the JSON array to `path`, replacing any existing file
    pub fn write_json(&self, path: impl AsRef<Path>) -> ScanResult<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| ScanError::from_io(path, e))
    }
}

fn path_to_string(path: PathBuf) -> String {
    match path.into_os_string().into_string() {
        Ok(text) => text,
        Err(raw) => {
            let lossy = raw.to_string_lossy().into_owned();
            warn!("Match path is not valid UTF-8, written as {}", lossy);
            lossy
        }
    }
}

impl IntoIterator for MatchList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

/// Everything a completed scan produced
#[derive(Debug, Clone)]
pub struct ScanOutput {
    /// Sorted matching paths
    pub matches: MatchList,
    /// Activity counters of this scan alone
    pub stats: ScanStats,
    /// Wall-clock duration of the scan
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sorted_by_string() {
        let list = MatchList::new(vec![
            PathBuf::from("root/b.html"),
            PathBuf::from("root/a/z.html"),
            PathBuf::from("root/a.html"),
        ]);
        // '.' sorts before '/'
        assert_eq!(
            list.paths(),
            &["root/a.html", "root/a/z.html", "root/b.html"]
        );
    }

    #[test]
    fn test_json_format() {
        let list = MatchList::new(vec![PathBuf::from("b.html"), PathBuf::from("a.html")]);
        assert_eq!(list.to_json().unwrap(), "[\n  \"a.html\",\n  \"b.html\"\n]");

        let empty = MatchList::default();
        assert!(empty.is_empty());
        assert_eq!(empty.to_json().unwrap(), "[]");
    }

    #[test]
    fn test_write_json() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("matches.json");
        std::fs::write(&out, "stale").unwrap();

        let list = MatchList::new(vec![PathBuf::from("x/one.txt")]);
        list.write_json(&out).unwrap();

        let written: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written, vec!["x/one.txt".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_is_replaced() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let raw = PathBuf::from(OsStr::from_bytes(b"dir/caf\xe9.txt"));
        let list = MatchList::new(vec![raw, PathBuf::from("dir/a.txt")]);
        assert_eq!(list.paths(), &["dir/a.txt", "dir/caf\u{FFFD}.txt"]);
    }

    #[test]
    fn test_write_json_missing_directory() {
        let dir = tempdir().unwrap();
        let list = MatchList::default();
        let err = list
            .write_json(dir.path().join("no/such/dir/out.json"))
            .unwrap_err();
        assert!(matches!(err, ScanError::FileNotFound(_)));
    }
}
