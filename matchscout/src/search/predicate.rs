use std::path::Path;
use tracing::trace;

use super::matcher::ContentMatcher;
use crate::errors::ScanResult;
use crate::filters::has_valid_extension;
use crate::reader::ThrottledReader;

/// Outcome of testing one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Extension filter rejected the path; the file was not read
    WrongExtension,
    /// Content was read and the pattern matched
    Matched,
    /// Content was read and the pattern did not match
    NoMatch,
}

impl Verdict {
    pub fn is_match(self) -> bool {
        self == Verdict::Matched
    }
}

/// Tests one file against the extension filter and then its content.
///
/// The extension check runs first and never touches the filesystem. Only a
/// path that passes it is read, through `reader`. Read failures are returned
/// for this path alone.
pub async fn evaluate(
    path: &Path,
    matcher: &ContentMatcher,
    extension: Option<&str>,
    reader: &ThrottledReader,
) -> ScanResult<Verdict> {
    if !has_valid_extension(path, extension) {
        trace!("Skipping by extension: {}", path.display());
        return Ok(Verdict::WrongExtension);
    }

    let content = reader.read(path).await?;
    if matcher.is_match(&content) {
        trace!("Match in file: {}", path.display());
        Ok(Verdict::Matched)
    } else {
        Ok(Verdict::NoMatch)
    }
}

/// Returns whether `path` qualifies as a match
pub async fn matches(
    path: &Path,
    matcher: &ContentMatcher,
    extension: Option<&str>,
    reader: &ThrottledReader,
) -> ScanResult<bool> {
    evaluate(path, matcher, extension, reader)
        .await
        .map(Verdict::is_match)
}
