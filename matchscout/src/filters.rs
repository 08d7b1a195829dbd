//! Path-only filters applied before any file content is read.
use std::path::Path;

/// Returns the extension of `path` with its leading dot (".html"), or an empty
/// string when the file name has none. Dotfiles such as ".bashrc" have no
/// extension.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Checks whether `path` passes the optional extension filter.
///
/// The comparison is exact and case-sensitive. A filter given without its
/// leading dot ("html") is treated as ".html".
pub fn has_valid_extension(path: &Path, extension: Option<&str>) -> bool {
    match extension {
        None => true,
        Some(wanted) => {
            let actual = dotted_extension(path);
            match wanted.strip_prefix('.') {
                Some(_) => actual == wanted,
                None => actual.strip_prefix('.') == Some(wanted),
            }
        }
    }
}
