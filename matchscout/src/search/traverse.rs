use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::errors::{ScanError, ScanResult};

/// An immediate child of a visited directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirChild {
    /// Parent path joined with the entry name
    pub path: PathBuf,
    /// Whether the child resolved to a directory (symlinks are followed)
    pub is_dir: bool,
}

/// Children of one directory plus the children whose type could not be resolved
struct Listing {
    children: Vec<DirChild>,
    failures: Vec<ScanError>,
}

/// Walks the tree under `root`, calling `on_directory` once per directory with
/// its immediate children (files and sub-directories mixed, in listing order).
///
/// A root that is not a directory completes immediately without a callback.
/// For every directory, the callback future and the traversal of each
/// sub-directory run concurrently. The returned future completes once all of
/// them have completed; if any failed, the first failure is returned.
pub async fn traverse<F, Fut>(root: &Path, on_directory: F) -> ScanResult<()>
where
    F: Fn(Vec<DirChild>) -> Fut + Sync,
    Fut: Future<Output = ScanResult<()>> + Send,
{
    let metadata = fs::metadata(root)
        .await
        .map_err(|e| ScanError::from_io(root, e))?;

    if !metadata.is_dir() {
        debug!("Root is not a directory: {}", root.display());
        return Ok(());
    }

    visit_directory(root.to_path_buf(), &on_directory).await
}

fn visit_directory<'a, F, Fut>(dir: PathBuf, on_directory: &'a F) -> BoxFuture<'a, ScanResult<()>>
where
    F: Fn(Vec<DirChild>) -> Fut + Sync,
    Fut: Future<Output = ScanResult<()>> + Send + 'a,
{
    async move {
        let Listing { children, failures } = list_children(&dir).await?;
        debug!(
            "Visiting {} with {} children",
            dir.display(),
            children.len()
        );

        let subdirs: Vec<PathBuf> = children
            .iter()
            .filter(|child| child.is_dir)
            .map(|child| child.path.clone())
            .collect();

        let callback = on_directory(children);
        let subtrees = join_all(
            subdirs
                .into_iter()
                .map(|subdir| visit_directory(subdir, on_directory)),
        );
        let (callback_result, subtree_results) = futures::join!(callback, subtrees);

        if let Some(err) = failures.into_iter().next() {
            return Err(err);
        }
        callback_result?;
        subtree_results.into_iter().collect::<ScanResult<()>>()
    }
    .boxed()
}

/// Lists `dir` and resolves each child's directory-ness.
///
/// Failing to open or read the listing fails the directory. A child whose
/// type cannot be resolved (a dangling symlink, or an entry removed after the
/// listing) is still reported, as a non-directory, and its error is kept so
/// the directory fails once its other work has finished.
async fn list_children(dir: &Path) -> ScanResult<Listing> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| ScanError::from_io(dir, e))?;

    let mut children = Vec::new();
    let mut failures = Vec::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ScanError::from_io(dir, e))?
    {
        let path = dir.join(entry.file_name());
        let is_dir = match entry.file_type().await {
            Ok(file_type) if file_type.is_symlink() => fs::metadata(&path)
                .await
                .map(|metadata| metadata.is_dir()),
            Ok(file_type) => Ok(file_type.is_dir()),
            Err(e) => Err(e),
        };

        match is_dir {
            Ok(is_dir) => children.push(DirChild { path, is_dir }),
            Err(e) => {
                failures.push(ScanError::from_io(&path, e));
                children.push(DirChild {
                    path,
                    is_dir: false,
                });
            }
        }
    }

    Ok(Listing { children, failures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::BTreeSet;
    use std::fs as std_fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    fn build_tree(root: &Path) {
        std_fs::create_dir_all(root.join("a/b/c")).unwrap();
        std_fs::create_dir_all(root.join("d")).unwrap();
        std_fs::write(root.join("top.txt"), "x").unwrap();
        std_fs::write(root.join("a/one.txt"), "x").unwrap();
        std_fs::write(root.join("a/b/two.txt"), "x").unwrap();
        std_fs::write(root.join("a/b/c/three.txt"), "x").unwrap();
    }

    #[tokio::test]
    async fn test_callback_once_per_directory() {
        let dir = tempdir().unwrap();
        build_tree(dir.path());

        let seen: Mutex<Vec<Vec<DirChild>>> = Mutex::new(Vec::new());
        traverse(dir.path(), |children| {
            let seen = &seen;
            async move {
                seen.lock().push(children);
                Ok(())
            }
        })
        .await
        .unwrap();

        let seen = seen.into_inner();
        // root, a, a/b, a/b/c, d
        assert_eq!(seen.len(), 5);

        let all: BTreeSet<PathBuf> = seen.iter().flatten().map(|c| c.path.clone()).collect();
        let expected: BTreeSet<PathBuf> = [
            "a", "d", "top.txt", "a/one.txt", "a/b", "a/b/two.txt", "a/b/c", "a/b/c/three.txt",
        ]
        .iter()
        .map(|p| dir.path().join(p))
        .collect();
        assert_eq!(all, expected);

        let dirs: BTreeSet<PathBuf> = seen
            .iter()
            .flatten()
            .filter(|c| c.is_dir)
            .map(|c| c.path.clone())
            .collect();
        assert_eq!(dirs.len(), 4);
        assert!(dirs.contains(&dir.path().join("a/b/c")));
    }

    #[tokio::test]
    async fn test_non_directory_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("single.txt");
        std_fs::write(&file, "x").unwrap();

        let calls = AtomicUsize::new(0);
        traverse(&file, |_children| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_root_fails() {
        let dir = tempdir().unwrap();
        let err = traverse(&dir.path().join("nope"), |_children| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_waits_for_callbacks_and_subtrees() {
        let dir = tempdir().unwrap();
        build_tree(dir.path());

        let finished = AtomicUsize::new(0);
        traverse(dir.path(), |_children| {
            let finished = &finished;
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert_eq!(finished.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_failure_surfaces_after_siblings_complete() {
        let dir = tempdir().unwrap();
        build_tree(dir.path());

        let failing = dir.path().join("a");
        let completed = AtomicUsize::new(0);
        let result = traverse(dir.path(), |children| {
            let completed = &completed;
            let fail = children
                .iter()
                .any(|c| c.path.parent() == Some(failing.as_path()));
            async move {
                if fail {
                    return Err(ScanError::config_error("callback failed"));
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert!(matches!(result, Err(ScanError::ConfigError(_))));
        // root, a/b, a/b/c and d still ran to completion
        assert_eq!(completed.load(Ordering::SeqCst), 4);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_symlink_fails_after_listing() {
        let dir = tempdir().unwrap();
        std_fs::write(dir.path().join("real.txt"), "x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("link")).unwrap();

        let seen: Mutex<Vec<DirChild>> = Mutex::new(Vec::new());
        let result = traverse(dir.path(), |children| {
            let seen = &seen;
            async move {
                seen.lock().extend(children);
                Ok(())
            }
        })
        .await;

        assert!(matches!(result, Err(ScanError::FileNotFound(_))));
        // The callback still saw both children
        assert_eq!(seen.into_inner().len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directory_is_followed() {
        let dir = tempdir().unwrap();
        let target = tempdir().unwrap();
        std_fs::write(target.path().join("inner.txt"), "x").unwrap();
        std::os::unix::fs::symlink(target.path(), dir.path().join("linked")).unwrap();

        let seen: Mutex<Vec<DirChild>> = Mutex::new(Vec::new());
        traverse(dir.path(), |children| {
            let seen = &seen;
            async move {
                seen.lock().extend(children);
                Ok(())
            }
        })
        .await
        .unwrap();

        let seen = seen.into_inner();
        assert!(seen.contains(&DirChild {
            path: dir.path().join("linked"),
            is_dir: true,
        }));
        assert!(seen.contains(&DirChild {
            path: dir.path().join("linked/inner.txt"),
            is_dir: false,
        }));
    }
}
