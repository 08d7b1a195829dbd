/// This module implements the concurrent directory scan.
///
/// # .NET vs Rust Asynchronous Fan-Out
///
/// In .NET, a recursive scan that tests every file against a pattern is
/// typically written with `Task.WhenAll` and a `SemaphoreSlim` gate:
/// ```csharp
/// async Task ScanAsync(string dir) {
///     var children = Directory.GetFileSystemEntries(dir);
///     await Task.WhenAll(
///         OnDirectoryAsync(children),
///         Task.WhenAll(children.Where(Directory.Exists).Select(ScanAsync)));
/// }
///
/// async Task<bool> MatchesAsync(string path) {
///     await gate.WaitAsync();
///     try { return regex.IsMatch(await File.ReadAllTextAsync(path)); }
///     finally { gate.Release(); }
/// }
/// ```
///
/// In Rust, each subtree is a boxed future and the gate is a tokio semaphore
/// whose permit is released when it goes out of scope:
/// ```rust,ignore
/// fn visit(dir: PathBuf) -> BoxFuture<'static, ScanResult<()>> {
///     async move {
///         let children = list_children(&dir).await?;
///         let (callback, subtrees) = join!(on_directory(children), join_all(subdirs.map(visit)));
///         // ...
///     }.boxed()
/// }
/// ```
///
/// # Components
///
/// 1. **Matcher** ([`matcher`]): compiles the content pattern once per scan
/// 2. **Predicate** ([`predicate`]): extension pre-filter, then a throttled
///    content read and pattern test
/// 3. **Traverser** ([`traverse`]): recursive walk invoking a callback per
///    directory with its immediate children
/// 4. **Engine** ([`engine`]): drives the traverser and collects matching paths
///
/// # Failure Semantics
///
/// Sibling work is never cut short. A failing file or subtree is recorded,
/// every other sibling runs to completion, and then the first failure in
/// listing order is returned for the whole scan. No partial result is
/// produced.
pub mod engine;
pub mod matcher;
pub mod predicate;
pub mod traverse;

pub use engine::{scan, Scanner};
pub use matcher::{ContentMatcher, MatchPattern};
pub use predicate::{evaluate, matches, Verdict};
pub use traverse::{traverse, DirChild};
