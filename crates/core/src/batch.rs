//! Batch operation engine
//!
//! A batch applies one [`Transform`] to every item of a lazy sequence, most
//! often a recursive listing below a prefix. Processing stops at the first
//! failure; items handled before it stay handled, and the returned
//! [`BatchResult`] tells the caller how far the batch got.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::path::dir_prefix;
use crate::traits::{ObjectInfo, ObjectStore, SEPARATOR};

/// An action applied to each item of a batch
#[async_trait]
pub trait Transform: Send + Sync {
    type Item: Send + Sync;

    /// Text identifying the item in reports
    fn label(&self, item: &Self::Item) -> String;

    /// Whether a transformed item shows up in progress and in the result
    ///
    /// Directory markers are transformed like any other object but are not
    /// files, so object transforms leave them out of the count.
    fn counts(&self, _item: &Self::Item) -> bool {
        true
    }

    /// Apply the action, returning the number of bytes affected
    async fn apply(&self, item: &Self::Item) -> Result<u64>;
}

/// Receives per-item progress while a batch runs
pub trait BatchObserver: Send {
    /// Called after an item was transformed
    fn processed(&mut self, label: &str, bytes: u64, total_bytes: u64);
}

/// Observer that ignores progress
#[derive(Debug, Default)]
pub struct Silent;

impl BatchObserver for Silent {
    fn processed(&mut self, _label: &str, _bytes: u64, _total_bytes: u64) {}
}

/// Outcome of a batch
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Labels of the items transformed, in order
    pub affected: Vec<String>,
    /// Bytes affected by all transformed items
    pub total_bytes: u64,
    /// Failure that stopped the batch
    pub error: Option<Error>,
}

impl BatchResult {
    pub fn count(&self) -> usize {
        self.affected.len()
    }

    /// Some items were transformed before a failure stopped the batch
    pub fn is_partial(&self) -> bool {
        self.error.is_some() && !self.affected.is_empty()
    }

    /// `"<size> (<n> file|files)"`
    pub fn summary(&self) -> String {
        format!(
            "{} ({})",
            humansize::format_size(self.total_bytes, humansize::BINARY),
            file_count(self.count())
        )
    }

    /// Split into the failure and what was done before it
    pub fn into_result(mut self) -> Result<Self> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// `"1 file"` or `"<n> files"`
pub fn file_count(n: usize) -> String {
    if n == 1 {
        "1 file".to_string()
    } else {
        format!("{n} files")
    }
}

/// Apply `transform` to every item, stopping at the first failure
///
/// The item stream is dropped as soon as the batch stops, which ends any
/// listing that feeds it.
pub async fn run<T: Transform>(
    mut items: BoxStream<'_, Result<T::Item>>,
    transform: &T,
    observer: &mut dyn BatchObserver,
) -> BatchResult {
    let mut result = BatchResult::default();

    loop {
        let item = match items.try_next().await {
            Ok(Some(item)) => item,
            Ok(None) => break,
            Err(err) => {
                result.error = Some(err);
                break;
            }
        };

        let label = transform.label(&item);
        match transform.apply(&item).await {
            Ok(_) if !transform.counts(&item) => {}
            Ok(bytes) => {
                result.total_bytes += bytes;
                observer.processed(&label, bytes, result.total_bytes);
                result.affected.push(label);
            }
            Err(err) => {
                tracing::debug!(item = %label, error = %err, "batch stopped");
                result.error = Some(err);
                break;
            }
        }
    }

    tracing::debug!(
        count = result.count(),
        bytes = result.total_bytes,
        failed = result.error.is_some(),
        "batch finished"
    );
    result
}

/// Apply `transform` to every object below `prefix`
pub async fn apply_recursive<T>(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    transform: &T,
    observer: &mut dyn BatchObserver,
) -> BatchResult
where
    T: Transform<Item = ObjectInfo>,
{
    run(store.list_objects(bucket, prefix, true), transform, observer).await
}

/// Apply `transform` to a single item
pub async fn apply_one<T: Transform>(
    item: T::Item,
    transform: &T,
    observer: &mut dyn BatchObserver,
) -> BatchResult
where
    T::Item: 'static,
{
    run(futures::stream::iter([Ok(item)]).boxed(), transform, observer).await
}

/// Delete each object
pub struct Delete<'a> {
    store: &'a dyn ObjectStore,
    bucket: &'a str,
}

impl<'a> Delete<'a> {
    pub fn new(store: &'a dyn ObjectStore, bucket: &'a str) -> Self {
        Self { store, bucket }
    }
}

#[async_trait]
impl Transform for Delete<'_> {
    type Item = ObjectInfo;

    fn label(&self, item: &ObjectInfo) -> String {
        item.key.clone()
    }

    fn counts(&self, item: &ObjectInfo) -> bool {
        !item.is_dir()
    }

    async fn apply(&self, item: &ObjectInfo) -> Result<u64> {
        self.store.delete_object(self.bucket, &item.key).await?;
        Ok(item.size)
    }
}

/// Copy each object from one prefix to another, optionally removing the source
pub struct CopyPrefix<'a> {
    store: &'a dyn ObjectStore,
    bucket: &'a str,
    from: String,
    to: String,
    remove_source: bool,
}

impl<'a> CopyPrefix<'a> {
    /// Copy keys starting with `from` to the same keys starting with `to`
    pub fn new(
        store: &'a dyn ObjectStore,
        bucket: &'a str,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket,
            from: from.into(),
            to: to.into(),
            remove_source: false,
        }
    }

    /// Delete each source object once its copy exists
    pub fn moving(mut self) -> Self {
        self.remove_source = true;
        self
    }

    /// Destination key for a source key
    pub fn destination(&self, key: &str) -> String {
        let rest = key.strip_prefix(self.from.as_str()).unwrap_or(key);
        format!("{}{rest}", self.to)
    }
}

#[async_trait]
impl Transform for CopyPrefix<'_> {
    type Item = ObjectInfo;

    fn label(&self, item: &ObjectInfo) -> String {
        format!("{} -> {}", item.key, self.destination(&item.key))
    }

    fn counts(&self, item: &ObjectInfo) -> bool {
        !item.is_dir()
    }

    async fn apply(&self, item: &ObjectInfo) -> Result<u64> {
        let destination = self.destination(&item.key);
        self.store
            .copy_object(self.bucket, &item.key, &destination)
            .await?;
        if self.remove_source {
            self.store.delete_object(self.bucket, &item.key).await?;
        }
        Ok(item.size)
    }
}

/// Write each object below a prefix into a local directory tree
pub struct Download<'a> {
    store: &'a dyn ObjectStore,
    bucket: &'a str,
    from: String,
    dest: PathBuf,
}

impl<'a> Download<'a> {
    /// Mirror keys below `from` under `dest`
    ///
    /// An object whose key equals `from` is written to `dest` itself.
    pub fn new(
        store: &'a dyn ObjectStore,
        bucket: &'a str,
        from: impl Into<String>,
        dest: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            bucket,
            from: from.into(),
            dest: dest.into(),
        }
    }

    /// Local path for an object key
    ///
    /// Every key segment must be a plain file name. A key containing `.` or
    /// `..` segments, or a segment the platform reads as a root or drive, is
    /// rejected so no download can land outside `dest`.
    pub fn local_path(&self, key: &str) -> Result<PathBuf> {
        let relative = key.strip_prefix(self.from.as_str()).unwrap_or(key);
        let mut path = self.dest.clone();
        for segment in relative.split(SEPARATOR).filter(|s| !s.is_empty()) {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(name)), None) => path.push(name),
                _ => {
                    return Err(Error::Argument(format!(
                        "object key {key:?} does not map to a path below {}",
                        self.dest.display()
                    )));
                }
            }
        }
        Ok(path)
    }
}

#[async_trait]
impl Transform for Download<'_> {
    type Item = ObjectInfo;

    fn label(&self, item: &ObjectInfo) -> String {
        match self.local_path(&item.key) {
            Ok(path) => format!("{} -> {}", item.key, path.display()),
            Err(_) => item.key.clone(),
        }
    }

    fn counts(&self, item: &ObjectInfo) -> bool {
        !item.is_dir()
    }

    async fn apply(&self, item: &ObjectInfo) -> Result<u64> {
        let path = self.local_path(&item.key)?;
        if item.is_dir() {
            tokio::fs::create_dir_all(&path).await?;
            return Ok(0);
        }

        let data = self.store.get_object(self.bucket, &item.key).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;
        Ok(data.len() as u64)
    }
}

/// A local file scheduled for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub key: String,
}

/// Regular files below `root`, mapped to keys below `prefix`
///
/// When `root` is a file, the single entry maps to `prefix` with any trailing
/// separator removed. Symbolic links below `root` are not followed. Entries
/// are sorted by key. The scan runs on the blocking thread pool.
pub async fn local_files(root: &Path, prefix: &str) -> Result<Vec<LocalFile>> {
    let (root, prefix) = (root.to_path_buf(), prefix.to_string());
    tokio::task::spawn_blocking(move || scan_local(&root, &prefix))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}

fn scan_local(root: &Path, prefix: &str) -> Result<Vec<LocalFile>> {
    let metadata = std::fs::metadata(root).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            Error::NotFound(format!("local path {:?} not found", root.display().to_string()))
        }
        _ => Error::Io(e),
    })?;

    if metadata.is_file() {
        let key = prefix.strip_suffix(SEPARATOR).unwrap_or(prefix).to_string();
        return Ok(vec![LocalFile {
            path: root.to_path_buf(),
            key,
        }]);
    }

    let prefix = dir_prefix(prefix);
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let mut key = prefix.clone();
        for (i, component) in relative.components().enumerate() {
            if i > 0 {
                key.push(SEPARATOR);
            }
            key.push_str(&component.as_os_str().to_string_lossy());
        }
        files.push(LocalFile {
            path: entry.into_path(),
            key,
        });
    }
    files.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(files)
}

/// Upload local files to their keys
pub struct Upload<'a> {
    store: &'a dyn ObjectStore,
    bucket: &'a str,
}

impl<'a> Upload<'a> {
    pub fn new(store: &'a dyn ObjectStore, bucket: &'a str) -> Self {
        Self { store, bucket }
    }
}

#[async_trait]
impl Transform for Upload<'_> {
    type Item = LocalFile;

    fn label(&self, item: &LocalFile) -> String {
        format!("{} -> {}", item.path.display(), item.key)
    }

    async fn apply(&self, item: &LocalFile) -> Result<u64> {
        let content_type = mime_guess::from_path(&item.path)
            .first()
            .map(|m| m.essence_str().to_string());
        self.store
            .upload_file(self.bucket, &item.key, &item.path, content_type)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::traits::MockObjectStore;
    use mockall::predicate::eq;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder(Vec<(String, u64)>);

    impl BatchObserver for Recorder {
        fn processed(&mut self, label: &str, _bytes: u64, total_bytes: u64) {
            self.0.push((label.to_string(), total_bytes));
        }
    }

    fn tree() -> MemoryStore {
        MemoryStore::new()
            .with_object("b", "p/1", "one")
            .with_object("b", "p/2", "two!")
            .with_object("b", "other", "x")
    }

    #[test]
    fn test_summary_wording() {
        let mut result = BatchResult {
            affected: vec!["a".into()],
            total_bytes: 7,
            error: None,
        };
        assert_eq!(result.summary(), "7 B (1 file)");
        result.affected.push("b".into());
        assert_eq!(result.summary(), "7 B (2 files)");
        assert_eq!(file_count(0), "0 files");
    }

    #[tokio::test]
    async fn test_copy_prefix() {
        let store = tree();
        let transform = CopyPrefix::new(&store, "b", "p/", "q/");
        let result = apply_recursive(&store, "b", "p/", &transform, &mut Silent).await;

        let result = result.into_result().unwrap();
        assert_eq!(result.count(), 2);
        assert_eq!(result.total_bytes, 7);
        assert_eq!(store.keys("b"), vec!["other", "p/1", "p/2", "q/1", "q/2"]);
        assert_eq!(store.content("b", "q/2").unwrap(), b"two!");
    }

    #[tokio::test]
    async fn test_move_prefix_deletes_after_each_copy() {
        let store = tree();
        let transform = CopyPrefix::new(&store, "b", "p/", "q/").moving();
        let mut recorder = Recorder::default();
        let result = apply_recursive(&store, "b", "p/", &transform, &mut recorder).await;

        assert!(result.error.is_none());
        assert_eq!(store.keys("b"), vec!["other", "q/1", "q/2"]);
        assert_eq!(
            store.mutations(),
            vec![
                "copy b/p/1 b/q/1",
                "delete b/p/1",
                "copy b/p/2 b/q/2",
                "delete b/p/2",
            ]
        );
        assert_eq!(recorder.0[1], ("p/2 -> q/2".to_string(), 7));
    }

    #[tokio::test]
    async fn test_move_keeps_source_when_copy_fails() {
        let mut store = MockObjectStore::new();
        store
            .expect_copy_object()
            .with(eq("b"), eq("p/1"), eq("q/1"))
            .times(1)
            .returning(|_, _, _| Err(Error::Store("copy failed".into())));
        store.expect_delete_object().never();

        let transform = CopyPrefix::new(&store, "b", "p/", "q/").moving();
        let result = apply_one(ObjectInfo::file("p/1", 3), &transform, &mut Silent).await;
        assert!(matches!(result.error, Some(Error::Store(_))));
        assert!(!result.is_partial());
    }

    #[tokio::test]
    async fn test_abort_on_first_error() {
        let store = MemoryStore::new()
            .with_object("b", "d/1", "a")
            .with_object("b", "d/2", "b")
            .with_object("b", "d/3", "c");
        store.fail_on("d/2");

        let transform = Delete::new(&store, "b");
        let result = apply_recursive(&store, "b", "d/", &transform, &mut Silent).await;

        assert!(result.is_partial());
        assert_eq!(result.affected, vec!["d/1"]);
        assert_eq!(store.keys("b"), vec!["d/2", "d/3"]);
        assert!(result.into_result().is_err());
    }

    #[tokio::test]
    async fn test_listing_error_stops_batch() {
        let store = MemoryStore::new();
        let transform = Delete::new(&store, "missing");
        let result = apply_recursive(&store, "missing", "", &transform, &mut Silent).await;
        assert!(matches!(result.error, Some(Error::NotFound(_))));
        assert_eq!(result.count(), 0);
    }

    #[tokio::test]
    async fn test_download_mirrors_tree() {
        let store = MemoryStore::new()
            .with_object("b", "docs/a.txt", "alpha")
            .with_object("b", "docs/empty/", "")
            .with_object("b", "docs/sub/b.txt", "beta");
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out");

        let transform = Download::new(&store, "b", "docs/", &dest);
        let result = apply_recursive(&store, "b", "docs/", &transform, &mut Silent)
            .await
            .into_result()
            .unwrap();

        assert_eq!(result.total_bytes, 9);
        assert_eq!(std::fs::read(dest.join("a.txt")).unwrap(), b"alpha");
        assert_eq!(std::fs::read(dest.join("sub").join("b.txt")).unwrap(), b"beta");
        assert!(dest.join("empty").is_dir());
    }

    #[tokio::test]
    async fn test_download_single_object_to_path() {
        let store = MemoryStore::new().with_object("b", "report.csv", "1,2");
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("local.csv");

        let transform = Download::new(&store, "b", "report.csv", &dest);
        let result = apply_one(ObjectInfo::file("report.csv", 3), &transform, &mut Silent).await;

        assert!(result.error.is_none());
        assert_eq!(std::fs::read(&dest).unwrap(), b"1,2");
    }

    #[tokio::test]
    async fn test_upload_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>").unwrap();
        std::fs::write(dir.path().join("nested").join("data.json"), "{}").unwrap();

        let files = local_files(dir.path(), "site").await.unwrap();
        let keys: Vec<&str> = files.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["site/index.html", "site/nested/data.json"]);

        let store = MemoryStore::new().with_bucket("b");
        let transform = Upload::new(&store, "b");
        let items = futures::stream::iter(files.into_iter().map(Ok)).boxed();
        let result = run(items, &transform, &mut Silent).await;

        assert_eq!(result.into_result().unwrap().total_bytes, 8);
        assert_eq!(store.content("b", "site/nested/data.json").unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_local_files_single_file_and_missing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "n").unwrap();

        let files = local_files(&file, "docs/notes.txt").await.unwrap();
        assert_eq!(files[0].key, "docs/notes.txt");

        let err = local_files(&dir.path().join("nope"), "x").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_local_files_does_not_follow_symlinks() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("secret.txt"), "s").unwrap();
        std::fs::write(dir.path().join("real.txt"), "r").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let files = local_files(dir.path(), "up/").await.unwrap();
        let keys: Vec<&str> = files.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["up/real.txt"]);
    }

    #[tokio::test]
    async fn test_upload_hands_file_path_to_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, "<html>").unwrap();

        let mut store = MockObjectStore::new();
        store.expect_put_object().never();
        store
            .expect_upload_file()
            .withf(|bucket, key, path, content_type| {
                bucket == "b"
                    && key == "site/index.html"
                    && path.ends_with("index.html")
                    && content_type.as_deref() == Some("text/html")
            })
            .times(1)
            .returning(|_, _, _, _| Ok(6));

        let transform = Upload::new(&store, "b");
        let file = LocalFile {
            path,
            key: "site/index.html".into(),
        };
        let result = apply_one(file, &transform, &mut Silent).await;
        assert_eq!(result.into_result().unwrap().total_bytes, 6);
    }

    #[tokio::test]
    async fn test_download_rejects_keys_leaving_destination() {
        let store = MemoryStore::new()
            .with_object("b", "docs/../../escaped.txt", "bad")
            .with_object("b", "docs/ok.txt", "fine");
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a").join("out");

        let transform = Download::new(&store, "b", "docs/", &dest);
        let result = apply_recursive(&store, "b", "docs/", &transform, &mut Silent).await;

        assert!(matches!(result.error, Some(Error::Argument(_))));
        assert!(!dir.path().join("escaped.txt").exists());
        assert!(!dir.path().join("a").join("escaped.txt").exists());
        assert!(!dest.exists());
    }

    #[test]
    fn test_local_path_accepts_only_plain_segments() {
        let store = MemoryStore::new();
        let transform = Download::new(&store, "b", "docs/", "/tmp/out");
        assert_eq!(
            transform.local_path("docs/sub//a.txt").unwrap(),
            Path::new("/tmp/out").join("sub").join("a.txt")
        );
        assert_eq!(
            transform.local_path("docs/..a/b..").unwrap(),
            Path::new("/tmp/out").join("..a").join("b..")
        );
        for key in ["docs/../x", "docs/./x", "docs/a/../../x", "docs/.."] {
            assert!(
                matches!(transform.local_path(key), Err(Error::Argument(_))),
                "{key}"
            );
        }
    }

    #[tokio::test]
    async fn test_directory_markers_are_not_counted() {
        let store = MemoryStore::new()
            .with_object("b", "d/", "")
            .with_object("b", "d/empty/", "")
            .with_object("b", "d/1", "abc");
        let mut recorder = Recorder::default();

        let transform = Delete::new(&store, "b");
        let result = apply_recursive(&store, "b", "d/", &transform, &mut recorder)
            .await
            .into_result()
            .unwrap();

        assert!(store.keys("b").is_empty());
        assert_eq!(result.affected, vec!["d/1"]);
        assert_eq!(result.summary(), "3 B (1 file)");
        assert_eq!(recorder.0, vec![("d/1".to_string(), 3)]);
    }

    #[tokio::test]
    async fn test_download_of_markers_only_creates_directories() {
        let store = MemoryStore::new()
            .with_object("b", "d/", "")
            .with_object("b", "d/empty/", "");
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out");

        let transform = Download::new(&store, "b", "d/", &dest);
        let result = apply_recursive(&store, "b", "d/", &transform, &mut Silent)
            .await
            .into_result()
            .unwrap();

        assert_eq!(result.count(), 0);
        assert!(dest.join("empty").is_dir());
    }

    #[test]
    fn test_copy_destination_is_prefix_replacement() {
        let store = MemoryStore::new();
        let transform = CopyPrefix::new(&store, "b", "photos/", "backup/photos/");
        assert_eq!(
            transform.destination("photos/2024/a.jpg"),
            "backup/photos/2024/a.jpg"
        );
    }
}
