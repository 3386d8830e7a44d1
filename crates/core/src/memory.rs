//! In-memory object store
//!
//! Behaves like a flat S3 namespace: buckets map keys to bytes, shallow
//! listings group keys at the next separator. Every mutating call is
//! recorded, and single keys can be set to fail, so tests can assert what
//! a command did to the store and how it reacts to failures.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;

use crate::error::{Error, Result};
use crate::traits::{ObjectInfo, ObjectStore, ObjectStream, SEPARATOR};

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    mutations: Vec<String>,
    failing: BTreeSet<String>,
}

/// In-memory [`ObjectStore`] for tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an empty bucket
    pub fn with_bucket(self, bucket: &str) -> Self {
        self.lock().buckets.entry(bucket.to_string()).or_default();
        self
    }

    /// Add an object, creating the bucket if needed
    pub fn with_object(self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) -> Self {
        self.lock()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), data.into());
        self
    }

    /// Make every mutating call and read touching `key` fail
    pub fn fail_on(&self, key: &str) {
        self.lock().failing.insert(key.to_string());
    }

    /// Keys of a bucket in lexicographic order
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Content of an object
    pub fn content(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    /// Whether a bucket exists
    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.lock().buckets.contains_key(bucket)
    }

    /// Mutating calls in order, formatted as `"<op> <bucket>[/<key>]"`
    pub fn mutations(&self) -> Vec<String> {
        self.lock().mutations.clone()
    }

    fn check(state: &State, key: &str) -> Result<()> {
        if state.failing.contains(key) {
            return Err(Error::store(format!("request for {key:?} failed"), "injected failure"));
        }
        Ok(())
    }
}

fn no_such_bucket(bucket: &str) -> Error {
    Error::NotFound(format!("bucket {bucket:?} does not exist"))
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        Ok(self.lock().buckets.keys().cloned().collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.lock().buckets.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.lock();
        if state.buckets.contains_key(bucket) {
            return Err(Error::Conflict(format!("bucket {bucket:?} already exists")));
        }
        state.buckets.insert(bucket.to_string(), BTreeMap::new());
        state.mutations.push(format!("create_bucket {bucket}"));
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.lock();
        match state.buckets.get(bucket) {
            None => return Err(no_such_bucket(bucket)),
            Some(objects) if !objects.is_empty() => {
                return Err(Error::store(
                    format!("failed to delete bucket {bucket:?}"),
                    "BucketNotEmpty",
                ));
            }
            Some(_) => {}
        }
        state.buckets.remove(bucket);
        state.mutations.push(format!("delete_bucket {bucket}"));
        Ok(())
    }

    fn list_objects(&self, bucket: &str, prefix: &str, recursive: bool) -> ObjectStream {
        let state = self.lock();
        let Some(objects) = state.buckets.get(bucket) else {
            return futures::stream::once(futures::future::ready(Err(no_such_bucket(bucket))))
                .boxed();
        };

        let mut items: Vec<Result<ObjectInfo>> = Vec::new();
        let mut seen_dirs = BTreeSet::new();
        for (key, data) in objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            if !recursive {
                if let Some(pos) = rest.find(SEPARATOR) {
                    let dir = format!("{prefix}{}", &rest[..=pos]);
                    if seen_dirs.insert(dir.clone()) {
                        items.push(Ok(ObjectInfo::dir(dir)));
                    }
                    continue;
                }
            }
            items.push(Ok(ObjectInfo::file(key.clone(), data.len() as u64)));
        }

        futures::stream::iter(items).boxed()
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let state = self.lock();
        Self::check(&state, key)?;
        state
            .buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("object {key:?} does not exist")))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        _content_type: Option<String>,
    ) -> Result<u64> {
        let mut state = self.lock();
        Self::check(&state, key)?;
        let size = data.len() as u64;
        state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?
            .insert(key.to_string(), data);
        state.mutations.push(format!("put {bucket}/{key}"));
        Ok(size)
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: Option<String>,
    ) -> Result<u64> {
        let data = tokio::fs::read(path).await?;
        self.put_object(bucket, key, data, content_type).await
    }

    async fn copy_object(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, src_key)?;
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        let data = objects
            .get(src_key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("object {src_key:?} does not exist")))?;
        objects.insert(dst_key.to_string(), data);
        state
            .mutations
            .push(format!("copy {bucket}/{src_key} {bucket}/{dst_key}"));
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, key)?;
        state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?
            .remove(key);
        state.mutations.push(format!("delete {bucket}/{key}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn sample() -> MemoryStore {
        MemoryStore::new()
            .with_object("b", "a/b", "hello")
            .with_object("b", "a/c/", "")
            .with_object("b", "a/c/d", "x")
            .with_object("b", "top", "t")
    }

    #[tokio::test]
    async fn test_shallow_listing_groups_directories() {
        let store = sample();
        let keys: Vec<String> = store
            .list_objects("b", "a/", false)
            .map_ok(|o| o.key)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(keys, vec!["a/b", "a/c/"]);
    }

    #[tokio::test]
    async fn test_recursive_listing() {
        let store = sample();
        let keys: Vec<String> = store
            .list_objects("b", "a/", true)
            .map_ok(|o| o.key)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(keys, vec!["a/b", "a/c/", "a/c/d"]);
    }

    #[tokio::test]
    async fn test_listing_missing_bucket_fails() {
        let store = sample();
        let result: Result<Vec<ObjectInfo>> =
            store.list_objects("nope", "", true).try_collect().await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_mutations_are_recorded() {
        let store = sample();
        store.copy_object("b", "top", "top2").await.unwrap();
        store.delete_object("b", "top").await.unwrap();
        assert_eq!(
            store.mutations(),
            vec!["copy b/top b/top2", "delete b/top"]
        );
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = sample();
        store.fail_on("top");
        assert!(store.delete_object("b", "top").await.is_err());
        assert!(store.mutations().is_empty());
    }
}
