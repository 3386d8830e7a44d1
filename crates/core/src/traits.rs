//! The object store seam
//!
//! Everything above this trait sees a flat key namespace per bucket. The SDK
//! adapter, the in-memory store and mocks all plug in here.

use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

/// Separator used by the directory naming convention
pub const SEPARATOR: char = '/';

/// An entry produced by a listing
///
/// Directories are not store entities: an entry is a directory when its key
/// ends with the separator, either because a zero-byte marker object exists
/// under that key or because a shallow listing grouped children under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Full object key
    pub key: String,

    /// Size in bytes (0 for directories)
    pub size: u64,
}

impl ObjectInfo {
    /// Object with a plain key
    pub fn file(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    /// Marker object or common prefix, separator appended when missing
    pub fn dir(key: impl Into<String>) -> Self {
        let mut key = key.into();
        if !key.ends_with(SEPARATOR) {
            key.push(SEPARATOR);
        }
        Self { key, size: 0 }
    }

    /// Whether this entry follows the directory convention
    pub fn is_dir(&self) -> bool {
        self.key.ends_with(SEPARATOR)
    }

    /// Last path segment, without the trailing separator for directories
    pub fn name(&self) -> &str {
        let trimmed = self.key.strip_suffix(SEPARATOR).unwrap_or(&self.key);
        trimmed.rsplit(SEPARATOR).next().unwrap_or(trimmed)
    }

    /// Key relative to `prefix`, or the full key if it lies outside of it
    pub fn relative_to(&self, prefix: &str) -> &str {
        self.key.strip_prefix(prefix).unwrap_or(&self.key)
    }
}

/// Lazy listing of objects
///
/// Pages are fetched on demand. Dropping the stream stops the listing, so a
/// consumer that bails out early never leaves a producer running.
pub type ObjectStream = BoxStream<'static, Result<ObjectInfo>>;

/// Bucket and object operations the shell needs from a backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List bucket names
    async fn list_buckets(&self) -> Result<Vec<String>>;

    /// Check if a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create a bucket
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// List objects whose key starts with `prefix`
    ///
    /// A shallow listing (`recursive == false`) groups everything below the
    /// next separator into a single directory entry.
    fn list_objects(&self, bucket: &str, prefix: &str, recursive: bool) -> ObjectStream;

    /// Whole object body
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Store an object, returning the number of bytes written
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<u64>;

    /// Store the contents of a local file, returning the number of bytes written
    ///
    /// The file is read from disk as it is sent, so its size is not bounded
    /// by memory.
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: Option<String>,
    ) -> Result<u64>;

    /// Server-side copy within a bucket
    async fn copy_object(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()>;

    /// Delete a single object
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;
}
