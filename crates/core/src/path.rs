//! Virtual directories over a flat key namespace
//!
//! A [`Location`] is the shell's working directory: the entered bucket and a
//! key prefix that is either empty or ends with the separator. [`stat`]
//! classifies a key as file, directory or absent using a shallow listing.

use futures::TryStreamExt;

use crate::error::Result;
use crate::traits::{ObjectStore, SEPARATOR};

/// Current bucket and prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    bucket: String,
    prefix: String,
}

impl Location {
    /// Location at root, no bucket entered
    pub fn root() -> Self {
        Self::default()
    }

    /// Top level of a bucket
    pub fn in_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: String::new(),
        }
    }

    /// Entered bucket, `None` at root
    pub fn bucket(&self) -> Option<&str> {
        if self.bucket.is_empty() {
            None
        } else {
            Some(&self.bucket)
        }
    }

    /// Current prefix, empty or separator-terminated
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_root(&self) -> bool {
        self.bucket.is_empty()
    }

    /// Move one directory up; no-op at the top of the bucket
    pub fn pop(&mut self) {
        let trimmed = self.prefix.trim_end_matches(SEPARATOR);
        self.prefix = match trimmed.rfind(SEPARATOR) {
            Some(pos) => trimmed[..=pos].to_string(),
            None => String::new(),
        };
    }

    /// Descend into `name`, which may span several segments
    pub fn push(&mut self, name: &str) {
        let name = normalize_key(name);
        if name.is_empty() {
            return;
        }
        self.prefix.push_str(name);
        self.prefix.push(SEPARATOR);
    }

    /// Full key for a name relative to the current prefix
    pub fn resolve(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }
}

/// Strip one trailing separator
pub fn normalize_key(key: &str) -> &str {
    key.strip_suffix(SEPARATOR).unwrap_or(key)
}

/// Turn a key into a directory prefix; the empty key stays empty
pub fn dir_prefix(key: &str) -> String {
    if key.is_empty() || key.ends_with(SEPARATOR) {
        key.to_string()
    } else {
        format!("{key}{SEPARATOR}")
    }
}

/// Classification of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    /// Neither an object nor a directory
    Absent,
    /// An object with exactly this key
    File { size: u64 },
    /// A marker object or a common prefix `<key>/`
    Directory,
}

impl Stat {
    pub fn is_file(&self) -> bool {
        matches!(self, Stat::File { .. })
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Stat::Directory)
    }

    pub fn exists(&self) -> bool {
        !matches!(self, Stat::Absent)
    }

    /// Object size, 0 for directories and absent keys
    pub fn size(&self) -> u64 {
        match self {
            Stat::File { size } => *size,
            _ => 0,
        }
    }
}

/// Classify `key` inside `bucket`
///
/// Performs a shallow listing filtered by the normalized key and stops at the
/// first entry that decides the question.
pub async fn stat(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<Stat> {
    let file_key = normalize_key(key);
    if file_key.is_empty() {
        return Ok(Stat::Directory);
    }
    let dir_key = format!("{file_key}{SEPARATOR}");

    let mut entries = store.list_objects(bucket, file_key, false);
    while let Some(entry) = entries.try_next().await? {
        if entry.key == dir_key {
            return Ok(Stat::Directory);
        }
        if entry.key == file_key {
            return Ok(Stat::File { size: entry.size });
        }
    }
    Ok(Stat::Absent)
}
