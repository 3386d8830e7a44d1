//! Shell session state
//!
//! A [`Session`] owns the connection target, the store handle and the current
//! [`Location`]. Navigation commands are the only way to move the location;
//! destructive bucket commands reset it through [`Session::forget_bucket`].

use std::sync::Arc;

use crate::environment::ConnectionTarget;
use crate::error::{Error, Result};
use crate::path::{self, Location, Stat};
use crate::traits::ObjectStore;

/// What `cd` ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// No bucket was entered, so the argument was entered as a bucket
    EnteredBucket,
    /// The prefix changed inside the current bucket
    Moved,
}

/// One connected shell session
#[derive(Clone)]
pub struct Session {
    target: ConnectionTarget,
    store: Arc<dyn ObjectStore>,
    location: Location,
}

impl Session {
    pub fn new(target: ConnectionTarget, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            target,
            store,
            location: Location::root(),
        }
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn bucket(&self) -> Option<&str> {
        self.location.bucket()
    }

    pub fn prefix(&self) -> &str {
        self.location.prefix()
    }

    /// Entered bucket, or `PreconditionFailed` at root
    pub fn require_bucket(&self) -> Result<&str> {
        self.location
            .bucket()
            .ok_or_else(|| Error::PreconditionFailed("no bucket entered".into()))
    }

    /// Full key of `name` relative to the current prefix
    pub fn resolve(&self, name: &str) -> String {
        self.location.resolve(name)
    }

    /// Enter `bucket` at its top level
    pub async fn enter_bucket(&mut self, bucket: &str) -> Result<()> {
        if !self.store.bucket_exists(bucket).await? {
            return Err(Error::NotFound(format!("bucket {bucket:?} does not exist")));
        }
        tracing::debug!(bucket, "entered bucket");
        self.location = Location::in_bucket(bucket);
        Ok(())
    }

    /// Return to root
    pub fn leave_bucket(&mut self) -> Result<()> {
        self.require_bucket()?;
        self.location = Location::root();
        Ok(())
    }

    /// Change the working directory
    ///
    /// At root the argument names a bucket to enter. `..` moves one level up.
    /// Anything else must resolve to a directory below the current prefix.
    pub async fn change_directory(&mut self, name: &str) -> Result<Navigation> {
        if self.location.is_root() {
            self.enter_bucket(path::normalize_key(name)).await?;
            return Ok(Navigation::EnteredBucket);
        }

        let name = path::normalize_key(name);
        if name == ".." {
            self.location.pop();
            return Ok(Navigation::Moved);
        }

        match self.stat(name).await? {
            Stat::Directory => {
                self.location.push(name);
                Ok(Navigation::Moved)
            }
            Stat::File { .. } => Err(Error::NotADirectory(format!("{name:?} is a file"))),
            Stat::Absent => Err(Error::NotFound(format!("directory {name:?} not found"))),
        }
    }

    /// Classify `name` relative to the current prefix
    pub async fn stat(&self, name: &str) -> Result<Stat> {
        let bucket = self.require_bucket()?;
        path::stat(self.store.as_ref(), bucket, &self.resolve(name)).await
    }

    /// Drop back to root if `bucket` is the one entered
    pub fn forget_bucket(&mut self, bucket: &str) {
        if self.location.bucket() == Some(bucket) {
            self.location = Location::root();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.target.key)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}
