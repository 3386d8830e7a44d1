//! Completion candidates for command arguments
//!
//! Each argument position of a verb declares an [`ArgKind`]. Given the kind
//! and the partially typed word, [`candidates`] returns possible completions.
//! Directory candidates are not terminal: the user keeps typing after them.

use std::path::{Path, PathBuf};

use futures::TryStreamExt;

use crate::error::Result;
use crate::session::Session;
use crate::traits::SEPARATOR;

/// What an argument position expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// Name of a bucket
    Bucket,
    /// Object or directory relative to the current prefix
    Remote {
        /// Offer files as well as directories
        files: bool,
    },
    /// Local filesystem path
    Local,
    /// One of a fixed set of words
    OneOf(&'static [&'static str]),
    /// Anything, no completion
    Free,
}

/// A possible completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Replacement for the partial word
    pub value: String,
    /// Text shown in the candidate list
    pub display: String,
    /// Whether the argument is complete after this candidate
    pub terminal: bool,
}

impl Candidate {
    fn terminal(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            display: value.clone(),
            value,
            terminal: true,
        }
    }

    fn directory(value: String, display: String) -> Self {
        Self {
            value,
            display,
            terminal: false,
        }
    }
}

/// Words from `choices` starting with `partial`
pub fn matching(choices: &[&str], partial: &str) -> Vec<Candidate> {
    choices
        .iter()
        .filter(|choice| choice.starts_with(partial))
        .map(|choice| Candidate::terminal(*choice))
        .collect()
}

/// Candidates for `partial` in an argument of kind `kind`
pub async fn candidates(session: &Session, kind: ArgKind, partial: &str) -> Result<Vec<Candidate>> {
    match kind {
        ArgKind::Bucket => bucket_candidates(session, partial).await,
        ArgKind::Remote { .. } if session.bucket().is_none() => {
            bucket_candidates(session, partial).await
        }
        ArgKind::Remote { files } => remote_candidates(session, partial, files).await,
        ArgKind::Local => Ok(local_candidates(partial)),
        ArgKind::OneOf(choices) => Ok(matching(choices, partial)),
        ArgKind::Free => Ok(Vec::new()),
    }
}

async fn bucket_candidates(session: &Session, partial: &str) -> Result<Vec<Candidate>> {
    let buckets = session.store().list_buckets().await?;
    Ok(buckets
        .into_iter()
        .filter(|name| name.starts_with(partial))
        .map(Candidate::terminal)
        .collect())
}

async fn remote_candidates(session: &Session, partial: &str, files: bool) -> Result<Vec<Candidate>> {
    let bucket = session.require_bucket()?;
    let prefix = session.prefix();
    let filter = session.resolve(partial);

    let mut entries = session.store().list_objects(bucket, &filter, false);
    let mut found = Vec::new();
    while let Some(entry) = entries.try_next().await? {
        let value = entry.relative_to(prefix).to_string();
        if entry.is_dir() {
            let display = format!("{}{SEPARATOR}", entry.name());
            found.push(Candidate::directory(value, display));
        } else if files {
            found.push(Candidate {
                display: entry.name().to_string(),
                value,
                terminal: true,
            });
        }
    }
    Ok(found)
}

fn local_candidates(partial: &str) -> Vec<Candidate> {
    let (dir_part, file_part) = match partial.rfind(std::path::MAIN_SEPARATOR) {
        Some(pos) => partial.split_at(pos + 1),
        None => ("", partial),
    };
    let dir: PathBuf = if dir_part.is_empty() {
        PathBuf::from(".")
    } else {
        Path::new(dir_part).to_path_buf()
    };

    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };

    let mut found: Vec<Candidate> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(file_part) {
                return None;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let value = format!("{dir_part}{name}");
            Some(if is_dir {
                let display = format!("{name}{}", std::path::MAIN_SEPARATOR);
                Candidate::directory(format!("{value}{}", std::path::MAIN_SEPARATOR), display)
            } else {
                Candidate {
                    value,
                    display: name,
                    terminal: true,
                }
            })
        })
        .collect();
    found.sort_by(|a, b| a.value.cmp(&b.value));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ConnectionTarget;
    use crate::memory::MemoryStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn session() -> Session {
        let store = MemoryStore::new()
            .with_bucket("archive")
            .with_object("data", "docs/readme.md", "r")
            .with_object("data", "docs/reports/q1.csv", "q")
            .with_object("data", "downloads/", "")
            .with_object("data", "index.html", "i");
        let target = ConnectionTarget::new("test", "localhost:9000", false, "ak", "sk");
        Session::new(target, Arc::new(store))
    }

    fn values(found: &[Candidate]) -> Vec<&str> {
        found.iter().map(|c| c.value.as_str()).collect()
    }

    #[tokio::test]
    async fn test_bucket_candidates() {
        let session = session().await;
        let found = candidates(&session, ArgKind::Bucket, "d").await.unwrap();
        assert_eq!(values(&found), vec!["data"]);
        assert!(found[0].terminal);
    }

    #[tokio::test]
    async fn test_remote_at_root_offers_buckets() {
        let session = session().await;
        let found = candidates(&session, ArgKind::Remote { files: false }, "")
            .await
            .unwrap();
        assert_eq!(values(&found), vec!["archive", "data"]);
    }

    #[tokio::test]
    async fn test_remote_candidates_mark_directories() {
        let mut session = session().await;
        session.enter_bucket("data").await.unwrap();

        let found = candidates(&session, ArgKind::Remote { files: true }, "d")
            .await
            .unwrap();
        assert_eq!(values(&found), vec!["docs/", "downloads/"]);
        assert!(found.iter().all(|c| !c.terminal));

        let found = candidates(&session, ArgKind::Remote { files: true }, "docs/re")
            .await
            .unwrap();
        assert_eq!(values(&found), vec!["docs/readme.md", "docs/reports/"]);
        assert_eq!(found[0].display, "readme.md");
        assert!(found[0].terminal);
        assert!(!found[1].terminal);
    }

    #[tokio::test]
    async fn test_remote_directories_only() {
        let mut session = session().await;
        session.enter_bucket("data").await.unwrap();
        session.change_directory("docs").await.unwrap();

        let found = candidates(&session, ArgKind::Remote { files: false }, "")
            .await
            .unwrap();
        assert_eq!(values(&found), vec!["reports/"]);
    }

    #[tokio::test]
    async fn test_fixed_choices() {
        let session = session().await;
        let found = candidates(&session, ArgKind::OneOf(&["bucket", "env"]), "b")
            .await
            .unwrap();
        assert_eq!(values(&found), vec!["bucket"]);
        assert!(
            candidates(&session, ArgKind::Free, "x")
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_local_candidates() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("photos")).unwrap();
        std::fs::write(dir.path().join("plan.txt"), "p").unwrap();

        let base = format!("{}{}", dir.path().display(), std::path::MAIN_SEPARATOR);
        let found = local_candidates(&format!("{base}p"));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].display, format!("photos{}", std::path::MAIN_SEPARATOR));
        assert!(!found[0].terminal);
        assert_eq!(found[1].value, format!("{base}plan.txt"));
        assert!(found[1].terminal);
    }
}
