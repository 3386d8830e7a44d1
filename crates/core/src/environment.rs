//! Connection targets and their persistence
//!
//! An environment is a named connection target: endpoint, transport security,
//! credentials and an optional default bucket. Each one is stored as a small
//! JSON file under `<config dir>/env/<name>.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::input::{LineSource, read_non_empty};

/// Where a connection target came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetOrigin {
    /// Entered at the prompt during this session
    #[default]
    Interactive,
    /// Loaded from a saved environment file
    Persisted(PathBuf),
    /// Supplied through command line flags
    CommandLine,
}

/// Address and credentials of one S3 endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTarget {
    /// Display name of this connection
    pub key: String,

    /// Host and optional port, without scheme
    pub endpoint: String,

    /// Use HTTPS
    #[serde(default)]
    pub secure: bool,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Bucket to enter after connecting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_bucket: Option<String>,

    /// Signing region
    #[serde(default = "default_region")]
    pub region: String,

    /// Origin of this record, never persisted
    #[serde(skip)]
    pub origin: TargetOrigin,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Split an optional `http://` or `https://` scheme off a URL
///
/// Returns the remaining endpoint and whether the scheme asked for TLS.
pub fn split_scheme(url: &str) -> (&str, Option<bool>) {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") {
        (&url[7..], Some(false))
    } else if lower.starts_with("https://") {
        (&url[8..], Some(true))
    } else {
        (url, None)
    }
}

impl ConnectionTarget {
    /// Create a new target with required fields
    pub fn new(
        key: impl Into<String>,
        endpoint: impl Into<String>,
        secure: bool,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            endpoint: endpoint.into(),
            secure,
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            default_bucket: None,
            region: default_region(),
            origin: TargetOrigin::Interactive,
        }
    }

    /// Create a target from a URL, defaulting to TLS when no scheme is given
    pub fn from_url(
        key: impl Into<String>,
        url: &str,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        let (endpoint, secure) = split_scheme(url);
        Self::new(
            key,
            endpoint,
            secure.unwrap_or(true),
            access_key,
            secret_key,
        )
    }

    /// Default bucket, treating an empty name as none
    pub fn default_bucket(&self) -> Option<&str> {
        self.default_bucket.as_deref().filter(|b| !b.is_empty())
    }

    /// Full endpoint URL including the scheme
    pub fn endpoint_url(&self) -> Result<url::Url> {
        let scheme = if self.secure { "https" } else { "http" };
        Ok(url::Url::parse(&format!("{scheme}://{}", self.endpoint))?)
    }
}

/// Check if a string is a valid environment name
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ' ');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidEnvironment(format!(
            "the environment key {name:?} contains invalid characters"
        )))
    }
}

/// Ask the user for a new connection target
///
/// A URL scheme decides transport security, otherwise the user is asked.
pub fn prompt_target(key: &str, input: &mut dyn LineSource) -> Result<ConnectionTarget> {
    let url = read_non_empty(input, "URL> ")?;
    let (endpoint, secure) = split_scheme(&url);
    let secure = match secure {
        Some(secure) => secure,
        None => {
            let answer = read_non_empty(input, "Secure (yes/no)?> ")?;
            answer.starts_with(['y', 'Y'])
        }
    };
    let access_key = read_non_empty(input, "Access Key> ")?;
    let secret_key = read_non_empty(input, "Secret Key> ")?;

    Ok(ConnectionTarget::new(
        key, endpoint, secure, access_key, secret_key,
    ))
}

/// Manager for saved environments
#[derive(Debug)]
pub struct EnvironmentManager {
    dir: PathBuf,
}

impl EnvironmentManager {
    /// Create a manager below a specific configuration directory
    pub fn in_config_dir(config_dir: &Path) -> Self {
        Self {
            dir: config_dir.join("env"),
        }
    }

    /// Directory holding the environment files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Check if an environment exists
    pub fn exists(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.path_for(name).is_file())
    }

    /// Load an environment by name
    pub fn load(&self, name: &str) -> Result<ConnectionTarget> {
        validate_name(name)?;
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(Error::NotFound(format!(
                "environment {name:?} does not exist"
            )));
        }
        read_target(&path)
    }

    /// Save an environment under its key
    ///
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, target: &ConnectionTarget) -> Result<PathBuf> {
        validate_name(&target.key)?;
        std::fs::create_dir_all(&self.dir)?;

        let path = self.path_for(&target.key);
        let content = serde_json::to_string_pretty(target)?;
        std::fs::write(&path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)?;
        }

        Ok(path)
    }

    /// Load an environment, creating it interactively when missing
    pub fn load_or_create(
        &self,
        name: &str,
        input: &mut dyn LineSource,
    ) -> Result<ConnectionTarget> {
        if self.exists(name)? {
            return self.load(name);
        }

        tracing::info!(name, "creating new environment");
        let mut target = prompt_target(name, input)?;
        let path = self.save(&target)?;
        target.origin = TargetOrigin::Persisted(path);
        Ok(target)
    }

    /// List all saved environments, sorted by key
    ///
    /// Unreadable files are skipped with a warning.
    pub fn list(&self) -> Result<Vec<ConnectionTarget>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut targets = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match read_target(&path) {
                Ok(target) => targets.push(target),
                Err(e) => {
                    tracing::warn!("failed to load environment {}: {e}", path.display());
                }
            }
        }

        targets.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(targets)
    }
}

fn read_target(path: &Path) -> Result<ConnectionTarget> {
    let content = std::fs::read_to_string(path)?;
    let mut target: ConnectionTarget = serde_json::from_str(&content).map_err(|e| {
        Error::InvalidEnvironment(format!("malformed environment file: {e}"))
    })?;
    target.origin = TargetOrigin::Persisted(path.to_path_buf());
    Ok(target)
}
