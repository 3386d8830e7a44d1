//! Shell settings
//!
//! Settings live in `<config dir>/config.toml`; connection records live next
//! to it under `env/`. The directory defaults to the platform config
//! location and can be moved with [`CONFIG_DIR_ENV`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Highest settings schema this build reads
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "S3CLIENT_CONFIG_DIR";

const SETTINGS_FILE: &str = "config.toml";

/// Resolve the configuration directory
pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|base| base.join("s3client"))
        .ok_or_else(|| Error::Config("no platform configuration directory".into()))
}

/// Contents of the settings file
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub schema_version: u32,
    #[serde(default)]
    pub defaults: ShellSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: ShellSettings::default(),
        }
    }
}

/// The `[defaults]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    pub color: ColorMode,
    /// Spinners during batch operations
    pub progress: bool,
    /// Keep command history across sessions
    pub history: bool,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            progress: true,
            history: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color only when writing to a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Whether to color output going to a terminal (`is_term`) or elsewhere
    pub fn enabled(self, is_term: bool) -> bool {
        match self {
            ColorMode::Auto => is_term,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Reads the settings file of one configuration directory
#[derive(Debug)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(SETTINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the settings, or defaults when the file does not exist
    pub fn load(&self) -> Result<Config> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e.into()),
        };

        let config: Config = toml::from_str(&text)?;
        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "{} has schema version {}, but only versions up to {SCHEMA_VERSION} are understood",
                self.path.display(),
                config.schema_version
            )));
        }
        tracing::debug!(path = %self.path.display(), "loaded settings");
        Ok(Config {
            schema_version: SCHEMA_VERSION,
            ..config
        })
    }
}
