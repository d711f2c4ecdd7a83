//! Configuration, read from `~/.config/freshet/config.toml` at startup.
//!
//! A default file is written on first run. Missing fields fall back to
//! defaults, so upgrades never invalidate an existing config.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde::Deserialize;

use crate::app::{FreshetError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Override for the database location; defaults to the platform data dir.
    pub db_path: Option<PathBuf>,
    /// Concurrent refresh workers.
    pub workers: usize,
    /// Per-request fetch timeout in seconds.
    pub fetch_timeout_secs: u64,
    /// Default interval for `freshet watch`, in seconds.
    pub watch_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            workers: 10,
            fetch_timeout_secs: 30,
            watch_interval_secs: 900,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::default_config_path()?;

        if !path.exists() {
            Self::write_default(&path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| FreshetError::Config(format!("{}: {e}", path.display())))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FreshetError::Config("could not find config directory".into()))?;
        Ok(config_dir.join("freshet").join("config.toml"))
    }

    pub fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| FreshetError::Config("could not find data directory".into()))?;
        let dir = data_dir.join("freshet");
        fs::create_dir_all(&dir)?;
        Ok(dir.join("freshet.db"))
    }

    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(p) => Ok(p.clone()),
            None => Self::default_db_path(),
        }
    }

    fn write_default(path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(Self::default_content().as_bytes())?;
        Ok(())
    }

    fn default_content() -> String {
        r#"# freshet configuration

# Where the article database lives. Defaults to the platform data dir.
# db_path = "/path/to/freshet.db"

# Concurrent refresh workers.
workers = 10

# Per-request fetch timeout, seconds.
fetch_timeout_secs = 30

# Default refresh interval for `freshet watch`, seconds.
watch_interval_secs = 900
"#
        .to_string()
    }
}
