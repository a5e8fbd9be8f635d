//! Application configuration loaded from defaults, a TOML file, and the environment.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "gamecat";
/// Prefix for environment overrides, e.g. `GAMECAT_API_BASE_URL`.
pub const ENV_PREFIX: &str = "GAMECAT";
/// Backend used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

const DEFAULT_CONFIG: &str = r#"# gamecat configuration

# Base URL of the REST backend serving the /games resource.
api_base_url = "http://localhost:3000"

# Optional per-request timeout in seconds. Unset uses the HTTP client default.
# request_timeout_secs = 10

# Directory for gamecat.log. Defaults to ./logs.
# log_dir = "/tmp/gamecat-logs"
"#;

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the backend; `/games` is appended to it.
    pub api_base_url: String,
    /// Per-request timeout. `None` keeps the transport default.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Directory that receives the log file.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: None,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load configuration using `path` as the file source. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = ::config::Config::builder()
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .add_source(::config::File::from(path.to_path_buf()).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .context("failed to parse configuration")?;
        Ok(config)
    }

    /// Base URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Configured request timeout, if any.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Directory for log output, falling back to `./logs`.
    pub fn log_dir(&self) -> Result<PathBuf> {
        match &self.log_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()
                .context("failed to resolve working directory")?
                .join("logs")),
        }
    }
}

/// Location of the user configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

/// Write the commented default configuration if no file exists yet.
pub fn ensure_default_config() -> Result<()> {
    ensure_default_config_at(&config_path())
}

/// Same as [`ensure_default_config`] for an explicit path.
pub fn ensure_default_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}
