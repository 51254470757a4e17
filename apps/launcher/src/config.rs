//! Launcher configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/opengames/launcher.toml`
//! - Windows: `%APPDATA%/opengames/launcher.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use opengames_net::{DEFAULT_USER_AGENT, HttpConfig};
use serde::{Deserialize, Serialize};

/// Launcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one JSON file per game.
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: String,

    /// Bulletin text is cut to this many characters.
    #[serde(default = "default_news_max_chars")]
    pub news_max_chars: usize,

    /// Connect and read timeout for downloads, in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Total timeout for a bulletin fetch, in seconds.
    #[serde(default = "default_news_timeout")]
    pub news_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Schemes launched through the default handler in addition to
    /// http, https, steam and epic.
    #[serde(default)]
    pub extra_protocols: Vec<String>,

    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_catalog_dir() -> String {
    opengames_catalog::DEFAULT_CATALOG_DIR.into()
}

fn default_news_max_chars() -> usize {
    opengames_jobs::DEFAULT_NEWS_MAX_CHARS
}

fn default_download_timeout() -> u64 {
    60
}

fn default_news_timeout() -> u64 {
    20
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

fn default_log_filter() -> String {
    "info".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_dir: default_catalog_dir(),
            news_max_chars: default_news_max_chars(),
            download_timeout_secs: default_download_timeout(),
            news_timeout_secs: default_news_timeout(),
            user_agent: default_user_agent(),
            extra_protocols: Vec::new(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or the platform default location.
    /// A missing file is created with defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// HTTP settings for downloads and bulletin fetches.
    pub fn http(&self) -> HttpConfig {
        let download_timeout = Duration::from_secs(self.download_timeout_secs.max(1));
        HttpConfig {
            user_agent: self.user_agent.clone(),
            connect_timeout: download_timeout,
            read_timeout: download_timeout,
            bulletin_timeout: Duration::from_secs(self.news_timeout_secs.max(1)),
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("opengames")
            .join("launcher.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("opengames").join("launcher.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/opengames/launcher.toml"))
    }
}
