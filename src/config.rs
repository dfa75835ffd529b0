use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::window::{PaginationPolicy, MAX_BATCH_SIZE};

pub const DEFAULT_API_URL: &str = "https://joblisting-rd8f.onrender.com/api";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub page_size: u32,
    pub fetch_limit: u32, // batch size in client pagination mode
    pub pagination: PaginationPolicy,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: 5,
            fetch_limit: MAX_BATCH_SIZE,
            pagination: PaginationPolicy::Client,
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Read `config.toml` from the user config dir, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(anyhow!("page_size must be greater than 0"));
        }
        if self.fetch_limit < self.page_size {
            return Err(anyhow!(
                "fetch_limit ({}) must be at least page_size ({})",
                self.fetch_limit,
                self.page_size
            ));
        }
        if self.fetch_limit > MAX_BATCH_SIZE {
            return Err(anyhow!(
                "fetch_limit ({}) must be at most {}",
                self.fetch_limit,
                MAX_BATCH_SIZE
            ));
        }
        if self.api_url.trim().is_empty() {
            return Err(anyhow!("api_url must not be empty"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("", "", "jobboard")
    }

    pub fn default_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Where the terminal UI writes its log.
    pub fn log_path() -> PathBuf {
        match Self::project_dirs() {
            Some(dirs) => dirs.data_dir().join("jobboard.log"),
            None => PathBuf::from("jobboard.log"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml("pagination = \"server\"\npage_size = 3\n").unwrap();
        assert_eq!(config.pagination, PaginationPolicy::Server);
        assert_eq!(config.page_size, 3);
        assert_eq!(config.fetch_limit, 50);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.pagination, PaginationPolicy::Client);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_bad_sizes() {
        assert!(Config::from_toml("page_size = 0").is_err());
        assert!(Config::from_toml("page_size = 10\nfetch_limit = 5").is_err());
        assert!(Config::from_toml("pagination = \"sideways\"").is_err());
        assert!(Config::from_toml("fetch_limit = 500").is_err());
        assert!(Config::from_toml("fetch_limit = 50").is_ok());
    }
}
