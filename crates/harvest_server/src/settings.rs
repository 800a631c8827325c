use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use harvest_engine::{FetchSettings, HarvestConfig, Schedule};
use serde::{Deserialize, Serialize};

/// Where the harvested records are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreLocation {
    JsonFile(PathBuf),
    /// sqlx connection URL, e.g. `sqlite://data/articles.db`.
    Sqlite(String),
}

/// HTTP limits, in plain numbers so the settings file stays readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        let defaults = FetchSettings::default();
        Self {
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            request_timeout_secs: defaults.request_timeout.as_secs(),
            redirect_limit: defaults.redirect_limit,
            max_bytes: defaults.max_bytes,
            user_agent: None,
        }
    }
}

impl FetchOptions {
    pub fn to_fetch_settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            ..defaults
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub harvest: HarvestConfig,
    pub store: StoreLocation,
    pub fetch: FetchOptions,
    pub reparse_hours: u64,
    pub run_at_startup: bool,
    pub bind: String,
    pub default_count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            harvest: HarvestConfig::default(),
            store: StoreLocation::JsonFile(PathBuf::from("articles.json")),
            fetch: FetchOptions::default(),
            reparse_hours: 12,
            run_at_startup: true,
            bind: "127.0.0.1:8080".to_string(),
            default_count: 10,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings = Self::parse(&content)
            .with_context(|| format!("invalid settings in {}", path.display()))?;
        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = ron::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        self.harvest.validate()?;
        if self.reparse_hours == 0 {
            bail!("reparse_hours must be at least 1");
        }
        let max_hours = Schedule::MAX_INTERVAL.as_secs() / (60 * 60);
        if self.reparse_hours > max_hours {
            bail!("reparse_hours must be at most {max_hours}, got {}", self.reparse_hours);
        }
        Ok(())
    }
}
