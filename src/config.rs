use crate::filter::{FilterOptions, SortKey, DEFAULT_CODE_COLUMN, DEFAULT_DATE_COLUMN};
use crate::paginator::DEFAULT_PAGE_SIZE;
use crate::session::DEFAULT_MAX_SESSIONS;
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the config file location
pub const CONFIG_PATH_ENV: &str = "CALLDESK_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub code_column: String,
    pub date_column: String,
    /// Used when a command names no window at all
    pub default_days: i64,
    pub min_days: i64,
    pub max_days: i64,
    pub sort_key: SortKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub page_size: usize,
    pub max_sessions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            code_column: DEFAULT_CODE_COLUMN.to_string(),
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            default_days: 500,
            min_days: 365,
            max_days: 1000,
            sort_key: SortKey::Code,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, max_sessions: DEFAULT_MAX_SESSIONS }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1:3000".to_string() }
    }
}

impl AnalysisConfig {
    pub fn filter_options(&self, sort_key: Option<SortKey>) -> FilterOptions {
        FilterOptions {
            code_column: self.code_column.clone(),
            date_column: self.date_column.clone(),
            sort_key: sort_key.unwrap_or(self.sort_key),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        // If config doesn't exist, create default
        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save_to(config_path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(config_path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let analysis = &self.analysis;
        if analysis.min_days < 0 || analysis.min_days > analysis.max_days {
            bail!(
                "analysis.min_days ({}) must be between 0 and analysis.max_days ({})",
                analysis.min_days,
                analysis.max_days
            );
        }
        if !(analysis.min_days..=analysis.max_days).contains(&analysis.default_days) {
            bail!(
                "analysis.default_days ({}) must lie within {}..={}",
                analysis.default_days,
                analysis.min_days,
                analysis.max_days
            );
        }
        if analysis.code_column.trim().is_empty() || analysis.date_column.trim().is_empty() {
            bail!("analysis.code_column and analysis.date_column must not be empty");
        }
        if self.pagination.page_size == 0 {
            bail!("pagination.page_size must be greater than zero");
        }
        if self.pagination.max_sessions == 0 {
            bail!("pagination.max_sessions must be greater than zero");
        }
        Ok(())
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let proj_dirs = ProjectDirs::from("com", "calldesk", "calldesk")
        .context("Failed to determine config directory")?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}
