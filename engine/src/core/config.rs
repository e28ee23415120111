use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_BATCH_CONCURRENCY, DEFAULT_PROGRESS_INTERVAL,
    ENV_BATCH_CONCURRENCY, ENV_BATCH_RATE, ENV_CONFIG, ENV_LOG, ENV_PROGRESS_INTERVAL,
    MAX_BATCH_RATE,
};

// =============================================================================
// File Config (all fields optional, merged in layers)
// =============================================================================

/// Batch configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BatchFileConfig {
    pub concurrency: Option<usize>,
    pub max_per_second: Option<u32>,
    pub progress_interval: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub batch: Option<BatchFileConfig>,
    pub log: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if self.extra.is_empty() {
            return;
        }
        let keys_str = self
            .extra
            .keys()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        tracing::warn!(
            fields = %keys_str,
            "Unknown fields in config file (possible typos)"
        );
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(batch) = other.batch {
            let current = self.batch.get_or_insert_with(BatchFileConfig::default);
            if batch.concurrency.is_some() {
                tracing::trace!(concurrency = ?batch.concurrency, "Merging batch.concurrency");
                current.concurrency = batch.concurrency;
            }
            if batch.max_per_second.is_some() {
                tracing::trace!(rate = ?batch.max_per_second, "Merging batch.max_per_second");
                current.max_per_second = batch.max_per_second;
            }
            if batch.progress_interval.is_some() {
                tracing::trace!(
                    interval = ?batch.progress_interval,
                    "Merging batch.progress_interval"
                );
                current.progress_interval = batch.progress_interval;
            }
        }
        if other.log.is_some() {
            self.log = other.log;
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

/// Batch execution settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Maximum simultaneously in-flight write operations
    pub concurrency: usize,
    /// Optional cap on operations started per second
    pub max_per_second: Option<u32>,
    /// Completed operations between progress callbacks
    pub progress_interval: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_BATCH_CONCURRENCY,
            max_per_second: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Fully resolved engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub batch: BatchConfig,
    /// Tracing filter directive, if configured
    pub log_filter: Option<String>,
}

impl EngineConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.querydeck/querydeck.json)
    /// 3. Explicit path argument, or the `QUERYDECK_CONFIG` path
    /// 4. Environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| env(ENV_CONFIG).map(PathBuf::from));
        Self::load_with(get_profile_config_path(), explicit, env)
    }

    /// Layered load with injectable sources
    pub fn load_with<F>(profile: Option<PathBuf>, explicit: Option<PathBuf>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        tracing::debug!("Loading engine configuration");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = profile.filter(|p| p.exists()) {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        if let Some(path) = explicit {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            let overlay_config = FileConfig::load_from_file(&expanded)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(expanded.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let file_batch = file_config.batch.unwrap_or_default();
        let defaults = BatchConfig::default();

        let concurrency = match env(ENV_BATCH_CONCURRENCY) {
            Some(raw) => parse_env(ENV_BATCH_CONCURRENCY, &raw)?,
            None => file_batch.concurrency.unwrap_or(defaults.concurrency),
        };
        let max_per_second = match env(ENV_BATCH_RATE) {
            Some(raw) => Some(parse_env(ENV_BATCH_RATE, &raw)?),
            None => file_batch.max_per_second,
        };
        let progress_interval = match env(ENV_PROGRESS_INTERVAL) {
            Some(raw) => parse_env(ENV_PROGRESS_INTERVAL, &raw)?,
            None => file_batch
                .progress_interval
                .unwrap_or(defaults.progress_interval),
        };

        let config = Self {
            batch: BatchConfig {
                concurrency,
                max_per_second,
                progress_interval,
            },
            log_filter: env(ENV_LOG).or(file_config.log),
        };
        config.validate()?;

        tracing::debug!(config = ?config, "Engine configuration resolved");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.batch.concurrency == 0 {
            anyhow::bail!("Configuration error: batch.concurrency must be greater than 0");
        }
        if self.batch.progress_interval == 0 {
            anyhow::bail!("Configuration error: batch.progress_interval must be greater than 0");
        }
        if self.batch.max_per_second == Some(0) {
            anyhow::bail!("Configuration error: batch.max_per_second must be greater than 0");
        }
        if let Some(rate) = self.batch.max_per_second
            && rate > MAX_BATCH_RATE
        {
            anyhow::bail!(
                "Configuration error: batch.max_per_second must be at most {}, got {}",
                MAX_BATCH_RATE,
                rate
            );
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
}

fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
