use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub(crate) const ENV_AI_URL: &str = "BUDGETRACK_AI_URL";
pub(crate) const ENV_DB: &str = "BUDGETRACK_DB";
pub(crate) const ENV_LOG: &str = "BUDGETRACK_LOG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) ai: AiConfig,
    pub(crate) analytics: AnalyticsConfig,
    /// Overrides the database location (otherwise `<data_dir>/budgetrack.db`).
    pub(crate) db_path: Option<PathBuf>,
    /// `EnvFilter` directive, e.g. `info` or `budgetrack=debug`.
    pub(crate) log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct AiConfig {
    pub(crate) base_url: Option<String>,
    pub(crate) timeout_secs: u64,
    pub(crate) debounce_ms: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 5,
            debounce_ms: 800,
        }
    }
}

impl AiConfig {
    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub(crate) fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Tunables for the insight generator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct AnalyticsConfig {
    pub(crate) history_months: usize,
    /// A low-spending anomaly only fires when the historical mean exceeds this.
    pub(crate) low_spending_floor: f64,
    pub(crate) trend_factor: f64,
    pub(crate) max_insights: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            history_months: 6,
            low_spending_floor: 50.0,
            trend_factor: 1.5,
            max_insights: 5,
        }
    }
}

impl Config {
    /// Read `config.toml` from `dir` when present, then apply environment overrides.
    pub(crate) fn load(dir: &Path) -> Result<Self> {
        let path = dir.join("config.toml");
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Invalid config: {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub(crate) fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_AI_URL) {
            let url = url.trim().to_string();
            self.ai.base_url = if url.is_empty() { None } else { Some(url) };
        }
        if let Some(db) = lookup(ENV_DB).filter(|s| !s.trim().is_empty()) {
            self.db_path = Some(PathBuf::from(db));
        }
        if let Some(level) = lookup(ENV_LOG).filter(|s| !s.trim().is_empty()) {
            self.log_level = Some(level);
        }
    }
}
