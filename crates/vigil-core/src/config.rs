//! Analytics configuration
//!
//! Loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/vigil/config/analytics.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::{ForecastHorizon, MAX_HORIZON_DAYS, MAX_RANGE_DAYS, MIN_HORIZON_DAYS};
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/analytics.toml");

/// Settings for the narrative insight backends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightSettings {
    pub enabled: bool,
    /// Per-request timeout
    pub timeout: Duration,
    /// Extra attempts after a failed request
    pub max_retries: u32,
    /// Insights kept from a single response
    pub max_insights: usize,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(30),
            max_retries: 1,
            max_insights: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsConfig {
    /// Horizon used when a request does not name one
    pub forecast_horizon: ForecastHorizon,
    /// Days of history analysed when no range is given
    pub lookback_days: u32,
    pub insights: InsightSettings,
    /// Where the config was read from (`None` = embedded defaults)
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            forecast_horizon: ForecastHorizon::default(),
            lookback_days: 90,
            insights: InsightSettings::default(),
            source: None,
        }
    }
}

impl AnalyticsConfig {
    /// Load from the default override location, else embedded defaults
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Self::embedded(),
        }
    }

    /// Load from an explicit file (a missing file is an error)
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::InvalidData(format!(
                "Failed to read config {}: {}",
                path.display(),
                e
            ))
        })?;
        let mut config = parse_config(&content)?;
        config.source = Some(path.to_path_buf());
        debug!(path = %path.display(), "Loaded analytics config override");
        Ok(config)
    }

    /// The defaults compiled into the binary
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("vigil").join("config").join("analytics.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawDefaults>,
    insights: Option<RawInsights>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    forecast_horizon_days: Option<u32>,
    lookback_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawInsights {
    enabled: Option<bool>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    max_insights: Option<usize>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<AnalyticsConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::InvalidData(format!("Invalid config TOML: {}", e)))?;

    let mut config = AnalyticsConfig::default();

    if let Some(defaults) = raw.defaults {
        if let Some(days) = defaults.forecast_horizon_days {
            config.forecast_horizon = ForecastHorizon::new(days).map_err(|_| {
                Error::Configuration(format!(
                    "defaults.forecast_horizon_days must be between {} and {}, got {}",
                    MIN_HORIZON_DAYS, MAX_HORIZON_DAYS, days
                ))
            })?;
        }
        if let Some(days) = defaults.lookback_days {
            if !(1..=MAX_RANGE_DAYS).contains(&days) {
                return Err(Error::Configuration(format!(
                    "defaults.lookback_days must be between 1 and {}, got {}",
                    MAX_RANGE_DAYS, days
                )));
            }
            config.lookback_days = days;
        }
    }

    if let Some(insights) = raw.insights {
        if let Some(enabled) = insights.enabled {
            config.insights.enabled = enabled;
        }
        if let Some(secs) = insights.timeout_secs {
            config.insights.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = insights.max_retries {
            config.insights.max_retries = retries;
        }
        if let Some(max) = insights.max_insights {
            config.insights.max_insights = max;
        }
    }

    Ok(config)
}
