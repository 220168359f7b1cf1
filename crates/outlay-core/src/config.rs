//! Pipeline configuration
//!
//! Every tunable of a run (bucket count, outlier quantile, forecast horizon,
//! ...) lives in [`PipelineConfig`].
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a three-layer resolution:
//! 1. Explicit path passed by the caller (e.g. `--config`), if it exists
//! 2. Override in data dir (~/.local/share/outlay/config/pipeline.toml)
//! 3. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from an override file keep their default values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::DEFAULT_CATEGORY;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/pipeline.toml");

/// Loader settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Label for rows without a category
    pub default_category: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

/// Category bucketing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Number of categories kept as-is
    pub top_k: usize,
    /// Label of the synthetic bucket holding everything else
    pub others_label: String,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            top_k: 6,
            others_label: "Others".to_string(),
        }
    }
}

/// Outlier cap settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierConfig {
    /// Quantile of daily totals the cap is derived from, in [0, 1]
    pub quantile: f64,
    /// Multiplier applied to the quantile
    pub multiplier: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            quantile: 0.98,
            multiplier: 1.5,
        }
    }
}

/// Longest forecast horizon accepted, in days
pub const MAX_HORIZON_DAYS: u32 = 3660;

/// Forecast settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Days predicted beyond the last historical date
    pub horizon_days: u32,
    /// Coverage of the uncertainty interval, in (0, 1)
    pub interval_width: f64,
    /// Minimum distinct dates required before a forecast is attempted
    pub min_distinct_dates: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            interval_width: 0.8,
            min_distinct_dates: 2,
        }
    }
}

/// All settings for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub loader: LoaderConfig,
    pub buckets: BucketConfig,
    pub outliers: OutlierConfig,
    pub forecast: ForecastConfig,
}

impl PipelineConfig {
    /// Load using the standard resolution order
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        load_config(explicit)
    }

    /// Parse a TOML document, filling missing keys from defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// Reject settings that would make a stage meaningless
    pub fn validate(&self) -> Result<()> {
        if self.buckets.top_k == 0 {
            return Err(Error::InvalidData("buckets.top_k must be at least 1".into()));
        }
        if self.buckets.others_label.trim().is_empty() {
            return Err(Error::InvalidData(
                "buckets.others_label must not be empty".into(),
            ));
        }
        if self.loader.default_category.trim().is_empty() {
            return Err(Error::InvalidData(
                "loader.default_category must not be empty".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.outliers.quantile) {
            return Err(Error::InvalidData(format!(
                "outliers.quantile must be within [0, 1], got {}",
                self.outliers.quantile
            )));
        }
        if !self.outliers.multiplier.is_finite() || self.outliers.multiplier <= 0.0 {
            return Err(Error::InvalidData(format!(
                "outliers.multiplier must be positive, got {}",
                self.outliers.multiplier
            )));
        }
        if !(self.forecast.interval_width > 0.0 && self.forecast.interval_width < 1.0) {
            return Err(Error::InvalidData(format!(
                "forecast.interval_width must be within (0, 1), got {}",
                self.forecast.interval_width
            )));
        }
        if self.forecast.horizon_days > MAX_HORIZON_DAYS {
            return Err(Error::InvalidData(format!(
                "forecast.horizon_days must be at most {}, got {}",
                MAX_HORIZON_DAYS, self.forecast.horizon_days
            )));
        }
        if self.forecast.min_distinct_dates < 2 {
            return Err(Error::InvalidData(
                "forecast.min_distinct_dates must be at least 2".into(),
            ));
        }
        Ok(())
    }

    /// Render as TOML (for `outlay config`)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidData(format!("Failed to render config: {}", e)))
    }
}

/// Get the default override config path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("outlay").join("config").join("pipeline.toml"))
}

/// Resolve which file (if any) the config would be read from
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }
    default_config_path().filter(|p| p.exists())
}

/// Load configuration (explicit path, then override, then default)
fn load_config(explicit: Option<&Path>) -> Result<PipelineConfig> {
    let content = match resolve_config_path(explicit) {
        Some(path) => {
            debug!("Loading pipeline config from {}", path.display());
            fs::read_to_string(&path)
                .map_err(|e| Error::InvalidData(format!("Failed to read config: {}", e)))?
        }
        None => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    loader: Option<RawLoader>,
    buckets: Option<RawBuckets>,
    outliers: Option<RawOutliers>,
    forecast: Option<RawForecast>,
}

#[derive(Debug, Deserialize)]
struct RawLoader {
    default_category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBuckets {
    top_k: Option<usize>,
    others_label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOutliers {
    quantile: Option<f64>,
    multiplier: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    horizon_days: Option<u32>,
    interval_width: Option<f64>,
    min_distinct_dates: Option<usize>,
}

/// Parse TOML content into config
fn parse_config(content: &str) -> Result<PipelineConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::InvalidData(format!("Invalid config TOML: {}", e)))?;

    let mut config = PipelineConfig::default();

    if let Some(loader) = raw.loader {
        if let Some(category) = loader.default_category {
            config.loader.default_category = category;
        }
    }

    if let Some(buckets) = raw.buckets {
        if let Some(top_k) = buckets.top_k {
            config.buckets.top_k = top_k;
        }
        if let Some(label) = buckets.others_label {
            config.buckets.others_label = label;
        }
    }

    if let Some(outliers) = raw.outliers {
        if let Some(quantile) = outliers.quantile {
            config.outliers.quantile = quantile;
        }
        if let Some(multiplier) = outliers.multiplier {
            config.outliers.multiplier = multiplier;
        }
    }

    if let Some(forecast) = raw.forecast {
        if let Some(horizon) = forecast.horizon_days {
            config.forecast.horizon_days = horizon;
        }
        if let Some(width) = forecast.interval_width {
            config.forecast.interval_width = width;
        }
        if let Some(min_dates) = forecast.min_distinct_dates {
            config.forecast.min_distinct_dates = min_dates;
        }
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_default_matches_code_default() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
[buckets]
top_k = 3

[forecast]
horizon_days = 14
"#,
        )
        .unwrap();

        assert_eq!(config.buckets.top_k, 3);
        assert_eq!(config.buckets.others_label, "Others");
        assert_eq!(config.forecast.horizon_days, 14);
        assert_eq!(config.outliers.quantile, 0.98);
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(PipelineConfig::from_toml("[buckets]\ntop_k = 0").is_err());
        assert!(PipelineConfig::from_toml("[outliers]\nquantile = 1.5").is_err());
        assert!(PipelineConfig::from_toml("[forecast]\ninterval_width = 1.0").is_err());
        assert!(PipelineConfig::from_toml("[forecast]\nmin_distinct_dates = 1").is_err());
        assert!(PipelineConfig::from_toml("[forecast]\nhorizon_days = 4000000000").is_err());
        assert!(PipelineConfig::from_toml("[forecast]\nhorizon_days = 3660").is_ok());
        assert!(PipelineConfig::from_toml("not toml [").is_err());
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        fs::write(&path, "[outliers]\nmultiplier = 2.0\n").unwrap();

        let config = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.outliers.multiplier, 2.0);
        assert_eq!(resolve_config_path(Some(&path)), Some(path));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = PipelineConfig::default();
        config.buckets.top_k = 4;
        let rendered = config.to_toml().unwrap();
        assert_eq!(PipelineConfig::from_toml(&rendered).unwrap(), config);
    }
}
