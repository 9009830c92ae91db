//! Pipeline configuration.
//!
//! YAML file with every field optional; missing values take the defaults
//! below. See [`PipelineConfig::default_path`] for the lookup location.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::{hex_to_rgb, RgbColor};
use crate::error::{Error, Result};

/// Result cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached results.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Lifetime of a cached result in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_capacity() -> usize {
    20
}
fn default_ttl_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

/// Strategy selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Emotion-primary is chosen when `|E-0.5| + |V-0.5|` exceeds this.
    #[serde(default = "default_extremity_threshold")]
    pub extremity_threshold: f64,

    /// Chroma multiplier for the balanced blend, unless overridden per request.
    #[serde(default = "default_intensity_multiplier")]
    pub intensity_multiplier: f64,
}

fn default_extremity_threshold() -> f64 {
    0.6
}
fn default_intensity_multiplier() -> f64 {
    1.0
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            extremity_threshold: default_extremity_threshold(),
            intensity_multiplier: default_intensity_multiplier(),
        }
    }
}

/// Performance reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Requests slower than this are logged as warnings.
    #[serde(default = "default_slow_request_ms")]
    pub slow_request_ms: u64,
}

fn default_slow_request_ms() -> u64 {
    50
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            slow_request_ms: default_slow_request_ms(),
        }
    }
}

/// Enhancer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancerConfig {
    /// Color used when an input hex cannot be parsed.
    #[serde(default = "default_fallback_hex")]
    pub fallback_hex: String,
}

fn default_fallback_hex() -> String {
    "#7c6f9b".to_string()
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            fallback_hex: default_fallback_hex(),
        }
    }
}

/// Accent selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccentConfig {
    /// Accent used when no color could be processed.
    #[serde(default = "default_accent_hex")]
    pub default_hex: String,

    /// Palette keys tried in order.
    #[serde(default = "default_priority")]
    pub priority: Vec<String>,
}

fn default_accent_hex() -> String {
    "#cba6f7".to_string()
}
fn default_priority() -> Vec<String> {
    ["VIBRANT", "PROMINENT", "DARK_VIBRANT", "LIGHT_VIBRANT"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for AccentConfig {
    fn default() -> Self {
        Self {
            default_hex: default_accent_hex(),
            priority: default_priority(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Result cache.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Strategy selection.
    #[serde(default)]
    pub strategy: StrategyConfig,

    /// Performance reporting.
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Enhancer.
    #[serde(default)]
    pub enhancer: EnhancerConfig,

    /// Accent selection.
    #[serde(default)]
    pub accent: AccentConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            cache: CacheConfig::default(),
            strategy: StrategyConfig::default(),
            performance: PerformanceConfig::default(),
            enhancer: EnhancerConfig::default(),
            accent: AccentConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config dir>/musical-oklab/config.yaml`, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("musical-oklab").join("config.yaml"))
    }

    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ConfigNotFound(path.display().to_string()),
            _ => Error::Io(e),
        })?;

        Self::parse(&content)
    }

    /// Parses and validates configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error with line number if parsing fails.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map_or(0, |l| l.line());
            Error::ConfigParse {
                line,
                message: e.to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration with fallback to defaults.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            tracing::debug!(path = %path.display(), error = %e, "using default configuration");
            Self::default()
        })
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache.capacity == 0 {
            return Err(invalid("cache.capacity", "must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.strategy.extremity_threshold) {
            return Err(invalid("strategy.extremity_threshold", "must be within [0, 1]"));
        }
        if !(self.strategy.intensity_multiplier.is_finite()
            && self.strategy.intensity_multiplier > 0.0)
        {
            return Err(invalid("strategy.intensity_multiplier", "must be a positive number"));
        }
        hex_to_rgb(&self.enhancer.fallback_hex)
            .map_err(|e| invalid("enhancer.fallback_hex", &e.to_string()))?;
        hex_to_rgb(&self.accent.default_hex)
            .map_err(|e| invalid("accent.default_hex", &e.to_string()))?;
        Ok(())
    }

    /// Cache TTL as a Duration.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Slow request threshold as a Duration.
    #[must_use]
    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.performance.slow_request_ms)
    }

    /// Parsed enhancer fallback color.
    pub fn fallback_rgb(&self) -> Result<RgbColor> {
        hex_to_rgb(&self.enhancer.fallback_hex)
    }

    /// Parsed default accent color.
    pub fn default_accent_rgb(&self) -> Result<RgbColor> {
        hex_to_rgb(&self.accent.default_hex)
    }
}

fn invalid(key: &str, message: &str) -> Error {
    Error::ConfigInvalid {
        key: key.to_string(),
        message: message.to_string(),
    }
}
