//! Configuration management for the restaurant finder
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and validates every setting once at startup.

use anyhow::{Context, Result, bail};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::DatasetFormat;
use crate::prompt::PromptTemplate;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// AI completion service settings
    pub ai: AiConfig,
    /// Restaurant dataset location
    pub data: DataConfig,
    /// Geocoding of search locations
    pub geocoding: GeocodingConfig,
    /// Persistent cache settings
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Default search settings
    pub defaults: DefaultsConfig,
    /// Prompt template used to interpret free-text requests
    pub prompt: PromptTemplate,
}

/// Gemini API settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// API key; falls back to the `GEMINI_API_KEY` environment variable
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Timeout for one completion call in seconds
    pub timeout_seconds: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    S3,
    Local,
}

/// Where the restaurant export lives
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub source: SourceKind,
    /// S3 bucket name
    pub bucket: Option<String>,
    /// S3 region; taken from the AWS environment when unset
    pub region: Option<String>,
    /// Directory for the local source
    pub root: Option<String>,
    /// Object key (or file name for the local source)
    pub key: String,
    /// csv or json; inferred from the key extension when unset
    pub format: Option<DatasetFormat>,
    pub timeout_seconds: u32,
    /// How long a fetched dataset snapshot is reused
    pub refresh_minutes: u32,
}

/// Open-Meteo geocoding settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_seconds: u32,
    /// How long geocoding results stay in the persistent cache
    pub cache_ttl_hours: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory location
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

/// Default search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Maximum number of restaurants returned per search
    pub max_results: u32,
}

// Default value functions
fn default_ai_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ai_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_ai_timeout() -> u32 {
    30
}

fn default_bucket() -> String {
    "restaurant-finder-raw-data".to_string()
}

fn default_data_key() -> String {
    "Restaurants_in_LA_20250907.csv".to_string()
}

fn default_data_timeout() -> u32 {
    60
}

fn default_refresh_minutes() -> u32 {
    60
}

fn default_geocoding_base_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_geocoding_timeout() -> u32 {
    10
}

fn default_geocoding_cache_ttl() -> u32 {
    24 * 7
}

fn default_cache_location() -> String {
    "~/.cache/restaurant-finder".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_max_results() -> u32 {
    10
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_ai_base_url(),
            model: default_ai_model(),
            timeout_seconds: default_ai_timeout(),
            temperature: 0.1,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::S3,
            bucket: Some(default_bucket()),
            region: None,
            root: None,
            key: default_data_key(),
            format: None,
            timeout_seconds: default_data_timeout(),
            refresh_minutes: default_refresh_minutes(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_geocoding_base_url(),
            timeout_seconds: default_geocoding_timeout(),
            cache_ttl_hours: default_geocoding_cache_ttl(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

impl FinderConfig {
    /// Load configuration from the default file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // RESTAURANT_FINDER__AI__MODEL=... overrides ai.model
        builder = builder.add_source(
            Environment::with_prefix("RESTAURANT_FINDER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: FinderConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if config.ai.api_key.is_none() {
            config.ai.api_key = std::env::var("GEMINI_API_KEY").ok();
        }

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("restaurant-finder").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.ai.base_url.is_empty() {
            self.ai.base_url = default_ai_base_url();
        }
        if self.ai.model.is_empty() {
            self.ai.model = default_ai_model();
        }
        if self.ai.timeout_seconds == 0 {
            self.ai.timeout_seconds = default_ai_timeout();
        }
        if self.data.timeout_seconds == 0 {
            self.data.timeout_seconds = default_data_timeout();
        }
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_geocoding_timeout();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.max_results == 0 {
            self.defaults.max_results = default_max_results();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_data_source()?;
        self.validate_prompt()?;
        Ok(())
    }

    /// The key is optional at load time (structured-only searches never call
    /// the AI), but if given it must look plausible
    pub fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.ai.api_key {
            if api_key.trim().is_empty() {
                bail!("AI API key cannot be empty if provided. Either remove it or provide a valid key.");
            }
            if api_key.len() > 200 {
                bail!("AI API key appears to be invalid (too long). Please check your API key.");
            }
        }
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.ai.timeout_seconds > 300 {
            bail!("AI timeout cannot exceed 300 seconds");
        }
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            bail!("AI temperature must be between 0.0 and 2.0");
        }
        if self.data.timeout_seconds > 600 {
            bail!("Dataset fetch timeout cannot exceed 600 seconds");
        }
        if self.geocoding.timeout_seconds > 120 {
            bail!("Geocoding timeout cannot exceed 120 seconds");
        }
        if self.defaults.max_results > 100 {
            bail!("Maximum results cannot exceed 100");
        }
        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            );
        }

        for (name, url) in [
            ("AI base URL", &self.ai.base_url),
            ("Geocoding base URL", &self.geocoding.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("{name} must be a valid HTTP or HTTPS URL");
            }
        }
        Ok(())
    }

    fn validate_data_source(&self) -> Result<()> {
        if self.data.key.trim().is_empty() {
            bail!("data.key must name the dataset object");
        }
        match self.data.source {
            SourceKind::S3 if self.data.bucket.as_deref().is_none_or(str::is_empty) => {
                bail!("data.bucket is required for the s3 source")
            }
            SourceKind::Local if self.data.root.as_deref().is_none_or(str::is_empty) => {
                bail!("data.root is required for the local source")
            }
            _ => Ok(()),
        }
    }

    fn validate_prompt(&self) -> Result<()> {
        if self.prompt.system.trim().is_empty() {
            bail!("prompt.system cannot be empty");
        }
        if self.prompt.version.trim().is_empty() {
            bail!("prompt.version cannot be empty");
        }
        Ok(())
    }

    /// Cache directory with a leading `~` expanded
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        match self.cache.location.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(rest)),
            None => PathBuf::from(&self.cache.location),
        }
    }
}
