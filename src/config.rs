use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::criteria;
use crate::models::MatchWeights;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub geocode: GeocodeSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Location of the cohort CSV files
#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_data_directory")]
    pub directory: String,
    #[serde(default = "default_mentees_application")]
    pub mentees_application: String,
    #[serde(default = "default_mentees_interview")]
    pub mentees_interview: String,
    #[serde(default = "default_mentors_application")]
    pub mentors_application: String,
    #[serde(default = "default_mentors_interview")]
    pub mentors_interview: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            directory: default_data_directory(),
            mentees_application: default_mentees_application(),
            mentees_interview: default_mentees_interview(),
            mentors_application: default_mentors_application(),
            mentors_interview: default_mentors_interview(),
        }
    }
}

fn default_data_directory() -> String { "data".to_string() }
fn default_mentees_application() -> String { "mentees_application.csv".to_string() }
fn default_mentees_interview() -> String { "mentees_interview.csv".to_string() }
fn default_mentors_application() -> String { "mentors_application.csv".to_string() }
fn default_mentors_interview() -> String { "mentors_interview.csv".to_string() }

/// Geocoding backend endpoints and cache sizing
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeSettings {
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,
    #[serde(default = "default_opencage_url")]
    pub opencage_url: String,
    #[serde(default)]
    pub opencage_api_key: Option<String>,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for GeocodeSettings {
    fn default() -> Self {
        Self {
            nominatim_url: default_nominatim_url(),
            opencage_url: default_opencage_url(),
            opencage_api_key: None,
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_nominatim_url() -> String { "https://nominatim.openstreetmap.org".to_string() }
fn default_opencage_url() -> String { "https://api.opencagedata.com/geocode/v1/json".to_string() }
fn default_cache_capacity() -> u64 { 10_000 }
fn default_cache_ttl_secs() -> u64 { 86_400 }

/// Thresholds and weight table for a matching run
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_age_max_difference")]
    pub age_max_difference: f64,
    #[serde(default = "default_geographic_max_distance")]
    pub geographic_max_distance: f64,
    #[serde(default)]
    pub weights: WeightsConfig,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            age_max_difference: default_age_max_difference(),
            geographic_max_distance: default_geographic_max_distance(),
            weights: WeightsConfig::default(),
        }
    }
}

fn default_age_max_difference() -> f64 { 30.0 }
fn default_geographic_max_distance() -> f64 { 200.0 }

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_academia_weight")]
    pub academia: f64,
    #[serde(default = "default_age_difference_weight")]
    pub age_difference: f64,
    #[serde(default = "default_gender_weight")]
    pub gender: f64,
    #[serde(default = "default_languages_weight")]
    pub languages: f64,
}

impl WeightsConfig {
    /// Convert to the weight table consumed by the engine.
    pub fn to_weights(&self) -> MatchWeights {
        MatchWeights::from_iter([
            (criteria::ACADEMIA.to_string(), self.academia),
            (criteria::AGE_DIFFERENCE.to_string(), self.age_difference),
            (criteria::GENDER.to_string(), self.gender),
            (criteria::LANGUAGES.to_string(), self.languages),
        ])
    }
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            academia: default_academia_weight(),
            age_difference: default_age_difference_weight(),
            gender: default_gender_weight(),
            languages: default_languages_weight(),
        }
    }
}

fn default_academia_weight() -> f64 { 0.45 }
fn default_age_difference_weight() -> f64 { 0.25 }
fn default_gender_weight() -> f64 { 0.15 }
fn default_languages_weight() -> f64 { 0.15 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MENTORA)
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with MENTORA)
            // e.g., MENTORA__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("MENTORA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        // The OpenCage key is conventionally provided as a bare variable.
        if let Ok(key) = std::env::var("OPEN_CAGE_DATA") {
            builder = builder.set_override("geocode.opencage_api_key", key)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MENTORA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Weight table from the configured values.
    pub fn weights(&self) -> MatchWeights {
        self.matching.weights.to_weights()
    }
}
