use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::classifier::ClassifierConfig;
use crate::constants::{
    DEFAULT_SITE_ORIGIN, DEFAULT_THREAD_MAX_DEPTH, DEFAULT_THREAD_MAX_SIBLINGS,
    DEFAULT_THREAD_MIN_SIBLINGS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
    #[error("failed to parse {name} as URL: {source}")]
    ParseUrl {
        name: String,
        #[source]
        source: url::ParseError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_path: PathBuf,
    pub export_path: Option<PathBuf>,

    // Classification
    pub site_origin: Url,
    pub thread_min_siblings: usize,
    pub thread_max_siblings: usize,
    pub thread_max_depth: usize,
    pub debug_type_detection: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Storage
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/tweets.sqlite")),
            export_path: optional_env("EXPORT_PATH").map(PathBuf::from),

            // Classification
            site_origin: parse_env_url("SITE_ORIGIN", DEFAULT_SITE_ORIGIN)?,
            thread_min_siblings: parse_env_usize(
                "THREAD_MIN_SIBLINGS",
                DEFAULT_THREAD_MIN_SIBLINGS,
            )?,
            thread_max_siblings: parse_env_usize(
                "THREAD_MAX_SIBLINGS",
                DEFAULT_THREAD_MAX_SIBLINGS,
            )?,
            thread_max_depth: parse_env_usize("THREAD_MAX_DEPTH", DEFAULT_THREAD_MAX_DEPTH)?,
            debug_type_detection: parse_env_bool("DEBUG_TYPE_DETECTION", false)?,
        })
    }

    /// Configuration with defaults and an explicit database path, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            database_path: PathBuf::from(":memory:"),
            export_path: None,
            site_origin: default_origin(),
            thread_min_siblings: DEFAULT_THREAD_MIN_SIBLINGS,
            thread_max_siblings: DEFAULT_THREAD_MAX_SIBLINGS,
            thread_max_depth: DEFAULT_THREAD_MAX_DEPTH,
            debug_type_detection: false,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_min_siblings == 0 {
            return Err(ConfigError::InvalidValue {
                name: "THREAD_MIN_SIBLINGS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.thread_max_siblings < self.thread_min_siblings {
            return Err(ConfigError::InvalidValue {
                name: "THREAD_MAX_SIBLINGS".to_string(),
                message: format!(
                    "must be at least THREAD_MIN_SIBLINGS ({})",
                    self.thread_min_siblings
                ),
            });
        }
        if self.thread_max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                name: "THREAD_MAX_DEPTH".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !matches!(self.site_origin.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                name: "SITE_ORIGIN".to_string(),
                message: format!("must be an http(s) URL, got '{}'", self.site_origin),
            });
        }
        Ok(())
    }

    /// The subset of settings the classifier consumes.
    #[must_use]
    pub fn classifier(&self) -> ClassifierConfig {
        ClassifierConfig {
            site_origin: self.site_origin.clone(),
            thread_siblings: self.thread_min_siblings..=self.thread_max_siblings,
            thread_max_depth: self.thread_max_depth,
            debug_signals: self.debug_type_detection,
        }
    }
}

pub(crate) fn default_origin() -> Url {
    Url::parse(DEFAULT_SITE_ORIGIN).expect("default site origin is a valid URL")
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_url(name: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = env_or_default(name, default);
    Url::parse(&raw).map_err(|e| ConfigError::ParseUrl {
        name: name.to_string(),
        source: e,
    })
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => parse_bool(name, &val),
        _ => Ok(default),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ParseBool {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
