use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::constants::{DEFAULT_OAUTH_REDIRECT, DEFAULT_STORAGE_BUCKET, REFERENCE_POINT};
use crate::location::Coordinates;

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
    #[error("failed to parse {name} as number: {source}")]
    ParseFloat {
        name: String,
        #[source]
        source: std::num::ParseFloatError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Which backend the gateway talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMode {
    /// Hosted backend reachable over HTTP.
    Rest { url: String, anon_key: String },
    /// No backend credentials; every gateway call fails with "not configured".
    Unconfigured,
}

/// Credentials for the S3-compatible storage endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Backend
    pub backend: BackendMode,
    pub http_timeout: Duration,
    pub oauth_redirect_url: String,

    // Storage
    pub storage_bucket: String,
    pub storage_s3: Option<S3Credentials>,

    // Screens
    pub demo_mode: bool,
    pub feed_page_size: usize,

    // Map
    pub map_reference: Coordinates,
    pub map_jitter_degrees: f64,

    // Logging
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let backend = match (env.optional("SUPABASE_URL"), env.optional("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => BackendMode::Rest {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
            },
            (Some(_), None) | (None, Some(_)) => {
                warn!("Only one of SUPABASE_URL and SUPABASE_ANON_KEY is set; backend stays unconfigured");
                BackendMode::Unconfigured
            }
            (None, None) => BackendMode::Unconfigured,
        };

        let storage_s3 = match (
            env.optional("STORAGE_S3_ACCESS_KEY_ID"),
            env.optional("STORAGE_S3_SECRET_ACCESS_KEY"),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Some(S3Credentials {
                access_key_id,
                secret_access_key,
                region: env.or_default("STORAGE_S3_REGION", "us-east-1"),
            }),
            _ => None,
        };

        Ok(Self {
            // Backend
            backend,
            http_timeout: Duration::from_secs(env.parse_u64("HTTP_TIMEOUT_SECS", 30)?),
            oauth_redirect_url: env.or_default("OAUTH_REDIRECT_URL", DEFAULT_OAUTH_REDIRECT),

            // Storage
            storage_bucket: env.or_default("STORAGE_BUCKET", DEFAULT_STORAGE_BUCKET),
            storage_s3,

            // Screens
            demo_mode: env.parse_bool("DEMO_MODE", true)?,
            feed_page_size: env.parse_usize("FEED_PAGE_SIZE", 20)?,

            // Map
            map_reference: Coordinates {
                latitude: env.parse_f64("MAP_REFERENCE_LAT", REFERENCE_POINT.latitude)?,
                longitude: env.parse_f64("MAP_REFERENCE_LON", REFERENCE_POINT.longitude)?,
            },
            map_jitter_degrees: env.parse_f64("MAP_JITTER_DEGREES", 0.5)?,

            // Logging
            log_format: parse_log_format(&env.or_default("LOG_FORMAT", "pretty"))?,
        })
    }

    /// Configuration for tests: no backend, demo data on.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            backend: BackendMode::Unconfigured,
            http_timeout: Duration::from_secs(5),
            oauth_redirect_url: DEFAULT_OAUTH_REDIRECT.to_string(),
            storage_bucket: DEFAULT_STORAGE_BUCKET.to_string(),
            storage_s3: None,
            demo_mode: true,
            feed_page_size: 20,
            map_reference: REFERENCE_POINT,
            map_jitter_degrees: 0.5,
            log_format: LogFormat::Pretty,
        }
    }

    /// Whether a real backend is configured.
    #[must_use]
    pub fn is_backend_configured(&self) -> bool {
        matches!(self.backend, BackendMode::Rest { .. })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "FEED_PAGE_SIZE".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "HTTP_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !self.map_jitter_degrees.is_finite() || self.map_jitter_degrees < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "MAP_JITTER_DEGREES".to_string(),
                message: "must be a non-negative number".to_string(),
            });
        }
        if self.storage_bucket.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "STORAGE_BUCKET".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if let BackendMode::Rest { url, .. } = &self.backend {
            let parsed = url::Url::parse(url).map_err(|e| ConfigError::InvalidValue {
                name: "SUPABASE_URL".to_string(),
                message: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidValue {
                    name: "SUPABASE_URL".to_string(),
                    message: format!("unsupported scheme '{}'", parsed.scheme()),
                });
            }
        }
        Ok(())
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn or_default(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn parse_u64(&self, name: &str, default: u64) -> Result<u64, ConfigError> {
        match self.optional(name) {
            Some(val) => val.parse().map_err(|e| ConfigError::ParseInt {
                name: name.to_string(),
                source: e,
            }),
            None => Ok(default),
        }
    }

    fn parse_usize(&self, name: &str, default: usize) -> Result<usize, ConfigError> {
        match self.optional(name) {
            Some(val) => val.parse().map_err(|e| ConfigError::ParseInt {
                name: name.to_string(),
                source: e,
            }),
            None => Ok(default),
        }
    }

    fn parse_f64(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        match self.optional(name) {
            Some(val) => val.parse().map_err(|e| ConfigError::ParseFloat {
                name: name.to_string(),
                source: e,
            }),
            None => Ok(default),
        }
    }

    fn parse_bool(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        match self.optional(name) {
            Some(val) => match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::ParseBool {
                    name: name.to_string(),
                    value: val,
                }),
            },
            None => Ok(default),
        }
    }
}

fn parse_log_format(value: &str) -> Result<LogFormat, ConfigError> {
    match value.to_lowercase().as_str() {
        "pretty" | "text" => Ok(LogFormat::Pretty),
        "json" | "structured" => Ok(LogFormat::Json),
        _ => Err(ConfigError::InvalidValue {
            name: "LOG_FORMAT".to_string(),
            message: format!("must be 'pretty' or 'json', got '{value}'"),
        }),
    }
}
