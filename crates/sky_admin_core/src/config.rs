//! Externally supplied runtime configuration.
//!
//! # Responsibility
//! - Load database, logging, and token settings from `SKY_ADMIN_*`
//!   environment variables.
//! - Validate values once, before any component is built from them.
//!
//! # Invariants
//! - No signing secret ships in code; a missing secret is an error.
//! - The secret never appears in `Debug` output or log lines.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "SKY_ADMIN_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "SKY_ADMIN_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SKY_ADMIN_LOG_DIR";
pub const ENV_JWT_SECRET: &str = "SKY_ADMIN_JWT_SECRET";
pub const ENV_JWT_TTL_SECS: &str = "SKY_ADMIN_JWT_TTL_SECS";
pub const ENV_TOKEN_HEADER: &str = "SKY_ADMIN_TOKEN_HEADER";

/// Two hours, matching the admin console session length.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(2 * 60 * 60);
pub const DEFAULT_TOKEN_HEADER: &str = "authorization";
pub const MIN_SECRET_LEN: usize = 32;

/// Configuration loading and validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "required setting `{key}` is not set"),
            Self::Invalid { key, reason } => write!(f, "setting `{key}` is invalid: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Token signing configuration.
#[derive(Clone)]
pub struct AuthConfig {
    secret: String,
    ttl: Duration,
    header_name: String,
}

impl Debug for AuthConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .field("header_name", &self.header_name)
            .finish()
    }
}

impl AuthConfig {
    /// Validates and builds a token configuration with the default header.
    ///
    /// # Errors
    /// - `Invalid` when the secret is shorter than `MIN_SECRET_LEN` bytes.
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: ENV_JWT_SECRET,
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }
        Ok(Self {
            secret,
            ttl,
            header_name: DEFAULT_TOKEN_HEADER.to_string(),
        })
    }

    pub fn with_header_name(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = header_name.into().trim().to_ascii_lowercase();
        self
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Lower-cased name of the header carrying the token.
    pub fn header_name(&self) -> &str {
        &self.header_name
    }
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` selects an in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// `None` disables file logging.
    pub log_dir: Option<String>,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a key to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let secret = value(ENV_JWT_SECRET).ok_or(ConfigError::Missing(ENV_JWT_SECRET))?;
        let ttl = match value(ENV_JWT_TTL_SECS) {
            Some(raw) => parse_ttl(&raw)?,
            None => DEFAULT_TOKEN_TTL,
        };
        let mut auth = AuthConfig::new(secret, ttl)?;
        if let Some(header_name) = value(ENV_TOKEN_HEADER) {
            auth = auth.with_header_name(header_name);
        }

        Ok(Self {
            db_path: value(ENV_DB_PATH).map(PathBuf::from),
            log_level: value(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: value(ENV_LOG_DIR),
            auth,
        })
    }
}

fn parse_ttl(raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            key: ENV_JWT_TTL_SECS,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(err) => Err(ConfigError::Invalid {
            key: ENV_JWT_TTL_SECS,
            reason: err.to_string(),
        }),
    }
}
