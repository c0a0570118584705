//! Configuration module
//!
//! Settings come from a TOML file (`$CAMPUS_AUTH_CONFIG`, or
//! `<config dir>/campus-auth/config.toml`) and are then overridden by
//! environment variables. A missing file means defaults. The signing secret
//! and database URL have no defaults: [`AppConfig::validate`] refuses to
//! start without them.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::auth::password::{MAX_COST, MIN_COST};
use crate::auth::{JwtConfig, PasswordHasher};
use crate::infrastructure::DatabaseConfig;

/// Environment variable pointing at the config file.
pub const CONFIG_PATH_ENV: &str = "CAMPUS_AUTH_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("signing secret is not set (JWT_SECRET or security.jwt_secret)")]
    MissingSecret,

    #[error("database URL is not set (DATABASE_URL or database.url)")]
    MissingDatabaseUrl,

    #[error("security.bcrypt_cost must be between {MIN_COST} and {MAX_COST}, got {0}")]
    InvalidBcryptCost(u32),

    #[error(
        "security.jwt_expiration_hours must be between 1 and {max}, got {0}",
        max = JwtConfig::MAX_EXPIRATION_HOURS
    )]
    InvalidExpiration(i64),
}

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

/// Token and password settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    #[serde(deserialize_with = "deserialize_secret")]
    pub jwt_secret: Option<SecretString>,
    pub jwt_expiration_hours: i64,
    pub jwt_issuer: String,
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiration_hours: JwtConfig::DEFAULT_EXPIRATION_HOURS,
            jwt_issuer: JwtConfig::DEFAULT_ISSUER.to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// `<config dir>/campus-auth/config.toml`, falling back to the working directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("campus-auth"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.toml")
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    env_var(name)
        .map(|value| value.parse().map_err(|_| ConfigError::InvalidEnv { name, value }))
        .transpose()
}

impl AppConfig {
    /// Read the file at `path` (defaults if absent) and apply env overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Environment variables win over the file.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = env_var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(secret) = env_var("JWT_SECRET") {
            self.security.jwt_secret = Some(SecretString::from(secret));
        }
        if let Some(hours) = parse_env("JWT_EXPIRATION_HOURS")? {
            self.security.jwt_expiration_hours = hours;
        }
        if let Some(host) = env_var("API_HOST") {
            self.server.api_host = host;
        }
        if let Some(port) = parse_env("API_PORT")? {
            self.server.api_port = port;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_none() {
            return Err(ConfigError::MissingSecret);
        }
        if self.database.url.is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if !(MIN_COST..=MAX_COST).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(self.security.bcrypt_cost));
        }
        if !(1..=JwtConfig::MAX_EXPIRATION_HOURS).contains(&self.security.jwt_expiration_hours) {
            return Err(ConfigError::InvalidExpiration(self.security.jwt_expiration_hours));
        }
        Ok(())
    }

    pub fn jwt_config(&self) -> Result<JwtConfig, ConfigError> {
        let secret = self
            .security
            .jwt_secret
            .as_ref()
            .ok_or(ConfigError::MissingSecret)?;

        Ok(JwtConfig {
            secret: SecretString::from(secret.expose_secret().to_string()),
            expiration_hours: self.security.jwt_expiration_hours,
            issuer: self.security.jwt_issuer.clone(),
        })
    }

    pub fn password_hasher(&self) -> PasswordHasher {
        PasswordHasher::new(self.security.bcrypt_cost)
    }
}
