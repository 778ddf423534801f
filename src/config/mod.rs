//! Configuration module for the voicegate server
//!
//! All configuration is read from environment variables, optionally seeded
//! from a `.env` file loaded in `main` before [`ServerConfig::from_env`]
//! runs. Missing required variables and unparsable values fail startup with
//! a [`ConfigError`] rather than surfacing later mid-request.
//!
//! # Example
//! ```rust,no_run
//! use voicegate::config::ServerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::core::voice::elevenlabs::DEFAULT_BASE_URL;

/// Default bind host.
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port.
const DEFAULT_PORT: u16 = 3000;

/// Default Postgres pool size.
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Default inbound rate limit (requests per second per IP).
const DEFAULT_RATE_LIMIT_RPS: u32 = 60;

/// Default rate limit burst size.
const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

/// TLS configuration for HTTPS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    InvalidVar { var: &'static str, value: String },

    #[error("TLS requires both TLS_CERT_PATH and TLS_KEY_PATH to be set")]
    PartialTls,
}

/// Server configuration
///
/// Contains all configuration needed to run the voicegate server, including:
/// - Server settings (host, port, TLS)
/// - Postgres connection settings
/// - Voice provider credentials (ElevenLabs API key and agent id)
/// - Security settings (CORS, rate limiting)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Store settings
    pub database_url: String,
    pub database_max_connections: u32,

    // Voice provider settings
    pub elevenlabs_api_key: String,
    /// Conversational agent the signed URLs are minted for. Fixed per
    /// deployment; clients never choose the agent.
    pub elevenlabs_agent_id: String,
    /// API origin override. Production leaves the default; tests point this
    /// at a local mock server.
    pub elevenlabs_base_url: String,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,

    /// Maximum requests per second per IP address
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    pub rate_limit_burst_size: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let tls = match (
            non_empty_var("TLS_CERT_PATH"),
            non_empty_var("TLS_KEY_PATH"),
        ) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        Ok(Self {
            host: non_empty_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parsed_var("PORT", DEFAULT_PORT)?,
            tls,
            database_url: required_var("DATABASE_URL")?,
            database_max_connections: parsed_var(
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DB_MAX_CONNECTIONS,
            )?,
            elevenlabs_api_key: required_var("ELEVENLABS_API_KEY")?,
            elevenlabs_agent_id: required_var("ELEVENLABS_AGENT_ID")?,
            elevenlabs_base_url: non_empty_var("ELEVENLABS_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            cors_allowed_origins: non_empty_var("CORS_ALLOWED_ORIGINS"),
            rate_limit_requests_per_second: parsed_var(
                "RATE_LIMIT_REQUESTS_PER_SECOND",
                DEFAULT_RATE_LIMIT_RPS,
            )?,
            rate_limit_burst_size: parsed_var("RATE_LIMIT_BURST_SIZE", DEFAULT_RATE_LIMIT_BURST)?,
        })
    }

    /// The `host:port` string the server binds to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    non_empty_var(name).ok_or(ConfigError::MissingVar(name))
}

/// An environment variable's value, with unset and blank treated alike.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var: name, value: raw }),
        None => Ok(default),
    }
}
