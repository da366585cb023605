//! Configuration loading and representation.
//!
//! [`AppConfig`] is built once at startup and then only read. Nothing else in
//! the workspace looks at environment variables.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Process-wide execution mode.
///
/// Development mode exposes trace text in error bodies and logs every
/// error; production mode only logs unexpected ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    Development,
    #[default]
    Production,
}

impl ExecutionMode {
    /// `"development"` selects development mode; any other value is production.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("development") {
            Self::Development
        } else {
            Self::Production
        }
    }

    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl core::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Immutable application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub mode: ExecutionMode,
    pub host: IpAddr,
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Emit an extra, detailed record for every incoming request.
    pub debug_requests: bool,
    /// Path prefixes the request logger ignores.
    pub request_log_skip: Vec<String>,
    pub shutdown_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            debug_requests: false,
            request_log_skip: Vec::new(),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode = get("APP_ENV")
            .map(|v| ExecutionMode::parse(&v))
            .unwrap_or(defaults.mode);

        let host = match get("HOST") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "HOST",
                expected: "an IP address",
                value: raw,
            })?,
            None => defaults.host,
        };

        let port = parse_number(get("PORT"), "PORT", defaults.port)?;
        let database_max_connections = parse_number(
            get("DATABASE_MAX_CONNECTIONS"),
            "DATABASE_MAX_CONNECTIONS",
            defaults.database_max_connections,
        )?;
        let shutdown_secs = parse_number(
            get("SHUTDOWN_TIMEOUT_SECS"),
            "SHUTDOWN_TIMEOUT_SECS",
            defaults.shutdown_timeout.as_secs(),
        )?;
        let body_limit_bytes =
            parse_number(get("BODY_LIMIT_BYTES"), "BODY_LIMIT_BYTES", defaults.body_limit_bytes)?;

        let request_log_skip = get("REQUEST_LOG_SKIP")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            mode,
            host,
            port,
            database_url: get("DATABASE_URL"),
            database_max_connections,
            debug_requests: get("DEBUG_REQUESTS").is_some_and(|v| v.trim() == "true"),
            request_log_skip,
            shutdown_timeout: Duration::from_secs(shutdown_secs),
            body_limit_bytes,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_number<T: core::str::FromStr>(
    raw: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected: "a non-negative integer",
            value: raw,
        }),
        None => Ok(default),
    }
}
