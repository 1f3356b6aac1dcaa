use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::assignment::{AssignmentStrategy, BatchOptions, RoundRobinCounter, UnknownStrategy};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the review desk.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub assignment: AssignmentConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            assignment: AssignmentConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Defaults applied to batch assignments when a caller does not override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentConfig {
    pub strategy: AssignmentStrategy,
    pub exclude_same_unit: bool,
    pub only_active_reviewers: bool,
    /// Fixed starting point for round-robin rotation; the clock is used when unset.
    pub round_robin_seed: Option<u64>,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        let options = BatchOptions::default();
        Self {
            strategy: options.strategy,
            exclude_same_unit: options.exclude_same_unit,
            only_active_reviewers: options.only_active_reviewers,
            round_robin_seed: None,
        }
    }
}

impl AssignmentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let strategy = match env::var("REVIEW_STRATEGY") {
            Ok(raw) => raw
                .parse::<AssignmentStrategy>()
                .map_err(ConfigError::InvalidStrategy)?,
            Err(_) => defaults.strategy,
        };
        let exclude_same_unit = flag("REVIEW_EXCLUDE_SAME_UNIT", defaults.exclude_same_unit)?;
        let only_active_reviewers = flag("REVIEW_ONLY_ACTIVE", defaults.only_active_reviewers)?;
        let round_robin_seed = match env::var("REVIEW_ROUND_ROBIN_SEED") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidSeed)?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            strategy,
            exclude_same_unit,
            only_active_reviewers,
            round_robin_seed,
        })
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            strategy: self.strategy,
            exclude_same_unit: self.exclude_same_unit,
            only_active_reviewers: self.only_active_reviewers,
        }
    }

    pub fn counter(&self) -> RoundRobinCounter {
        match self.round_robin_seed {
            Some(seed) => RoundRobinCounter::new(seed),
            None => RoundRobinCounter::from_clock(),
        }
    }
}

fn flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { name }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidStrategy(UnknownStrategy),
    InvalidFlag { name: &'static str },
    InvalidSeed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidStrategy(err) => write!(f, "REVIEW_STRATEGY: {err}"),
            ConfigError::InvalidFlag { name } => write!(f, "{name} must be true or false"),
            ConfigError::InvalidSeed => write!(f, "REVIEW_ROUND_ROBIN_SEED must be a valid u64"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidStrategy(err) => Some(err),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidSeed => None,
        }
    }
}
