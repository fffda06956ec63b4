use crate::pricing::PricingMode;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub rate_table: RateTableConfig,
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
            rate_table: RateTableConfig::from_env()?,
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

/// Where the rate table comes from and how often it is reloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTableConfig {
    pub url: Option<String>,
    pub path: Option<PathBuf>,
    pub auto_refresh: bool,
    pub refresh_interval: Duration,
    pub mode: PricingMode,
}

impl Default for RateTableConfig {
    fn default() -> Self {
        Self {
            url: None,
            path: None,
            auto_refresh: true,
            refresh_interval: Duration::from_secs(60),
            mode: PricingMode::DesiredMargin,
        }
    }
}

impl RateTableConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let url = non_empty_var("RATE_CARD_URL");
        let path = non_empty_var("RATE_CARD_PATH").map(PathBuf::from);

        let auto_refresh = match non_empty_var("RATE_CARD_AUTO_REFRESH") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "RATE_CARD_AUTO_REFRESH",
                value: raw,
            })?,
            None => defaults.auto_refresh,
        };

        let refresh_interval = match non_empty_var("RATE_CARD_REFRESH_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidRefreshInterval)?,
            None => defaults.refresh_interval,
        };

        let mode = match non_empty_var("RATE_CARD_MODE") {
            Some(raw) => raw
                .parse::<PricingMode>()
                .map_err(|_| ConfigError::InvalidMode { value: raw })?,
            None => defaults.mode,
        };

        Ok(Self {
            url,
            path,
            auto_refresh,
            refresh_interval,
            mode,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidRefreshInterval,
    InvalidFlag { name: &'static str, value: String },
    InvalidMode { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidRefreshInterval => {
                write!(f, "RATE_CARD_REFRESH_SECS must be a positive number of seconds")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false, got '{value}'")
            }
            ConfigError::InvalidMode { value } => write!(
                f,
                "RATE_CARD_MODE must be desired_margin or target_margin, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidRefreshInterval
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidMode { .. } => None,
        }
    }
}
