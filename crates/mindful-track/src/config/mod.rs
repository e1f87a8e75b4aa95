use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::engagement::service::{ServiceSettings, DEFAULT_RECENT_ACTIVITY_LIMIT};
use crate::engagement::{
    ActivityCategory, CategoryTargets, ScoreWeights, ScoringError, DEFAULT_MATCH_LIMIT,
};

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
    pub engagement: ServiceSettings,
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
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            engagement: load_engagement_settings()?,
        })
    }
}

fn load_engagement_settings() -> Result<ServiceSettings, ConfigError> {
    let weights = ScoreWeights::new(
        env_or("SCORE_WEIGHT_ATTENDANCE", ScoreWeights::ATTENDANCE)?,
        env_or("SCORE_WEIGHT_PARTICIPATION", ScoreWeights::PARTICIPATION)?,
        env_or("SCORE_WEIGHT_RESOURCES", ScoreWeights::RESOURCES)?,
    )?;

    let defaults = CategoryTargets::default();
    let targets = CategoryTargets::new(
        env_or(
            "SCORE_TARGET_ATTENDANCE",
            defaults.target(ActivityCategory::Attendance),
        )?,
        env_or(
            "SCORE_TARGET_PARTICIPATION",
            defaults.target(ActivityCategory::Participation),
        )?,
        env_or(
            "SCORE_TARGET_RESOURCES",
            defaults.target(ActivityCategory::Resources),
        )?,
    )?;

    Ok(ServiceSettings {
        weights,
        targets,
        recent_activity_limit: env_or("RECENT_ACTIVITY_LIMIT", DEFAULT_RECENT_ACTIVITY_LIMIT)?,
        mentor_match_limit: env_or("MENTOR_MATCH_LIMIT", DEFAULT_MATCH_LIMIT)?,
    })
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
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

/// Log filter and output controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    Scoring(ScoringError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a number (got '{value}')")
            }
            ConfigError::Scoring(err) => write!(f, "invalid scoring configuration: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Scoring(err) => Some(err),
        }
    }
}

impl From<ScoringError> for ConfigError {
    fn from(value: ScoringError) -> Self {
        Self::Scoring(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const KEYS: [&str; 12] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "SCORE_WEIGHT_ATTENDANCE",
        "SCORE_WEIGHT_PARTICIPATION",
        "SCORE_WEIGHT_RESOURCES",
        "SCORE_TARGET_ATTENDANCE",
        "SCORE_TARGET_PARTICIPATION",
        "SCORE_TARGET_RESOURCES",
        "RECENT_ACTIVITY_LIMIT",
        "MENTOR_MATCH_LIMIT",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.telemetry.ansi);
        assert_eq!(config.engagement, ServiceSettings::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCORE_WEIGHT_ATTENDANCE", "0.5");
        let result = AppConfig::load();
        reset_env();
        assert!(matches!(
            result,
            Err(ConfigError::Scoring(ScoringError::InvalidWeights { .. }))
        ));
    }

    #[test]
    fn accepts_rebalanced_weights_and_limits() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCORE_WEIGHT_ATTENDANCE", "0.5");
        env::set_var("SCORE_WEIGHT_PARTICIPATION", "0.3");
        env::set_var("SCORE_WEIGHT_RESOURCES", "0.2");
        env::set_var("MENTOR_MATCH_LIMIT", "5");
        let config = AppConfig::load().expect("config loads");
        reset_env();
        assert_eq!(config.engagement.weights.attendance(), 0.5);
        assert_eq!(config.engagement.mentor_match_limit, 5);
    }

    #[test]
    fn rejects_non_numeric_limits() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RECENT_ACTIVITY_LIMIT", "ten");
        let result = AppConfig::load();
        reset_env();
        match result {
            Err(ConfigError::InvalidNumber { key, value }) => {
                assert_eq!(key, "RECENT_ACTIVITY_LIMIT");
                assert_eq!(value, "ten");
            }
            other => panic!("expected invalid number error, got {other:?}"),
        }
    }
}
