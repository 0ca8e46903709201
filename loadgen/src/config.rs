//! Load generator configuration
//!
//! Configuration is loaded from environment variables, then overridden by
//! command line flags. See `.env.example` for documentation.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::engine::EngineSettings;
use crate::stream::StreamSettings;
use crate::transport::HttpSettings;

/// Errors that can occur when validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("users must be at least 1")]
    NoUsers,

    #[error("spawn rate must be a positive number, got {0}")]
    InvalidSpawnRate(f64),

    #[error("minimum wait ({min:?}) exceeds maximum wait ({max:?})")]
    InvalidWait { min: Duration, max: Duration },

    #[error("report interval must be greater than zero")]
    InvalidReportInterval,

    #[error("stream connections must be at least 1")]
    NoStreamConnections,
}

/// Main configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Target base host, e.g. `http://localhost:8000`
    pub host: String,

    /// Simulated client settings
    pub engine: EngineSettings,

    /// HTTP client settings
    pub http: HttpSettings,

    /// Where to write the JSON report (optional)
    pub json_report: Option<PathBuf>,

    /// Address for the Prometheus exporter (optional)
    pub metrics_addr: Option<SocketAddr>,

    /// Stream stressor settings
    pub stream: StreamSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "http://localhost:8000".to_string(),
            engine: EngineSettings::default(),
            http: HttpSettings::default(),
            json_report: None,
            metrics_addr: None,
            stream: StreamSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Target
        if let Ok(host) = env::var("LOADGEN_HOST")
            && !host.is_empty()
        {
            config.host = host;
        }

        // Engine
        if let Ok(val) = env::var("LOADGEN_USERS")
            && let Ok(users) = val.parse()
        {
            config.engine.users = users;
        }
        if let Ok(val) = env::var("LOADGEN_SPAWN_RATE")
            && let Ok(rate) = val.parse()
        {
            config.engine.spawn_rate = rate;
        }
        if let Ok(val) = env::var("LOADGEN_RUN_TIME_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.engine.run_time = Some(Duration::from_secs(secs));
        }
        if let Ok(val) = env::var("LOADGEN_ITERATIONS")
            && let Ok(iterations) = val.parse()
        {
            config.engine.iterations = Some(iterations);
        }
        if let Ok(val) = env::var("LOADGEN_WAIT_MIN_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.engine.wait.min = Duration::from_millis(ms);
        }
        if let Ok(val) = env::var("LOADGEN_WAIT_MAX_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.engine.wait.max = Duration::from_millis(ms);
        }
        if let Ok(val) = env::var("LOADGEN_SEED")
            && let Ok(seed) = val.parse()
        {
            config.engine.seed = Some(seed);
        }
        if let Ok(val) = env::var("LOADGEN_REPORT_INTERVAL_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.engine.report_interval = Duration::from_secs(secs);
        }

        // HTTP
        if let Ok(val) = env::var("LOADGEN_REQUEST_TIMEOUT_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.http.request_timeout = Some(Duration::from_secs(secs));
        }

        // Output
        if let Ok(path) = env::var("LOADGEN_JSON_REPORT")
            && !path.is_empty()
        {
            config.json_report = Some(PathBuf::from(path));
        }
        if let Ok(val) = env::var("LOADGEN_METRICS_ADDR")
            && let Ok(addr) = val.parse()
        {
            config.metrics_addr = Some(addr);
        }

        // Stream stressor
        if let Ok(url) = env::var("STREAM_URL")
            && !url.is_empty()
        {
            config.stream.url = url;
        }
        if let Ok(val) = env::var("STREAM_CONNECTIONS")
            && let Ok(n) = val.parse()
        {
            config.stream.connections = n;
        }
        if let Ok(val) = env::var("STREAM_SPACING_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.stream.spacing = Duration::from_millis(ms);
        }

        config
    }

    /// Check the settings used by `run`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        if engine.users == 0 {
            return Err(ConfigError::NoUsers);
        }
        if !(engine.spawn_rate.is_finite() && engine.spawn_rate > 0.0) {
            return Err(ConfigError::InvalidSpawnRate(engine.spawn_rate));
        }
        if engine.wait.min > engine.wait.max {
            return Err(ConfigError::InvalidWait {
                min: engine.wait.min,
                max: engine.wait.max,
            });
        }
        if engine.report_interval.is_zero() {
            return Err(ConfigError::InvalidReportInterval);
        }
        Ok(())
    }

    /// Check the settings used by `stream`
    pub fn validate_stream(&self) -> Result<(), ConfigError> {
        if self.stream.connections == 0 {
            return Err(ConfigError::NoStreamConnections);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::WaitTime;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host, "http://localhost:8000");
        assert_eq!(config.engine.users, 1);
        assert_eq!(config.engine.wait, WaitTime::fixed(Duration::from_secs(1)));
        assert!(config.engine.run_time.is_none());
        assert!(config.engine.iterations.is_none());
        assert!(config.http.request_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env() {
        // This test doesn't set env vars, so it should return defaults
        let config = Config::from_env();
        assert_eq!(config.stream.spacing, Duration::from_millis(15));
    }

    #[test]
    fn test_validate_rejects_zero_users() {
        let mut config = Config::default();
        config.engine.users = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoUsers)));
    }

    #[test]
    fn test_validate_rejects_bad_spawn_rate() {
        let mut config = Config::default();
        config.engine.spawn_rate = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSpawnRate(_))
        ));
        config.engine.spawn_rate = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_wait() {
        let mut config = Config::default();
        config.engine.wait = WaitTime {
            min: Duration::from_millis(500),
            max: Duration::from_millis(100),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWait { .. })
        ));
    }

    #[test]
    fn test_validate_stream_rejects_zero_connections() {
        let mut config = Config::default();
        config.stream.connections = 0;
        assert!(config.validate_stream().is_err());
    }
}
