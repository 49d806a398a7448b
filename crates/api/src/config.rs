use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use imagegen_core::config::{ConfigError, RenderConfig};
use imagegen_render::dispatcher::RUNNER_GRACE;

use crate::background::artifact_retention::RetentionPolicy;

/// Slack added to the longest possible dispatch when `REQUEST_TIMEOUT_SECS`
/// is unset.
pub const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(30);

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. The render
/// settings (executable, models, capacity) live in a separate JSON file
/// pointed to by `render_config_path`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds. `None` derives it from the render
    /// timeout; see [`ServerConfig::request_timeout`].
    pub request_timeout_secs: Option<u64>,
    /// How long to wait for in-flight requests after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// Path of the JSON render configuration.
    pub render_config_path: PathBuf,
    /// Age after which artifacts are deleted. `0` disables cleanup.
    pub artifact_retention_secs: u64,
    pub artifact_cleanup_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                 |
    /// |----------------------------------|-------------------------|
    /// | `HOST`                           | `0.0.0.0`               |
    /// | `PORT`                           | `5000`                  |
    /// | `CORS_ORIGINS`                   | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`           | derived from render config |
    /// | `SHUTDOWN_TIMEOUT_SECS`          | `30`                    |
    /// | `RENDER_CONFIG`                  | `config.json`           |
    /// | `ARTIFACT_RETENTION_SECS`        | `86400`                 |
    /// | `ARTIFACT_CLEANUP_INTERVAL_SECS` | `600`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let render_config_path = std::env::var("RENDER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.json"));

        let artifact_cleanup_interval_secs: u64 = env_or("ARTIFACT_CLEANUP_INTERVAL_SECS", 600)?;
        if artifact_cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "ARTIFACT_CLEANUP_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host,
            port: env_or("PORT", 5000)?,
            cors_origins,
            request_timeout_secs: env_opt("REQUEST_TIMEOUT_SECS")?,
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30)?,
            render_config_path,
            artifact_retention_secs: env_or("ARTIFACT_RETENTION_SECS", 86_400)?,
            artifact_cleanup_interval_secs,
        })
    }

    /// HTTP request timeout for a server dispatching with `render`.
    ///
    /// Must be longer than the longest a dispatch can take (render timeout
    /// plus runner grace) so every `/generate` answer comes from the
    /// dispatcher, never from the timeout layer. Defaults to that bound
    /// plus [`REQUEST_TIMEOUT_MARGIN`].
    pub fn request_timeout(&self, render: &RenderConfig) -> Result<Duration, ConfigError> {
        let longest_dispatch = render.render_timeout().saturating_add(RUNNER_GRACE);
        match self.request_timeout_secs {
            None => Ok(longest_dispatch.saturating_add(REQUEST_TIMEOUT_MARGIN)),
            Some(secs) if Duration::from_secs(secs) > longest_dispatch => {
                Ok(Duration::from_secs(secs))
            }
            Some(secs) => Err(ConfigError::Invalid(format!(
                "REQUEST_TIMEOUT_SECS ({secs}) must exceed render_timeout_secs plus {}s grace ({}s)",
                RUNNER_GRACE.as_secs(),
                longest_dispatch.as_secs()
            ))),
        }
    }

    /// Artifact cleanup settings, or `None` when retention is disabled.
    pub fn retention_policy(&self) -> Option<RetentionPolicy> {
        (self.artifact_retention_secs > 0).then(|| RetentionPolicy {
            max_age: Duration::from_secs(self.artifact_retention_secs),
            interval: Duration::from_secs(self.artifact_cleanup_interval_secs),
        })
    }
}

/// Parse `key` from the environment, falling back to `default` when unset.
fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    Ok(env_opt(key)?.unwrap_or(default))
}

/// Parse `key` from the environment, `None` when unset.
fn env_opt<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{key} has an invalid value: {raw:?}"))),
        Err(_) => Ok(None),
    }
}
