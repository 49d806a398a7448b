//! Static render configuration, read once at startup.
//!
//! Loaded from a JSON file; every key except the executable path has a
//! default. The value is wrapped in an `Arc` by the caller and never
//! mutated afterwards.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Admission capacity when the file does not set one.
pub const DEFAULT_MAX_CONCURRENT_RENDERS: usize = 2;

/// Process wall-clock budget when the file does not set one.
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 900;

/// Upper bound on `render_timeout_secs` (one day).
pub const MAX_RENDER_TIMEOUT_SECS: u64 = 86_400;

/// Error loading or validating the render configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// How the image size is passed to the executable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStyle {
    /// `--res WxH`
    #[default]
    Combined,
    /// `--width W --height H`
    Separate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    #[serde(alias = "sd_executable_path")]
    pub executable_path: PathBuf,
    pub models_path: PathBuf,
    pub output_dir: PathBuf,
    /// Inserted verbatim right after the executable, e.g. `["--turbo"]`.
    pub extra_args: Vec<String>,
    pub max_concurrent_renders: usize,
    pub render_timeout_secs: u64,
    pub resolution_style: ResolutionStyle,
    /// Emit `--cfg-scale` only for executables that understand it.
    pub cfg_scale_supported: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            executable_path: PathBuf::new(),
            models_path: PathBuf::new(),
            output_dir: std::env::temp_dir(),
            extra_args: Vec::new(),
            max_concurrent_renders: DEFAULT_MAX_CONCURRENT_RENDERS,
            render_timeout_secs: DEFAULT_RENDER_TIMEOUT_SECS,
            resolution_style: ResolutionStyle::default(),
            cfg_scale_supported: false,
        }
    }
}

impl RenderConfig {
    /// Read `path` as JSON and validate it.
    ///
    /// A missing file is not an error: defaults are used, and validation
    /// then fails unless the executable path was provided some other way.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_json(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executable_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "executable_path must be set".to_string(),
            ));
        }
        if self.max_concurrent_renders == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_renders must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_RENDER_TIMEOUT_SECS).contains(&self.render_timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "render_timeout_secs must be between 1 and {MAX_RENDER_TIMEOUT_SECS}"
            )));
        }
        Ok(())
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}
