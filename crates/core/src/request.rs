//! Inbound generation request, defaults, and validation.
//!
//! Every wire field is optional so a missing prompt surfaces as a
//! [`CoreError::Validation`] (HTTP 400) instead of a deserialization
//! rejection. [`GenerationRequest::into_params`] applies defaults and
//! produces the immutable [`RenderParams`] consumed by the command builder.

use serde::Deserialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_STEPS: u32 = 1;
pub const DEFAULT_WIDTH: u32 = 512;
pub const DEFAULT_HEIGHT: u32 = 512;
/// Seed value meaning "let the renderer pick one".
pub const RANDOM_SEED: i64 = -1;
pub const DEFAULT_CFG_SCALE: f64 = 7.0;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

pub const MAX_STEPS: u32 = 150;
pub const MAX_DIMENSION: u32 = 4096;
pub const MAX_CFG_SCALE: f64 = 30.0;
/// Maximum length of the prompt and negative prompt, in characters.
pub const MAX_PROMPT_LEN: usize = 4096;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// `POST /generate` body as sent by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRequest {
    pub prompt: Option<String>,
    pub negative_prompt: Option<String>,
    pub steps: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub seed: Option<i64>,
    pub cfg_scale: Option<f64>,
}

/// Validated job parameters with every default resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub prompt: String,
    /// Empty when the client did not supply one.
    pub negative_prompt: String,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
    pub seed: i64,
    pub cfg_scale: f64,
}

impl RenderParams {
    /// Parameters for `prompt` with every other field at its default.
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            steps: DEFAULT_STEPS,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            seed: RANDOM_SEED,
            cfg_scale: DEFAULT_CFG_SCALE,
        }
    }
}

impl GenerationRequest {
    /// Apply defaults and validate, consuming the request.
    pub fn into_params(self) -> Result<RenderParams, CoreError> {
        let prompt = self.prompt.unwrap_or_default();
        validate_prompt(&prompt)?;

        let negative_prompt = self.negative_prompt.unwrap_or_default();
        validate_text_len("negative_prompt", &negative_prompt)?;

        let steps = self.steps.unwrap_or(DEFAULT_STEPS);
        validate_range("steps", steps, MAX_STEPS)?;

        let width = self.width.unwrap_or(DEFAULT_WIDTH);
        validate_range("width", width, MAX_DIMENSION)?;

        let height = self.height.unwrap_or(DEFAULT_HEIGHT);
        validate_range("height", height, MAX_DIMENSION)?;

        let cfg_scale = self.cfg_scale.unwrap_or(DEFAULT_CFG_SCALE);
        validate_cfg_scale(cfg_scale)?;

        Ok(RenderParams {
            prompt,
            negative_prompt,
            steps,
            width,
            height,
            seed: self.seed.unwrap_or(RANDOM_SEED),
            cfg_scale,
        })
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// The prompt must be present, non-blank, and at most `MAX_PROMPT_LEN` chars.
pub fn validate_prompt(prompt: &str) -> Result<(), CoreError> {
    if prompt.trim().is_empty() {
        return Err(CoreError::Validation("prompt is required".to_string()));
    }
    validate_text_len("prompt", prompt)
}

fn validate_text_len(field: &str, value: &str) -> Result<(), CoreError> {
    if value.chars().count() > MAX_PROMPT_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must not exceed {MAX_PROMPT_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_range(field: &str, value: u32, max: u32) -> Result<(), CoreError> {
    if value == 0 || value > max {
        return Err(CoreError::Validation(format!(
            "{field} must be between 1 and {max}"
        )));
    }
    Ok(())
}

fn validate_cfg_scale(value: f64) -> Result<(), CoreError> {
    if !value.is_finite() || !(0.0..=MAX_CFG_SCALE).contains(&value) {
        return Err(CoreError::Validation(format!(
            "cfg_scale must be between 0 and {MAX_CFG_SCALE}"
        )));
    }
    Ok(())
}
