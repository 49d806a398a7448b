//! Argument vector builder for the rendering executable.
//!
//! Each argument is a discrete element; nothing here is ever joined into a
//! shell string, so prompt text cannot change the shape of the invocation.

use std::path::Path;

use crate::config::{RenderConfig, ResolutionStyle};
use crate::request::RenderParams;

pub const FLAG_MODELS_PATH: &str = "--models-path";
pub const FLAG_PROMPT: &str = "--prompt";
pub const FLAG_STEPS: &str = "--steps";
pub const FLAG_SEED: &str = "--seed";
pub const FLAG_RESOLUTION: &str = "--res";
pub const FLAG_WIDTH: &str = "--width";
pub const FLAG_HEIGHT: &str = "--height";
pub const FLAG_CFG_SCALE: &str = "--cfg-scale";
pub const FLAG_OUTPUT: &str = "--output";
pub const FLAG_NEGATIVE_PROMPT: &str = "--neg-prompt";

/// Build the full argv, executable first.
///
/// Order: executable, static extra args, `--models-path`, `--prompt`,
/// `--steps`, `--seed`, resolution, optional `--cfg-scale`, `--output`,
/// and `--neg-prompt` only when the negative prompt is non-empty.
pub fn build_args(config: &RenderConfig, params: &RenderParams, output_path: &Path) -> Vec<String> {
    let mut argv = Vec::with_capacity(20 + config.extra_args.len());

    argv.push(path_arg(&config.executable_path));
    argv.extend(config.extra_args.iter().cloned());
    push_flag(&mut argv, FLAG_MODELS_PATH, path_arg(&config.models_path));

    push_flag(&mut argv, FLAG_PROMPT, params.prompt.clone());
    push_flag(&mut argv, FLAG_STEPS, params.steps.to_string());
    push_flag(&mut argv, FLAG_SEED, params.seed.to_string());

    match config.resolution_style {
        ResolutionStyle::Combined => {
            push_flag(
                &mut argv,
                FLAG_RESOLUTION,
                format!("{}x{}", params.width, params.height),
            );
        }
        ResolutionStyle::Separate => {
            push_flag(&mut argv, FLAG_WIDTH, params.width.to_string());
            push_flag(&mut argv, FLAG_HEIGHT, params.height.to_string());
        }
    }

    if config.cfg_scale_supported {
        push_flag(&mut argv, FLAG_CFG_SCALE, format_decimal(params.cfg_scale));
    }

    push_flag(&mut argv, FLAG_OUTPUT, path_arg(output_path));

    if !params.negative_prompt.is_empty() {
        push_flag(&mut argv, FLAG_NEGATIVE_PROMPT, params.negative_prompt.clone());
    }

    argv
}

fn push_flag(argv: &mut Vec<String>, flag: &str, value: String) {
    argv.push(flag.to_string());
    argv.push(value);
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Render a float with a `.` decimal separator and at least one fractional
/// digit (`7.0`, `7.25`). Rust's formatter is locale-independent.
pub fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
