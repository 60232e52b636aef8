//! Generation parameters
//!
//! Turns a loosely-typed `GenerateRequest` into validated `GenerationParams`,
//! applying defaults for anything the caller left out. Out-of-range values are
//! rejected here instead of being forwarded to the provider.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dto::job::GenerateRequest;

pub const DEFAULT_DURATION_SECS: u32 = 10;
pub const MIN_DURATION_SECS: u32 = 1;
pub const MAX_DURATION_SECS: u32 = 20;

pub const DEFAULT_RESOLUTION: &str = "1280*720";
/// Named presets and the `W*H` size each one stands for
pub const RESOLUTION_PRESETS: &[(&str, &str)] = &[
    ("480p", "832*480"),
    ("720p", "1280*720"),
    ("1080p", "1920*1080"),
];
pub const MIN_SIDE_PX: u32 = 64;
pub const MAX_SIDE_PX: u32 = 4096;

pub const MAX_PROMPT_CHARS: usize = 2000;

/// Rejected generation request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Prompt is required")]
    MissingPrompt,

    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Duration must be between {min} and {max} seconds (got {value})")]
    DurationOutOfRange { value: i64, min: u32, max: u32 },

    #[error("Invalid quality '{0}': expected WIDTH*HEIGHT or one of 480p, 720p, 1080p")]
    InvalidResolution(String),
}

/// Validated parameters handed to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub prompt: String,
    pub duration_secs: u32,
    pub resolution: String,
    pub negative_prompt: String,
    pub expand_prompt: bool,
}

impl GenerationParams {
    /// Validate a request body and fill in defaults
    pub fn from_request(req: GenerateRequest) -> Result<Self, ValidationError> {
        let prompt = req.prompt.ok_or(ValidationError::MissingPrompt)?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        if prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(ValidationError::TooLong {
                field: "Prompt",
                max: MAX_PROMPT_CHARS,
            });
        }

        let duration_secs = match req.duration {
            None => DEFAULT_DURATION_SECS,
            Some(value) => validate_duration(value)?,
        };

        let resolution = match req.quality.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_RESOLUTION.to_string(),
            Some(quality) => normalize_resolution(quality)?,
        };

        let negative_prompt = req.negative_prompt.unwrap_or_default().trim().to_string();
        if negative_prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(ValidationError::TooLong {
                field: "Negative prompt",
                max: MAX_PROMPT_CHARS,
            });
        }

        Ok(Self {
            prompt: prompt.to_string(),
            duration_secs,
            resolution,
            negative_prompt,
            expand_prompt: req.enable_prompt_expansion.unwrap_or(true),
        })
    }
}

fn validate_duration(value: i64) -> Result<u32, ValidationError> {
    let out_of_range = ValidationError::DurationOutOfRange {
        value,
        min: MIN_DURATION_SECS,
        max: MAX_DURATION_SECS,
    };
    let secs = u32::try_from(value).map_err(|_| out_of_range.clone())?;
    if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&secs) {
        return Err(out_of_range);
    }
    Ok(secs)
}

/// Accepts `W*H`, `WxH` or a named preset; always returns the `W*H` form
fn normalize_resolution(quality: &str) -> Result<String, ValidationError> {
    let lower = quality.trim().to_ascii_lowercase();
    if let Some((_, size)) = RESOLUTION_PRESETS.iter().find(|(name, _)| *name == lower) {
        return Ok(size.to_string());
    }

    let invalid = || ValidationError::InvalidResolution(quality.to_string());
    let (width, height) = lower
        .split_once('*')
        .or_else(|| lower.split_once('x'))
        .ok_or_else(invalid)?;

    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;

    let in_bounds = |side: u32| (MIN_SIDE_PX..=MAX_SIDE_PX).contains(&side);
    if !in_bounds(width) || !in_bounds(height) {
        return Err(invalid());
    }

    Ok(format!("{}*{}", width, height))
}
