//! Configuration errors
//!
//! Only construction can fail. Once an engine is ticking, malformed input is
//! clamped or ignored so the visualization keeps running.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("track length must be positive, got {0}")]
    NonPositiveTrack(f32),
    #[error("step period must be positive, got {0}")]
    NonPositiveStepPeriod(f32),
    #[error("epsilon must be positive, got {0}")]
    NonPositiveEpsilon(f32),
    #[error("{body} speed must be non-negative, got {speed}")]
    NegativeSpeed { body: &'static str, speed: f32 },
    #[error("speed bounds must satisfy 0 < min <= max, got [{min}, {max}]")]
    InvalidSpeedBounds { min: f32, max: f32 },
    #[error("initial speed {speed} outside bounds [{min}, {max}]")]
    InitialSpeedOutOfBounds { speed: f32, min: f32, max: f32 },
    #[error("history sample interval must be positive, got {0}")]
    NonPositiveSampleInterval(f32),
    #[error("particle decay rate must be positive, got {0}")]
    NonPositiveDecay(f32),
    #[error("particle shrink factor must lie in (0, 1], got {0}")]
    InvalidShrink(f32),
    #[error("particle emit shape has an invalid {0} range")]
    InvalidEmitShape(&'static str),
    #[error("instant resolution list must be non-empty and positive")]
    InvalidInstantResolutions,
    #[error("default instant index {index} out of range for {len} resolutions")]
    InstantIndexOutOfRange { index: usize, len: usize },
    #[error("jitter deviation must be finite and non-negative, got {0}")]
    InvalidJitter(f32),
    #[error("pursuit preset {0} is invalid")]
    InvalidPreset(usize),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
