//! Zeno's paradoxes - a real-time simulation and effects engine
//!
//! Core modules:
//! - `sim`: Tick-driven simulation (motion, Zeno stepping, particles, history, modes, clock)
//! - `analysis`: Closed-form math and the console tables for each paradox
//! - `settings`: Presentation preferences (quality preset, overlays)
//! - `error`: Configuration errors raised before the first tick

pub mod analysis;
pub mod error;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::{QualityPreset, Settings};

/// Default tuning constants shared by the scenarios
pub mod consts {
    /// Nominal frame rate the per-frame probabilities were tuned for
    pub const REFERENCE_FPS: f32 = 60.0;
    /// Frame delta used by the headless runner
    pub const FRAME_DT: f32 = 1.0 / REFERENCE_FPS;
    /// Longest frame delta the runner hands the engine (longer hitches are cut)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Simulation speed multiplier bounds
    pub const MIN_SPEED: f32 = 0.1;
    pub const MAX_SPEED: f32 = 5.0;

    /// Minimum spacing between two history samples (seconds)
    pub const HISTORY_INTERVAL: f32 = 0.1;

    /// Initial particle life (seconds at decay rate 1.0)
    pub const PARTICLE_LIFE: f32 = 1.0;
    /// Default scenario-level particle cap
    pub const PARTICLE_CAP: usize = 50;

    /// Trail length (positions kept for the motion trail)
    pub const TRAIL_LENGTH: usize = 20;

    /// Duration of a hard freeze in the arrow scenario (seconds)
    pub const FREEZE_DURATION: f32 = 2.0;
}

/// Convert a per-frame probability (tuned at `fps`) into a per-second event rate
#[inline]
pub fn per_frame_to_rate(probability: f32, fps: f32) -> f32 {
    let p = probability.clamp(0.0, 0.999_999);
    -(1.0 - p).ln() * fps
}

/// Probability that at least one event of a Poisson process with `rate` occurs in `dt`
#[inline]
pub fn rate_to_probability(rate: f32, dt: f32) -> f32 {
    if rate <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    1.0 - (-rate * dt).exp()
}

/// Push onto a bounded trail, dropping the oldest entry when full
#[inline]
pub fn push_bounded(trail: &mut Vec<f32>, value: f32, max_len: usize) {
    trail.push(value);
    if trail.len() > max_len {
        let excess = trail.len() - max_len;
        trail.drain(..excess);
    }
}
