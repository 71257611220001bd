//! Simulation clock
//!
//! Turns a raw frame delta into a scaled simulation delta, honoring pause
//! and a self-expiring hard freeze.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SPEED, MIN_SPEED};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    pub min_speed: f32,
    pub max_speed: f32,
    /// Multiplier change per increase/decrease command
    pub speed_step: f32,
    pub initial_speed: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            min_speed: MIN_SPEED,
            max_speed: MAX_SPEED,
            speed_step: 0.5,
            initial_speed: 1.0,
        }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_speed > 0.0 && self.min_speed <= self.max_speed) {
            return Err(ConfigError::InvalidSpeedBounds {
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if !(self.min_speed..=self.max_speed).contains(&self.initial_speed) {
            return Err(ConfigError::InitialSpeedOutOfBounds {
                speed: self.initial_speed,
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineClock {
    /// Accumulated simulation time
    pub sim_time: f32,
    pub speed_multiplier: f32,
    pub running: bool,
    /// Wall-clock seconds of freeze left (`None` when not frozen)
    pub freeze_remaining: Option<f32>,
    #[serde(skip)]
    config: ClockConfig,
}

impl EngineClock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            sim_time: 0.0,
            speed_multiplier: config.initial_speed,
            running: false,
            freeze_remaining: None,
            config,
        }
    }

    pub fn frozen(&self) -> bool {
        self.freeze_remaining.is_some()
    }

    /// Produce this tick's simulation delta, `raw_dt * speed_multiplier`.
    /// Negative or non-finite deltas count as zero; capping long hitches is
    /// left to the frame loop.
    pub fn tick(&mut self, raw_dt: f32) -> f32 {
        let raw_dt = if raw_dt.is_finite() { raw_dt.max(0.0) } else { 0.0 };

        if let Some(left) = self.freeze_remaining {
            let left = left - raw_dt;
            if left > 0.0 {
                self.freeze_remaining = Some(left);
                return 0.0;
            }
            log::info!("Freeze lapsed");
            self.freeze_remaining = None;
            return 0.0;
        }

        if !self.running {
            return 0.0;
        }
        let dt = raw_dt * self.speed_multiplier;
        self.sim_time += dt;
        dt
    }

    /// Clamp into the configured bounds; returns the applied value
    pub fn set_speed(&mut self, speed: f32) -> f32 {
        self.speed_multiplier = if speed.is_nan() {
            self.config.min_speed
        } else {
            speed.clamp(self.config.min_speed, self.config.max_speed)
        };
        self.speed_multiplier
    }

    pub fn increase_speed(&mut self) -> f32 {
        self.set_speed(self.speed_multiplier + self.config.speed_step)
    }

    pub fn decrease_speed(&mut self) -> f32 {
        self.set_speed(self.speed_multiplier - self.config.speed_step)
    }

    pub fn toggle_running(&mut self) -> bool {
        self.running = !self.running;
        self.running
    }

    /// Hard-freeze for `duration` seconds of wall-clock time
    pub fn freeze(&mut self, duration: f32) {
        if duration > 0.0 {
            self.freeze_remaining = Some(duration);
        }
    }

    pub fn unfreeze(&mut self) {
        self.freeze_remaining = None;
    }

    /// Back to time zero, stopped; speed is kept
    pub fn reset(&mut self) {
        self.sim_time = 0.0;
        self.running = false;
        self.freeze_remaining = None;
    }
}
