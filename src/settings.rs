//! Presentation preferences
//!
//! Kept apart from scenario configuration: none of these change physics,
//! only how much effect work the engine does and what the overlays start as.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::mode::OverlaySet;
use crate::sim::scenario::{EngineConfig, ScenarioConfig};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 500,
            QualityPreset::High => 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Effects quality preset
    pub quality: QualityPreset,
    /// Particle effects (bursts, sparkles, trailing dust)
    pub particles: bool,
    /// Overlays switched on at start
    pub overlays: OverlaySet,
    /// Reduced motion (no ghost jitter)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            overlays: OverlaySet::default(),
            reduced_motion: false,
        }
    }
}

impl Settings {
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Tighten the engine's particle cap to what these settings allow.
    /// A scenario cap lower than the preset's is kept.
    pub fn apply_to(&self, config: &mut EngineConfig) {
        let cap = self.max_particles();
        config.particles.cap = Some(config.particles.cap.map_or(cap, |c| c.min(cap)));
        if self.reduced_motion {
            if let ScenarioConfig::Arrow(arrow) = &mut config.scenario {
                arrow.ghost_sigma = 0.0;
            }
        }
        log::debug!(
            "Settings applied: quality {}, particle cap {:?}",
            self.quality.as_str(),
            config.particles.cap
        );
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file, falling back to defaults when it is missing
    /// or unreadable
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path)
            .map_err(ConfigError::from)
            .and_then(|json| Self::from_json(&json))
        {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::info!("Using default settings ({})", e);
                Self::default()
            }
        }
    }
}
