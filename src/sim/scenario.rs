//! Scenario configuration and per-scenario state
//!
//! Three paradoxes share one engine:
//! - Pursuit: Achilles chases the tortoise (continuous motion, catch condition)
//! - Dichotomy: a stone covers half the remaining distance each step
//! - Arrow: an arrow flies to a target, analysed instant by instant

use std::path::Path;

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::ClockConfig;
use super::mode::SimulationMode;
use super::motion::{self, Body, StopCondition};
use super::particles::{Color, ColorPolicy, EmissionPolicy, EmitShape, ParticleConfig, ParticlePool};
use super::stepper::{StepEvent, SteppedTarget};
use crate::consts::*;
use crate::error::ConfigError;
use crate::push_bounded;

/// Which paradox is being simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Pursuit,
    Dichotomy,
    Arrow,
}

impl ScenarioKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKind::Pursuit => "pursuit",
            ScenarioKind::Dichotomy => "dichotomy",
            ScenarioKind::Arrow => "arrow",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pursuit" | "achilles" => Some(ScenarioKind::Pursuit),
            "dichotomy" => Some(ScenarioKind::Dichotomy),
            "arrow" => Some(ScenarioKind::Arrow),
            _ => None,
        }
    }

    /// Mode cycle offered by this scenario
    pub fn modes(&self) -> &'static [SimulationMode] {
        match self {
            ScenarioKind::Pursuit => PURSUIT_MODES,
            ScenarioKind::Dichotomy => DICHOTOMY_MODES,
            ScenarioKind::Arrow => ARROW_MODES,
        }
    }
}

pub const PURSUIT_MODES: &[SimulationMode] = &[
    SimulationMode::Continuous,
    SimulationMode::DiscreteSteps,
    SimulationMode::Mathematical,
];

pub const DICHOTOMY_MODES: &[SimulationMode] = &[
    SimulationMode::Continuous,
    SimulationMode::DiscreteSteps,
    SimulationMode::Mathematical,
    SimulationMode::Energy,
];

pub const ARROW_MODES: &[SimulationMode] = &[
    SimulationMode::Continuous,
    SimulationMode::DiscreteSteps,
    SimulationMode::DerivativeView,
    SimulationMode::ProbabilisticView,
];

/// Named pursuer/target speed pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedPreset {
    pub name: String,
    pub pursuer_speed: f32,
    pub target_speed: f32,
}

impl SpeedPreset {
    fn new(name: &str, pursuer_speed: f32, target_speed: f32) -> Self {
        Self {
            name: name.to_string(),
            pursuer_speed,
            target_speed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PursuitConfig {
    pub pursuer_start: f32,
    pub pursuer_speed: f32,
    pub target_start: f32,
    pub target_speed: f32,
    /// Drawn track length
    pub track_length: f32,
    /// Gap below which the proximity sparkle may fire
    pub proximity: f32,
    /// Chance per reference frame of a proximity sparkle
    pub proximity_chance: f32,
    /// Seconds per analysis stage in the discrete-steps view
    pub analysis_period: f32,
    #[serde(default)]
    pub presets: Vec<SpeedPreset>,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            pursuer_start: 0.0,
            pursuer_speed: 100.0,
            target_start: 300.0,
            target_speed: 10.0,
            track_length: 1300.0,
            proximity: 50.0,
            proximity_chance: 0.1,
            analysis_period: 1.0,
            presets: vec![
                SpeedPreset::new("classic", 100.0, 10.0),
                SpeedPreset::new("tight race", 50.0, 45.0),
                SpeedPreset::new("very fast", 200.0, 5.0),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DichotomyConfig {
    pub origin: f32,
    pub destination: f32,
    /// Seconds between automatic steps
    pub step_period: f32,
    /// Remaining distance treated as arrival
    pub epsilon: f32,
    /// Bursts fired when the stone arrives
    pub completion_bursts: usize,
}

impl Default for DichotomyConfig {
    fn default() -> Self {
        Self {
            origin: 100.0,
            destination: 900.0,
            step_period: 2.0,
            epsilon: 1.0,
            completion_bursts: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowConfig {
    pub start: f32,
    pub speed: f32,
    pub target: f32,
    /// Chance per reference frame of a trailing particle
    pub emit_chance: f32,
    /// Selectable instant widths, coarse to fine
    pub instant_resolutions: Vec<f32>,
    pub default_instant: usize,
    /// Ghost positions sampled in the probabilistic view
    pub ghost_count: usize,
    /// Standard deviation of the ghost jitter
    pub ghost_sigma: f32,
}

impl Default for ArrowConfig {
    fn default() -> Self {
        Self {
            start: 0.0,
            speed: 120.0,
            target: 800.0,
            emit_chance: 0.3,
            instant_resolutions: vec![1.0, 0.5, 0.1, 0.05, 0.01, 0.001],
            default_instant: 2,
            ghost_count: 5,
            ghost_sigma: 20.0,
        }
    }
}

/// Scenario-specific constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioConfig {
    Pursuit(PursuitConfig),
    Dichotomy(DichotomyConfig),
    Arrow(ArrowConfig),
}

impl ScenarioConfig {
    pub fn kind(&self) -> ScenarioKind {
        match self {
            ScenarioConfig::Pursuit(_) => ScenarioKind::Pursuit,
            ScenarioConfig::Dichotomy(_) => ScenarioKind::Dichotomy,
            ScenarioConfig::Arrow(_) => ScenarioKind::Arrow,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ScenarioConfig::Pursuit(c) => {
                if !(c.track_length > 0.0) {
                    return Err(ConfigError::NonPositiveTrack(c.track_length));
                }
                non_negative("pursuer", c.pursuer_speed)?;
                non_negative("target", c.target_speed)?;
                if !(c.analysis_period > 0.0) {
                    return Err(ConfigError::NonPositiveStepPeriod(c.analysis_period));
                }
                for (i, preset) in c.presets.iter().enumerate() {
                    if !(preset.pursuer_speed >= 0.0 && preset.target_speed >= 0.0) {
                        return Err(ConfigError::InvalidPreset(i));
                    }
                }
            }
            ScenarioConfig::Dichotomy(c) => {
                let distance = (c.destination - c.origin).abs();
                if !(distance > 0.0) {
                    return Err(ConfigError::NonPositiveTrack(distance));
                }
                if !(c.step_period > 0.0) {
                    return Err(ConfigError::NonPositiveStepPeriod(c.step_period));
                }
                if !(c.epsilon > 0.0) {
                    return Err(ConfigError::NonPositiveEpsilon(c.epsilon));
                }
            }
            ScenarioConfig::Arrow(c) => {
                let distance = c.target - c.start;
                if !(distance > 0.0) {
                    return Err(ConfigError::NonPositiveTrack(distance));
                }
                non_negative("arrow", c.speed)?;
                if c.instant_resolutions.is_empty()
                    || c.instant_resolutions.iter().any(|dt| !(*dt > 0.0))
                {
                    return Err(ConfigError::InvalidInstantResolutions);
                }
                if c.default_instant >= c.instant_resolutions.len() {
                    return Err(ConfigError::InstantIndexOutOfRange {
                        index: c.default_instant,
                        len: c.instant_resolutions.len(),
                    });
                }
                if !(c.ghost_sigma.is_finite() && c.ghost_sigma >= 0.0) {
                    return Err(ConfigError::InvalidJitter(c.ghost_sigma));
                }
            }
        }
        Ok(())
    }
}

fn non_negative(body: &'static str, speed: f32) -> Result<(), ConfigError> {
    if speed >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeSpeed { body, speed })
    }
}

/// Everything an engine needs, supplied once at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// RNG seed for effects and jitter
    #[serde(default)]
    pub seed: u64,
    pub clock: ClockConfig,
    pub history_interval: f32,
    /// Wall-clock length of a hard freeze
    pub freeze_duration: f32,
    pub particles: ParticleConfig,
    pub scenario: ScenarioConfig,
}

impl EngineConfig {
    /// Achilles and the tortoise
    pub fn pursuit() -> Self {
        Self {
            seed: 0,
            clock: ClockConfig::default(),
            history_interval: HISTORY_INTERVAL,
            freeze_duration: FREEZE_DURATION,
            particles: ParticleConfig {
                decay_rate: 2.0,
                shrink: 0.97,
                gravity: 0.0,
                cap: None,
                burst: 5,
                shape: EmitShape::radial(10.0, 50.0, 3.0),
            },
            scenario: ScenarioConfig::Pursuit(PursuitConfig::default()),
        }
    }

    /// The stone thrown at the tree
    pub fn dichotomy() -> Self {
        Self {
            seed: 0,
            clock: ClockConfig {
                max_speed: 3.0,
                speed_step: 0.2,
                ..ClockConfig::default()
            },
            history_interval: HISTORY_INTERVAL,
            freeze_duration: FREEZE_DURATION,
            particles: ParticleConfig {
                decay_rate: 1.5,
                shrink: 0.98,
                gravity: 100.0,
                cap: None,
                burst: 8,
                shape: EmitShape {
                    jitter: Vec2::splat(8.0),
                    vel_min: Vec2::splat(-30.0),
                    vel_max: Vec2::splat(30.0),
                    size_min: 2.0,
                    size_max: 5.0,
                },
            },
            scenario: ScenarioConfig::Dichotomy(DichotomyConfig::default()),
        }
    }

    /// The arrow in flight
    pub fn arrow() -> Self {
        Self {
            seed: 0,
            clock: ClockConfig {
                max_speed: 3.0,
                speed_step: 0.2,
                ..ClockConfig::default()
            },
            history_interval: 0.05,
            freeze_duration: FREEZE_DURATION,
            particles: ParticleConfig {
                decay_rate: 2.0,
                shrink: 0.99,
                gravity: 0.0,
                cap: Some(PARTICLE_CAP),
                burst: 1,
                shape: EmitShape {
                    jitter: Vec2::new(5.0, 3.0),
                    vel_min: Vec2::new(-20.0, -10.0),
                    vel_max: Vec2::new(-10.0, 10.0),
                    size_min: 1.0,
                    size_max: 3.0,
                },
            },
            scenario: ScenarioConfig::Arrow(ArrowConfig::default()),
        }
    }

    pub fn for_kind(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Pursuit => Self::pursuit(),
            ScenarioKind::Dichotomy => Self::dichotomy(),
            ScenarioKind::Arrow => Self::arrow(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clock.validate()?;
        if !(self.history_interval > 0.0) {
            return Err(ConfigError::NonPositiveSampleInterval(self.history_interval));
        }
        self.particles.validate()?;
        self.scenario.validate()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Particle pool and RNG lent to a scenario for one tick
pub struct Effects<'a> {
    pub pool: &'a mut ParticlePool,
    pub rng: &'a mut Pcg32,
}

impl Effects<'_> {
    fn burst_at(&mut self, position: f32, colors: &ColorPolicy) {
        self.pool.burst(Vec2::new(position, 0.0), colors, self.rng);
    }
}

pub const PURSUER: usize = 0;
pub const TARGET: usize = 1;
const CATCH: StopCondition = StopCondition::Catch {
    pursuer: PURSUER,
    target: TARGET,
};

#[derive(Debug, Clone)]
pub struct PursuitState {
    /// `[pursuer, target]`
    pub bodies: [Body; 2],
    /// Time actually raced (stops at the catch)
    pub elapsed: f32,
    /// Zeno catch-up stage shown in the discrete-steps view
    pub analysis_step: u32,
    analysis_timer: f32,
    proximity: EmissionPolicy,
}

impl PursuitState {
    fn new(c: &PursuitConfig) -> Self {
        Self {
            bodies: [
                Body::labeled(c.pursuer_start, c.pursuer_speed, "Achilles"),
                Body::labeled(c.target_start, c.target_speed, "Tortoise"),
            ],
            elapsed: 0.0,
            analysis_step: 0,
            analysis_timer: 0.0,
            proximity: EmissionPolicy::per_frame(c.proximity_chance, REFERENCE_FPS),
        }
    }

    pub fn gap(&self) -> f32 {
        self.bodies[TARGET].position - self.bodies[PURSUER].position
    }

    pub fn caught(&self) -> bool {
        CATCH.is_met(&self.bodies)
    }

    fn advance(&mut self, dt: f32, mode: SimulationMode, c: &PursuitConfig, fx: &mut Effects) {
        let was_racing = !self.caught();
        let adv = motion::advance(&mut self.bodies, dt, CATCH);
        self.elapsed += adv.consumed;

        if was_racing && !adv.stopped && self.gap().abs() < c.proximity && self.proximity.fires(dt, fx.rng) {
            fx.burst_at(self.bodies[PURSUER].position, &ColorPolicy::Fixed(Color::RED));
            fx.burst_at(self.bodies[TARGET].position, &ColorPolicy::Fixed(Color::GREEN));
        }

        if mode == SimulationMode::DiscreteSteps {
            self.analysis_timer += dt;
            if self.analysis_timer > c.analysis_period {
                self.analysis_step += 1;
                self.analysis_timer = 0.0;
            }
        }
    }

    /// Swap in a preset's speeds mid-run; unknown index is ignored
    fn apply_preset(&mut self, c: &PursuitConfig, index: usize) -> bool {
        match c.presets.get(index) {
            Some(preset) => {
                self.bodies[PURSUER].speed = preset.pursuer_speed.max(0.0);
                self.bodies[TARGET].speed = preset.target_speed.max(0.0);
                log::info!("Preset '{}' applied", preset.name);
                true
            }
            None => {
                log::warn!("No pursuit preset {}", index);
                false
            }
        }
    }
}

fn stone_palette() -> ColorPolicy {
    ColorPolicy::Palette(vec![Color::GREY, Color::LIGHT_GREY, Color::BLACK])
}

#[derive(Debug, Clone)]
pub struct DichotomyState {
    pub stepper: SteppedTarget,
    /// Positions of the most recent steps
    pub trail: Vec<f32>,
}

impl DichotomyState {
    fn new(c: &DichotomyConfig) -> Self {
        Self {
            stepper: SteppedTarget::new(c.origin, c.destination, c.step_period, c.epsilon),
            trail: Vec::with_capacity(TRAIL_LENGTH),
        }
    }

    fn on_step(&mut self, event: &StepEvent, fx: &mut Effects) {
        push_bounded(&mut self.trail, event.position, TRAIL_LENGTH);
        fx.burst_at(event.position, &stone_palette());
    }

    fn advance(&mut self, dt: f32, fx: &mut Effects) -> Option<StepEvent> {
        let event = self.stepper.advance(dt)?;
        self.on_step(&event, fx);
        Some(event)
    }

    fn manual_step(&mut self, fx: &mut Effects) -> Option<StepEvent> {
        let event = self.stepper.step_once()?;
        self.on_step(&event, fx);
        Some(event)
    }
}

#[derive(Debug, Clone)]
pub struct ArrowState {
    /// Single-element slice for the motion model
    pub bodies: [Body; 1],
    pub target: f32,
    pub elapsed: f32,
    /// Recently sampled positions
    pub trail: Vec<f32>,
    pub instant_index: usize,
    emission: EmissionPolicy,
}

impl ArrowState {
    fn new(c: &ArrowConfig) -> Self {
        Self {
            bodies: [Body::labeled(c.start, c.speed, "Arrow")],
            target: c.target,
            elapsed: 0.0,
            trail: Vec::with_capacity(TRAIL_LENGTH),
            instant_index: c.default_instant,
            emission: EmissionPolicy::per_frame(c.emit_chance, REFERENCE_FPS),
        }
    }

    fn stop(&self) -> StopCondition {
        StopCondition::TrackEnd {
            body: 0,
            end: self.target,
        }
    }

    pub fn arrived(&self) -> bool {
        self.stop().is_met(&self.bodies)
    }

    fn advance(&mut self, dt: f32, fx: &mut Effects) {
        if self.arrived() {
            return;
        }
        let stop = self.stop();
        let adv = motion::advance(&mut self.bodies, dt, stop);
        self.elapsed += adv.consumed;
        if self.emission.fires(dt, fx.rng) {
            fx.burst_at(self.bodies[0].position, &ColorPolicy::Fixed(Color::ORANGE));
        }
    }
}

/// Live state of whichever scenario is running
#[derive(Debug, Clone)]
pub enum ScenarioState {
    Pursuit(PursuitState),
    Dichotomy(DichotomyState),
    Arrow(ArrowState),
}

/// What a scenario produced during one tick
#[derive(Debug, Default)]
pub struct ScenarioTick {
    pub step: Option<StepEvent>,
}

impl ScenarioState {
    /// Fresh state from configuration
    pub fn build(config: &ScenarioConfig) -> Self {
        match config {
            ScenarioConfig::Pursuit(c) => ScenarioState::Pursuit(PursuitState::new(c)),
            ScenarioConfig::Dichotomy(c) => ScenarioState::Dichotomy(DichotomyState::new(c)),
            ScenarioConfig::Arrow(c) => ScenarioState::Arrow(ArrowState::new(c)),
        }
    }

    pub fn kind(&self) -> ScenarioKind {
        match self {
            ScenarioState::Pursuit(_) => ScenarioKind::Pursuit,
            ScenarioState::Dichotomy(_) => ScenarioKind::Dichotomy,
            ScenarioState::Arrow(_) => ScenarioKind::Arrow,
        }
    }

    /// Simulation started: arm the stepper
    pub fn start(&mut self) {
        if let ScenarioState::Dichotomy(d) = self {
            d.stepper.start();
        }
    }

    /// Advance physics by a positive `dt`
    pub fn advance(
        &mut self,
        dt: f32,
        mode: SimulationMode,
        config: &ScenarioConfig,
        fx: &mut Effects,
    ) -> ScenarioTick {
        match (self, config) {
            (ScenarioState::Pursuit(s), ScenarioConfig::Pursuit(c)) => {
                s.advance(dt, mode, c, fx);
                ScenarioTick::default()
            }
            (ScenarioState::Dichotomy(s), _) => ScenarioTick {
                step: s.advance(dt, fx),
            },
            (ScenarioState::Arrow(s), _) => {
                s.advance(dt, fx);
                ScenarioTick::default()
            }
            _ => ScenarioTick::default(),
        }
    }

    pub fn manual_step(&mut self, fx: &mut Effects) -> Option<StepEvent> {
        match self {
            ScenarioState::Dichotomy(d) => d.manual_step(fx),
            _ => {
                log::debug!("Manual step has no meaning in {}", self.kind().as_str());
                None
            }
        }
    }

    pub fn apply_preset(&mut self, config: &ScenarioConfig, index: usize) -> bool {
        match (self, config) {
            (ScenarioState::Pursuit(s), ScenarioConfig::Pursuit(c)) => s.apply_preset(c, index),
            _ => false,
        }
    }

    /// Terminal condition of the scenario
    pub fn is_complete(&self) -> bool {
        match self {
            ScenarioState::Pursuit(s) => s.caught(),
            ScenarioState::Dichotomy(d) => d.stepper.finished(),
            ScenarioState::Arrow(a) => a.arrived(),
        }
    }

    /// Time axis used for history and completion reporting
    pub fn elapsed(&self, sim_time: f32) -> f32 {
        match self {
            ScenarioState::Pursuit(s) => s.elapsed,
            ScenarioState::Dichotomy(_) => sim_time,
            ScenarioState::Arrow(a) => a.elapsed,
        }
    }

    /// Values plotted over time
    pub fn history_values(&self) -> [f32; 2] {
        match self {
            ScenarioState::Pursuit(s) => [s.bodies[PURSUER].position, s.bodies[TARGET].position],
            ScenarioState::Dichotomy(d) => [d.stepper.current, d.stepper.remaining()],
            ScenarioState::Arrow(a) => [a.bodies[0].position, a.bodies[0].speed],
        }
    }

    /// Where the completion burst goes off
    pub fn completion_point(&self) -> f32 {
        match self {
            ScenarioState::Pursuit(s) => s.bodies[PURSUER].position,
            ScenarioState::Dichotomy(d) => d.stepper.destination,
            ScenarioState::Arrow(a) => a.target,
        }
    }

    /// Fire the terminal particle burst
    pub fn completion_burst(&self, config: &ScenarioConfig, fx: &mut Effects) {
        let at = self.completion_point();
        match (self, config) {
            (ScenarioState::Pursuit(_), _) => {
                fx.burst_at(at, &ColorPolicy::Fixed(Color::RED));
                fx.burst_at(at, &ColorPolicy::Fixed(Color::GREEN));
            }
            (ScenarioState::Dichotomy(_), ScenarioConfig::Dichotomy(c)) => {
                let colors = stone_palette();
                for _ in 0..c.completion_bursts {
                    fx.burst_at(at, &colors);
                }
            }
            _ => fx.burst_at(at, &ColorPolicy::Fixed(Color::RED)),
        }
    }

    pub fn bodies(&self) -> &[Body] {
        match self {
            ScenarioState::Pursuit(s) => &s.bodies[..],
            ScenarioState::Dichotomy(_) => &[],
            ScenarioState::Arrow(a) => &a.bodies[..],
        }
    }

    pub fn stepper(&self) -> Option<&SteppedTarget> {
        match self {
            ScenarioState::Dichotomy(d) => Some(&d.stepper),
            _ => None,
        }
    }

    pub fn trail(&self) -> &[f32] {
        match self {
            ScenarioState::Pursuit(_) => &[],
            ScenarioState::Dichotomy(d) => &d.trail[..],
            ScenarioState::Arrow(a) => &a.trail[..],
        }
    }
}
