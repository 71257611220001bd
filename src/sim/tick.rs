//! Engine loop
//!
//! One call to [`Engine::tick`] is one frame. Within a tick the order is
//! fixed: commands, clock, physics, particles, history, completion. Later
//! stages always observe the physics state produced earlier in the same tick.

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::clock::EngineClock;
use super::history::{HistoryBuffer, HistorySample};
use super::mode::{ModeController, Overlay, OverlaySet, SimulationMode};
use super::motion::Body;
use super::particles::{Particle, ParticlePool};
use super::scenario::{Effects, EngineConfig, ScenarioConfig, ScenarioKind, ScenarioState};
use super::stepper::{StepEvent, StepTrigger, SteppedTarget};
use crate::error::ConfigError;

/// Mixed into the seed so ghost jitter draws from its own stream
const GHOST_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Already-decoded input command
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Command {
    TogglePause,
    Reset,
    IncreaseSpeed,
    DecreaseSpeed,
    SetSpeed(f32),
    CycleMode,
    SetMode(SimulationMode),
    /// Take one Zeno step (manual stepping only)
    ManualStep,
    /// Switch between timer-driven and manual stepping
    ToggleAutoStep,
    ToggleOverlay(Overlay),
    /// Pursuit speed preset by index
    ApplyPreset(usize),
    /// Finer instant width in the arrow analysis
    RefineInstant,
    /// Coarser instant width in the arrow analysis
    CoarsenInstant,
    /// Toggle a hard freeze
    Freeze,
    Quit,
}

/// Commands for a single tick, applied in order before the clock runs
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub commands: Vec<Command>,
}

impl TickInput {
    pub fn new(commands: impl IntoIterator<Item = Command>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
        }
    }
}

/// Notable things that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EngineEvent {
    Reset,
    Started,
    ModeChanged(SimulationMode),
    Step(StepEvent),
    /// Raised once per run, on the tick the terminal condition first holds
    Completed { time: f32, position: f32 },
}

/// Result of one tick
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// Simulation delta applied this tick
    pub dt: f32,
    pub events: Vec<EngineEvent>,
    pub quit: bool,
}

/// Instant-by-instant reading of the arrow's flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InstantView {
    /// Width of one instant (seconds)
    pub width: f32,
    /// Index of the instant containing the current time
    pub index: u64,
    /// Position of the selected width in the resolution list
    pub resolution: usize,
}

/// Read-only view of the engine handed to the presentation layer
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub scenario: ScenarioKind,
    pub tick: u64,
    pub clock: &'a EngineClock,
    pub mode: SimulationMode,
    pub overlays: OverlaySet,
    pub bodies: &'a [Body],
    pub stepper: Option<&'a SteppedTarget>,
    pub particles: &'a [Particle],
    pub history: &'a [HistorySample<[f32; 2]>],
    pub trail: &'a [f32],
    /// Display-only jittered positions (probabilistic view)
    pub ghosts: &'a [f32],
    pub instant: Option<InstantView>,
    /// Zeno catch-up stage (pursuit only)
    pub analysis_step: Option<u32>,
    /// Scenario time axis
    pub elapsed: f32,
    pub completed: bool,
}

/// External collaborator that draws a frame
pub trait Presenter {
    fn present(&mut self, snapshot: &Snapshot<'_>, events: &[EngineEvent]);
}

/// Owns every component and runs them in tick order
pub struct Engine {
    config: EngineConfig,
    clock: EngineClock,
    modes: ModeController,
    overlays: OverlaySet,
    pool: ParticlePool,
    history: HistoryBuffer<[f32; 2]>,
    scenario: ScenarioState,
    /// Effects stream (particle emission)
    rng: Pcg32,
    /// Ghost stream, so the active view never shifts particle draws
    ghost_rng: Pcg32,
    jitter: Normal<f32>,
    ghosts: Vec<f32>,
    completed: bool,
    tick_count: u64,
}

impl Engine {
    /// Validate `config` and build a stopped engine
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sigma = match &config.scenario {
            ScenarioConfig::Arrow(c) => c.ghost_sigma,
            _ => 0.0,
        };
        let jitter = Normal::new(0.0, sigma).map_err(|_| ConfigError::InvalidJitter(sigma))?;
        let kind = config.scenario.kind();
        log::info!("Engine ready: {} (seed {})", kind.as_str(), config.seed);

        Ok(Self {
            clock: EngineClock::new(config.clock),
            modes: ModeController::new(kind.modes()),
            overlays: OverlaySet::default(),
            pool: ParticlePool::new(config.particles.clone()),
            history: HistoryBuffer::new(config.history_interval),
            scenario: ScenarioState::build(&config.scenario),
            rng: Pcg32::seed_from_u64(config.seed),
            ghost_rng: Pcg32::seed_from_u64(config.seed ^ GHOST_SEED_SALT),
            jitter,
            ghosts: Vec::new(),
            completed: false,
            tick_count: 0,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &EngineClock {
        &self.clock
    }

    pub fn mode(&self) -> SimulationMode {
        self.modes.current()
    }

    pub fn overlays(&self) -> OverlaySet {
        self.overlays
    }

    /// Replace the overlay flags wholesale (initial preferences)
    pub fn set_overlays(&mut self, overlays: OverlaySet) {
        self.overlays = overlays;
    }

    pub fn scenario(&self) -> &ScenarioState {
        &self.scenario
    }

    pub fn particles(&self) -> &[Particle] {
        self.pool.particles()
    }

    pub fn history(&self) -> &[HistorySample<[f32; 2]>] {
        self.history.samples()
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Advance one frame of `raw_dt` wall-clock seconds
    pub fn tick(&mut self, input: &TickInput, raw_dt: f32) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        self.tick_count += 1;

        // 1. Commands land before anything moves
        for command in &input.commands {
            if *command == Command::Quit {
                log::info!("Quit requested");
                outcome.quit = true;
                return outcome;
            }
            self.apply(*command, &mut outcome.events);
        }

        // 2. Clock
        let dt = self.clock.tick(raw_dt);
        outcome.dt = dt;

        // 3. Physics
        if dt > 0.0 {
            self.scenario.start();
            let mut fx = Effects {
                pool: &mut self.pool,
                rng: &mut self.rng,
            };
            let produced = self
                .scenario
                .advance(dt, self.modes.current(), &self.config.scenario, &mut fx);
            if let Some(step) = produced.step {
                outcome.events.push(EngineEvent::Step(step));
            }
        }

        // 4. Effects
        self.pool.update(dt);

        // 5. History
        if dt > 0.0 {
            let time = self.scenario.elapsed(self.clock.sim_time);
            let values = self.scenario.history_values();
            if self.history.record(time, values) {
                if let ScenarioState::Arrow(arrow) = &mut self.scenario {
                    crate::push_bounded(&mut arrow.trail, values[0], crate::consts::TRAIL_LENGTH);
                }
            }
        }

        // 6. One-shot completion
        if !self.completed && self.scenario.is_complete() {
            self.completed = true;
            let time = self.scenario.elapsed(self.clock.sim_time);
            let position = self.scenario.completion_point();
            log::info!(
                "{} complete at t={:.3}s, position {:.2}",
                self.scenario.kind().as_str(),
                time,
                position
            );
            let mut fx = Effects {
                pool: &mut self.pool,
                rng: &mut self.rng,
            };
            self.scenario.completion_burst(&self.config.scenario, &mut fx);
            outcome.events.push(EngineEvent::Completed { time, position });
        }

        self.sample_ghosts();
        outcome
    }

    /// Tick, then hand the resulting state to `presenter`
    pub fn frame(&mut self, input: &TickInput, raw_dt: f32, presenter: &mut dyn Presenter) -> TickOutcome {
        let outcome = self.tick(input, raw_dt);
        if !outcome.quit {
            presenter.present(&self.snapshot(), &outcome.events);
        }
        outcome
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let (instant, analysis_step) = match &self.scenario {
            ScenarioState::Arrow(arrow) => (self.instant_view(arrow.instant_index, arrow.elapsed), None),
            ScenarioState::Pursuit(pursuit) => (None, Some(pursuit.analysis_step)),
            ScenarioState::Dichotomy(_) => (None, None),
        };

        Snapshot {
            scenario: self.scenario.kind(),
            tick: self.tick_count,
            clock: &self.clock,
            mode: self.modes.current(),
            overlays: self.overlays,
            bodies: self.scenario.bodies(),
            stepper: self.scenario.stepper(),
            particles: self.pool.particles(),
            history: self.history.samples(),
            trail: self.scenario.trail(),
            ghosts: &self.ghosts,
            instant,
            analysis_step,
            elapsed: self.scenario.elapsed(self.clock.sim_time),
            completed: self.completed,
        }
    }

    fn instant_view(&self, resolution: usize, elapsed: f32) -> Option<InstantView> {
        let ScenarioConfig::Arrow(c) = &self.config.scenario else {
            return None;
        };
        let width = *c.instant_resolutions.get(resolution)?;
        Some(InstantView {
            width,
            index: (elapsed / width).floor() as u64,
            resolution,
        })
    }

    fn apply(&mut self, command: Command, events: &mut Vec<EngineEvent>) {
        match command {
            Command::TogglePause => {
                if self.clock.toggle_running() {
                    events.push(EngineEvent::Started);
                }
            }
            Command::Reset => {
                self.reset();
                events.push(EngineEvent::Reset);
            }
            Command::IncreaseSpeed => {
                self.clock.increase_speed();
            }
            Command::DecreaseSpeed => {
                self.clock.decrease_speed();
            }
            Command::SetSpeed(speed) => {
                self.clock.set_speed(speed);
            }
            Command::CycleMode => {
                events.push(EngineEvent::ModeChanged(self.modes.cycle()));
            }
            Command::SetMode(mode) => {
                if self.modes.set(mode) {
                    events.push(EngineEvent::ModeChanged(mode));
                }
            }
            Command::ManualStep => {
                let mut fx = Effects {
                    pool: &mut self.pool,
                    rng: &mut self.rng,
                };
                if let Some(step) = self.scenario.manual_step(&mut fx) {
                    events.push(EngineEvent::Step(step));
                }
            }
            Command::ToggleAutoStep => {
                if let ScenarioState::Dichotomy(d) = &mut self.scenario {
                    let next = match d.stepper.trigger {
                        StepTrigger::Automatic => StepTrigger::Manual,
                        StepTrigger::Manual => StepTrigger::Automatic,
                    };
                    d.stepper.set_trigger(next);
                    log::info!("Stepping: {:?}", next);
                }
            }
            Command::ToggleOverlay(overlay) => {
                let on = self.overlays.toggle(overlay);
                log::debug!("Overlay {} {}", overlay.as_str(), if on { "on" } else { "off" });
            }
            Command::ApplyPreset(index) => {
                self.scenario.apply_preset(&self.config.scenario, index);
            }
            Command::RefineInstant | Command::CoarsenInstant => self.change_instant(command),
            Command::Freeze => {
                if self.clock.frozen() {
                    self.clock.unfreeze();
                } else {
                    self.clock.freeze(self.config.freeze_duration);
                    log::info!("Frozen for {:.1}s", self.config.freeze_duration);
                }
            }
            Command::Quit => {}
        }
    }

    fn change_instant(&mut self, command: Command) {
        let (ScenarioState::Arrow(arrow), ScenarioConfig::Arrow(c)) =
            (&mut self.scenario, &self.config.scenario)
        else {
            return;
        };
        let last = c.instant_resolutions.len() - 1;
        arrow.instant_index = match command {
            Command::RefineInstant => (arrow.instant_index + 1).min(last),
            _ => arrow.instant_index.saturating_sub(1),
        };
    }

    /// Rebuild scenario state; speed, mode and overlays survive
    fn reset(&mut self) {
        let instant = match &self.scenario {
            ScenarioState::Arrow(a) => Some(a.instant_index),
            _ => None,
        };
        let trigger = self.scenario.stepper().map(|s| s.trigger);

        self.scenario = ScenarioState::build(&self.config.scenario);
        match &mut self.scenario {
            ScenarioState::Arrow(a) => {
                if let Some(i) = instant {
                    a.instant_index = i;
                }
            }
            ScenarioState::Dichotomy(d) => {
                if let Some(t) = trigger {
                    d.stepper.set_trigger(t);
                }
            }
            ScenarioState::Pursuit(_) => {}
        }

        self.clock.reset();
        self.pool.clear();
        self.history.clear();
        self.ghosts.clear();
        self.completed = false;
        log::info!("Reset {}", self.scenario.kind().as_str());
    }

    fn sample_ghosts(&mut self) {
        self.ghosts.clear();
        if self.modes.current() != SimulationMode::ProbabilisticView || !self.overlays.uncertainty {
            return;
        }
        let (ScenarioState::Arrow(arrow), ScenarioConfig::Arrow(c)) = (&self.scenario, &self.config.scenario)
        else {
            return;
        };
        let center = arrow.bodies[0].position;
        for _ in 0..c.ghost_count {
            self.ghosts.push(center + self.jitter.sample(&mut self.ghost_rng));
        }
    }
}
