//! Deterministic simulation module
//!
//! Everything that moves lives here. This module must be pure and deterministic:
//! - Time enters only through the per-tick delta
//! - Seeded RNG only
//! - Stable iteration order (bodies by index, particles by insertion)
//! - No rendering or platform dependencies

pub mod clock;
pub mod history;
pub mod mode;
pub mod motion;
pub mod particles;
pub mod scenario;
pub mod stepper;
pub mod tick;

pub use clock::{ClockConfig, EngineClock};
pub use history::{HistoryBuffer, HistorySample};
pub use mode::{ModeController, Overlay, OverlaySet, SimulationMode};
pub use motion::{Advance, Body, StopCondition, advance};
pub use particles::{Color, ColorPolicy, EmissionPolicy, EmitShape, Particle, ParticleConfig, ParticlePool};
pub use scenario::{
    ArrowConfig, DichotomyConfig, EngineConfig, PursuitConfig, ScenarioConfig, ScenarioKind, ScenarioState,
    SpeedPreset,
};
pub use stepper::{StepEvent, StepTrigger, SteppedTarget, StepperPhase};
pub use tick::{Command, Engine, EngineEvent, InstantView, Presenter, Snapshot, TickInput, TickOutcome};
