//! Discrete Zeno stepper
//!
//! Moves a marker from `origin` toward `destination` by halving whatever
//! distance remains. Steps are driven by an internal timer (automatic) or by
//! explicit commands (manual), never both.

use serde::{Deserialize, Serialize};

/// Lifecycle of a stepper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepperPhase {
    /// Created, simulation not started yet
    Idle,
    /// Steps are being taken
    Stepping,
    /// Remaining distance fell below epsilon (terminal until reset)
    Done,
}

/// What drives the next step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepTrigger {
    /// Step every `step_period` seconds of simulation time
    Automatic,
    /// Step only on an explicit command
    Manual,
}

/// A single halving step that was taken
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepEvent {
    /// Index of the step just taken (1-based)
    pub index: u32,
    /// Marker position after the step
    pub position: f32,
    /// Distance left to the destination
    pub remaining: f32,
    /// This step brought the marker within epsilon
    pub finished: bool,
}

/// Stepper state, recreated from scratch on reset
#[derive(Debug, Clone, Serialize)]
pub struct SteppedTarget {
    pub origin: f32,
    pub destination: f32,
    pub current: f32,
    pub step_index: u32,
    pub step_timer: f32,
    pub step_period: f32,
    pub epsilon: f32,
    pub phase: StepperPhase,
    pub trigger: StepTrigger,
}

impl SteppedTarget {
    pub fn new(origin: f32, destination: f32, step_period: f32, epsilon: f32) -> Self {
        Self {
            origin,
            destination,
            current: origin,
            step_index: 0,
            step_timer: 0.0,
            step_period,
            epsilon,
            phase: StepperPhase::Idle,
            trigger: StepTrigger::Automatic,
        }
    }

    /// Signed distance still to travel
    pub fn remaining(&self) -> f32 {
        self.destination - self.current
    }

    /// Distance already travelled from the origin
    pub fn travelled(&self) -> f32 {
        (self.current - self.origin).abs()
    }

    pub fn finished(&self) -> bool {
        self.phase == StepperPhase::Done
    }

    /// Idle -> Stepping. No effect in any other phase.
    pub fn start(&mut self) {
        if self.phase == StepperPhase::Idle {
            self.phase = StepperPhase::Stepping;
            if self.within_epsilon() {
                self.phase = StepperPhase::Done;
            }
        }
    }

    /// Switch between timer-driven and command-driven stepping
    pub fn set_trigger(&mut self, trigger: StepTrigger) {
        if self.trigger != trigger {
            self.trigger = trigger;
            self.step_timer = 0.0;
        }
    }

    /// Timer path. Returns the step taken this tick, if any.
    pub fn advance(&mut self, dt: f32) -> Option<StepEvent> {
        if self.phase != StepperPhase::Stepping || self.trigger != StepTrigger::Automatic {
            return None;
        }
        self.step_timer += dt.max(0.0);
        if self.step_timer < self.step_period {
            return None;
        }
        self.take_step()
    }

    /// Command path. Only honoured in manual mode; starts an idle stepper.
    pub fn step_once(&mut self) -> Option<StepEvent> {
        if self.trigger != StepTrigger::Manual {
            log::warn!("Manual step ignored: stepper is timer-driven");
            return None;
        }
        self.start();
        if self.phase != StepperPhase::Stepping {
            return None;
        }
        self.take_step()
    }

    /// Jump straight to Done without moving the marker
    pub fn force_complete(&mut self) {
        self.phase = StepperPhase::Done;
    }

    fn within_epsilon(&self) -> bool {
        self.remaining().abs() <= self.epsilon
    }

    fn take_step(&mut self) -> Option<StepEvent> {
        self.step_timer = 0.0;
        if self.within_epsilon() {
            self.phase = StepperPhase::Done;
            return None;
        }

        self.current += self.remaining() / 2.0;
        self.step_index += 1;
        let finished = self.within_epsilon();
        if finished {
            self.phase = StepperPhase::Done;
        }
        log::debug!(
            "Zeno step {}: position {:.6}, remaining {:.6}",
            self.step_index,
            self.current,
            self.remaining()
        );

        Some(StepEvent {
            index: self.step_index,
            position: self.current,
            remaining: self.remaining(),
            finished,
        })
    }
}
