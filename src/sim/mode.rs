//! Display/analysis mode selection and overlay toggles
//!
//! Pure selection: nothing here touches physics.

use serde::{Deserialize, Serialize};

/// Analysis overlay the presentation layer should draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulationMode {
    /// Plain continuous motion
    Continuous,
    /// Zeno's step-by-step reading (catch-up stages, halvings, instants)
    DiscreteSteps,
    /// Closed-form series / formulas
    Mathematical,
    /// Energy bookkeeping of the stone
    Energy,
    /// Position as a function with its derivative
    DerivativeView,
    /// Position as a distribution (jittered ghosts)
    ProbabilisticView,
}

impl SimulationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationMode::Continuous => "Continuous",
            SimulationMode::DiscreteSteps => "Discrete steps",
            SimulationMode::Mathematical => "Mathematical",
            SimulationMode::Energy => "Energy",
            SimulationMode::DerivativeView => "Derivative",
            SimulationMode::ProbabilisticView => "Probabilistic",
        }
    }
}

/// Circular selection over a fixed per-scenario mode list
#[derive(Debug, Clone)]
pub struct ModeController {
    modes: &'static [SimulationMode],
    index: usize,
}

impl ModeController {
    /// `modes` must be non-empty
    pub fn new(modes: &'static [SimulationMode]) -> Self {
        debug_assert!(!modes.is_empty());
        Self { modes, index: 0 }
    }

    pub fn current(&self) -> SimulationMode {
        self.modes[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn modes(&self) -> &'static [SimulationMode] {
        self.modes
    }

    /// Advance to the next mode, wrapping around
    pub fn cycle(&mut self) -> SimulationMode {
        self.index = (self.index + 1) % self.modes.len();
        log::info!("Mode: {}", self.current().as_str());
        self.current()
    }

    /// Jump to `mode`; modes outside this scenario's set are ignored
    pub fn set(&mut self, mode: SimulationMode) -> bool {
        match self.modes.iter().position(|m| *m == mode) {
            Some(i) => {
                self.index = i;
                true
            }
            None => {
                log::warn!("Mode {:?} not available here, ignored", mode);
                false
            }
        }
    }

    /// Jump by position in the cycle; out-of-range indices are ignored
    pub fn set_index(&mut self, index: usize) -> bool {
        if index < self.modes.len() {
            self.index = index;
            true
        } else {
            false
        }
    }
}

/// Optional overlays, independent of the active mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Overlay {
    Trajectories,
    DistanceGraph,
    StepLadder,
    SeriesTable,
    Uncertainty,
}

impl Overlay {
    pub const ALL: [Overlay; 5] = [
        Overlay::Trajectories,
        Overlay::DistanceGraph,
        Overlay::StepLadder,
        Overlay::SeriesTable,
        Overlay::Uncertainty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Overlay::Trajectories => "trajectories",
            Overlay::DistanceGraph => "graph",
            Overlay::StepLadder => "steps",
            Overlay::SeriesTable => "series",
            Overlay::Uncertainty => "uncertainty",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trajectories" | "trajectory" | "t" => Some(Overlay::Trajectories),
            "graph" | "distance" | "g" => Some(Overlay::DistanceGraph),
            "steps" | "ladder" | "e" => Some(Overlay::StepLadder),
            "series" | "s" => Some(Overlay::SeriesTable),
            "uncertainty" | "u" => Some(Overlay::Uncertainty),
            _ => None,
        }
    }
}

/// On/off flags for each overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySet {
    pub trajectories: bool,
    pub distance_graph: bool,
    pub step_ladder: bool,
    pub series_table: bool,
    pub uncertainty: bool,
}

impl Default for OverlaySet {
    fn default() -> Self {
        Self {
            trajectories: true,
            distance_graph: true,
            step_ladder: true,
            series_table: true,
            uncertainty: false,
        }
    }
}

impl OverlaySet {
    fn slot(&mut self, overlay: Overlay) -> &mut bool {
        match overlay {
            Overlay::Trajectories => &mut self.trajectories,
            Overlay::DistanceGraph => &mut self.distance_graph,
            Overlay::StepLadder => &mut self.step_ladder,
            Overlay::SeriesTable => &mut self.series_table,
            Overlay::Uncertainty => &mut self.uncertainty,
        }
    }

    pub fn is_on(&self, overlay: Overlay) -> bool {
        match overlay {
            Overlay::Trajectories => self.trajectories,
            Overlay::DistanceGraph => self.distance_graph,
            Overlay::StepLadder => self.step_ladder,
            Overlay::SeriesTable => self.series_table,
            Overlay::Uncertainty => self.uncertainty,
        }
    }

    /// Flip an overlay, returning its new state
    pub fn toggle(&mut self, overlay: Overlay) -> bool {
        let slot = self.slot(overlay);
        *slot = !*slot;
        *slot
    }
}
