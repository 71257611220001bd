//! Continuous motion model
//!
//! Bodies travel along a 1-D track at constant speed. A scenario supplies a
//! stop condition; once it holds, further advancement is a no-op but all
//! state is retained for display.

use serde::{Deserialize, Serialize};

/// A moving entity on the track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub position: f32,
    /// Units per second, never negative
    pub speed: f32,
    #[serde(default)]
    pub label: Option<String>,
}

impl Body {
    pub fn new(position: f32, speed: f32) -> Self {
        Self {
            position,
            speed: speed.max(0.0),
            label: None,
        }
    }

    pub fn labeled(position: f32, speed: f32, label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::new(position, speed)
        }
    }
}

/// When continuous motion halts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StopCondition {
    /// Never stops on its own
    Never,
    /// Stops when `pursuer` reaches or passes `target` (indices into the body slice)
    Catch { pursuer: usize, target: usize },
    /// Stops when `body` reaches the track end
    TrackEnd { body: usize, end: f32 },
}

impl StopCondition {
    /// Whether the condition already holds
    pub fn is_met(&self, bodies: &[Body]) -> bool {
        match *self {
            StopCondition::Never => false,
            StopCondition::Catch { pursuer, target } => match (bodies.get(pursuer), bodies.get(target)) {
                (Some(p), Some(t)) => p.position >= t.position,
                _ => false,
            },
            StopCondition::TrackEnd { body, end } => {
                bodies.get(body).is_some_and(|b| b.position >= end)
            }
        }
    }

    /// Simulation time until the condition is met, if it ever will be
    fn time_to_stop(&self, bodies: &[Body]) -> Option<f32> {
        match *self {
            StopCondition::Never => None,
            StopCondition::Catch { pursuer, target } => {
                let (p, t) = (bodies.get(pursuer)?, bodies.get(target)?);
                let closing = p.speed - t.speed;
                (closing > 0.0).then(|| (t.position - p.position) / closing)
            }
            StopCondition::TrackEnd { body, end } => {
                let b = bodies.get(body)?;
                (b.speed > 0.0).then(|| (end - b.position) / b.speed)
            }
        }
    }

    /// Remove float residue at the stopping point
    fn snap(&self, bodies: &mut [Body]) {
        match *self {
            StopCondition::Never => {}
            StopCondition::Catch { pursuer, target } => {
                if let Some(meet) = bodies.get(target).map(|t| t.position) {
                    if let Some(p) = bodies.get_mut(pursuer) {
                        p.position = meet;
                    }
                }
            }
            StopCondition::TrackEnd { body, end } => {
                if let Some(b) = bodies.get_mut(body) {
                    b.position = end;
                }
            }
        }
    }
}

/// Result of one motion advance
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Advance {
    /// Portion of `dt` that was actually simulated
    pub consumed: f32,
    /// The stop condition holds after this advance
    pub stopped: bool,
}

/// Advance every body by `speed * dt`, halting exactly at the stop point.
///
/// Negative (or NaN) `dt` is treated as zero.
pub fn advance(bodies: &mut [Body], dt: f32, stop: StopCondition) -> Advance {
    let dt = dt.max(0.0);
    if stop.is_met(bodies) {
        return Advance {
            consumed: 0.0,
            stopped: true,
        };
    }

    let until_stop = stop.time_to_stop(bodies).filter(|t| *t <= dt);
    let step = until_stop.unwrap_or(dt);
    for body in bodies.iter_mut() {
        body.position += body.speed * step;
    }

    // Rounding can carry a body past a stop point predicted just beyond dt
    let stopped = until_stop.is_some() || stop.is_met(bodies);
    if stopped {
        stop.snap(bodies);
    }

    Advance {
        consumed: step,
        stopped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_linear() {
        let mut bodies = [Body::new(5.0, 4.0)];
        let adv = advance(&mut bodies, 0.5, StopCondition::Never);
        assert_eq!(bodies[0].position, 7.0);
        assert_eq!(adv.consumed, 0.5);
        assert!(!adv.stopped);
    }

    #[test]
    fn test_negative_dt_is_noop() {
        let mut bodies = [Body::new(5.0, 4.0)];
        let adv = advance(&mut bodies, -1.0, StopCondition::Never);
        assert_eq!(bodies[0].position, 5.0);
        assert_eq!(adv.consumed, 0.0);
    }

    #[test]
    fn test_catch_lands_on_crossing() {
        let mut bodies = [Body::new(0.0, 10.0), Body::new(100.0, 1.0)];
        let stop = StopCondition::Catch {
            pursuer: 0,
            target: 1,
        };
        let adv = advance(&mut bodies, 20.0, stop);
        assert!(adv.stopped);
        assert!((adv.consumed - 100.0 / 9.0).abs() < 1e-4);
        assert_eq!(bodies[0].position, bodies[1].position);

        // Further advances keep state
        let again = advance(&mut bodies, 1.0, stop);
        assert!(again.stopped);
        assert_eq!(again.consumed, 0.0);
        assert!((bodies[1].position - (100.0 + 100.0 / 9.0)).abs() < 1e-3);
    }

    #[test]
    fn test_slower_pursuer_never_stops() {
        let mut bodies = [Body::new(0.0, 1.0), Body::new(10.0, 2.0)];
        let stop = StopCondition::Catch {
            pursuer: 0,
            target: 1,
        };
        let adv = advance(&mut bodies, 100.0, stop);
        assert!(!adv.stopped);
        assert_eq!(bodies[0].position, 100.0);
    }

    #[test]
    fn test_track_end() {
        let mut bodies = [Body::labeled(790.0, 120.0, "arrow")];
        let stop = StopCondition::TrackEnd { body: 0, end: 800.0 };
        let adv = advance(&mut bodies, 1.0 / 60.0, stop);
        assert!(!adv.stopped);
        let adv = advance(&mut bodies, 1.0, stop);
        assert!(adv.stopped);
        assert_eq!(bodies[0].position, 800.0);
    }

    #[test]
    fn test_negative_speed_clamped() {
        assert_eq!(Body::new(0.0, -3.0).speed, 0.0);
    }
}
