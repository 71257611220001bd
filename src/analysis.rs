//! Closed-form analysis and console tables
//!
//! Pure functions over plain numbers. The engine never calls into this
//! module; the console runner and overlay drawing do.

use serde::Serialize;

/// Safety cap on the discrete pursuit table
pub const MAX_PURSUIT_ROWS: usize = 200;
/// Safety cap on the dichotomy halving table
pub const MAX_HALVINGS: usize = 50;
/// Instants listed per width in the arrow table
pub const MAX_INSTANTS: usize = 20;

/// Two runners on a line, the pursuer behind
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Race {
    pub pursuer_start: f64,
    pub pursuer_speed: f64,
    pub target_start: f64,
    pub target_speed: f64,
}

impl Default for Race {
    /// Achilles at 10 m/s, the tortoise at 1 m/s with a 100 m lead
    fn default() -> Self {
        Self {
            pursuer_start: 0.0,
            pursuer_speed: 10.0,
            target_start: 100.0,
            target_speed: 1.0,
        }
    }
}

/// One row of the discrete-time race table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RaceRow {
    pub time: f64,
    pub pursuer: f64,
    pub target: f64,
    pub gap: f64,
}

/// Zeno's reading of a single catch-up stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CatchUpStage {
    /// Lead at the start of the stage
    pub lead: f64,
    /// Time for the pursuer to cover that lead
    pub time_to_reach: f64,
    /// Lead the target has built meanwhile
    pub new_lead: f64,
    /// `new_lead / lead` (0 when there is no lead)
    pub ratio: f64,
}

/// One term of the Zeno catch-up series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStep {
    pub index: usize,
    pub step_time: f64,
    pub total_time: f64,
    pub position: f64,
}

impl Race {
    /// Time at which the pursuer draws level; `None` if it never does
    pub fn catch_time(&self) -> Option<f64> {
        let lead = self.target_start - self.pursuer_start;
        if lead <= 0.0 {
            return Some(0.0);
        }
        let closing = self.pursuer_speed - self.target_speed;
        (closing > 0.0).then(|| lead / closing)
    }

    /// Where the pursuer draws level
    pub fn catch_position(&self) -> Option<f64> {
        self.catch_time()
            .map(|t| self.pursuer_start + self.pursuer_speed * t)
    }

    /// Stage analysis for a given lead
    pub fn stage(&self, lead: f64) -> CatchUpStage {
        let time_to_reach = if self.pursuer_speed > 0.0 {
            lead.max(0.0) / self.pursuer_speed
        } else {
            f64::INFINITY
        };
        let new_lead = time_to_reach * self.target_speed;
        let ratio = if lead > 0.0 { new_lead / lead } else { 0.0 };
        CatchUpStage {
            lead,
            time_to_reach,
            new_lead,
            ratio,
        }
    }

    /// Fixed-step simulation, one row per step until the pursuer is level
    /// or `MAX_PURSUIT_ROWS` is reached. Rows are states before each step.
    pub fn table(&self, dt: f64) -> Vec<RaceRow> {
        let mut rows = Vec::new();
        if dt <= 0.0 {
            return rows;
        }
        let (mut pursuer, mut target) = (self.pursuer_start, self.target_start);
        let mut time = 0.0;
        while pursuer < target && rows.len() < MAX_PURSUIT_ROWS {
            rows.push(RaceRow {
                time,
                pursuer,
                target,
                gap: target - pursuer,
            });
            pursuer += self.pursuer_speed * dt;
            target += self.target_speed * dt;
            time += dt;
        }
        rows
    }

    /// First `terms` stages of the Zeno series. Total time converges to
    /// [`Race::catch_time`].
    pub fn zeno_series(&self, terms: usize) -> Vec<SeriesStep> {
        let mut out = Vec::with_capacity(terms);
        let mut lead = self.target_start - self.pursuer_start;
        let mut total_time = 0.0;
        let mut position = self.pursuer_start;
        for index in 1..=terms {
            let stage = self.stage(lead);
            if !stage.time_to_reach.is_finite() {
                break;
            }
            total_time += stage.time_to_reach;
            position += stage.time_to_reach * self.pursuer_speed;
            out.push(SeriesStep {
                index,
                step_time: stage.time_to_reach,
                total_time,
                position,
            });
            lead = stage.new_lead;
        }
        out
    }
}

/// One row of the halving table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HalvingRow {
    pub step: usize,
    pub position: f64,
    pub remaining: f64,
    pub half: f64,
}

/// Halve the remaining distance until it drops below `threshold` or
/// `MAX_HALVINGS` steps have been taken. The final row is the state that
/// ended the table.
pub fn dichotomy_table(distance: f64, threshold: f64) -> Vec<HalvingRow> {
    let mut rows = Vec::new();
    let mut position = 0.0;
    for step in 0..=MAX_HALVINGS {
        let remaining = distance - position;
        let half = remaining / 2.0;
        rows.push(HalvingRow {
            step,
            position,
            remaining,
            half,
        });
        if remaining < threshold {
            break;
        }
        position += half;
    }
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesRow {
    pub term: f64,
    pub partial_sum: f64,
    /// What is still missing from the limit
    pub rest: f64,
}

/// Partial sums of `first + first*ratio + ...`, with the rest measured
/// against the closed-form limit `first / (1 - ratio)`
pub fn geometric_series(first: f64, ratio: f64, terms: usize) -> Vec<SeriesRow> {
    let limit = geometric_limit(first, ratio).unwrap_or(f64::INFINITY);
    let mut term = first;
    let mut partial_sum = 0.0;
    (0..terms)
        .map(|_| {
            partial_sum += term;
            let row = SeriesRow {
                term,
                partial_sum,
                rest: limit - partial_sum,
            };
            term *= ratio;
            row
        })
        .collect()
}

/// Sum of the infinite series, when it converges
pub fn geometric_limit(first: f64, ratio: f64) -> Option<f64> {
    (ratio.abs() < 1.0).then(|| first / (1.0 - ratio))
}

/// First `count` step lengths of the dichotomy as fractions of the distance
/// (1/2, 1/4, ...)
pub fn step_ladder(count: usize) -> Vec<f64> {
    std::iter::successors(Some(0.5_f64), |f| Some(f / 2.0))
        .take(count)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InstantRow {
    pub time: f64,
    pub position: f64,
    pub displacement: f64,
    pub mean_speed: f64,
}

/// The arrow's flight cut into instants of width `dt`, at most
/// `MAX_INSTANTS` rows, stopping once the target is reached
pub fn instant_table(speed: f64, target: f64, dt: f64) -> Vec<InstantRow> {
    let mut rows = Vec::new();
    if dt <= 0.0 {
        return rows;
    }
    let displacement = speed * dt;
    let mut position = 0.0;
    let mut time = 0.0;
    while position < target && rows.len() < MAX_INSTANTS {
        rows.push(InstantRow {
            time,
            position,
            displacement,
            mean_speed: displacement / dt,
        });
        position += displacement;
        time += dt;
    }
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuotientRow {
    pub delta_t: f64,
    pub delta_x: f64,
    pub quotient: f64,
}

/// Difference quotients of `x(t) = speed * t` at `t` for shrinking `deltas`
pub fn difference_quotients(speed: f64, t: f64, deltas: &[f64]) -> Vec<QuotientRow> {
    let x = |t: f64| speed * t;
    deltas
        .iter()
        .filter(|d| **d > 0.0)
        .map(|&delta_t| {
            let delta_x = x(t + delta_t) - x(t);
            QuotientRow {
                delta_t,
                delta_x,
                quotient: delta_x / delta_t,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_up_closed_form() {
        let race = Race::default();
        let t = race.catch_time().expect("pursuer is faster");
        assert!((t - 100.0 / 9.0).abs() < 1e-12);
        assert!((race.catch_position().unwrap() - 1000.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_catch_when_slower() {
        let race = Race {
            pursuer_speed: 1.0,
            target_speed: 2.0,
            ..Race::default()
        };
        assert_eq!(race.catch_time(), None);
        let level = Race {
            target_start: 0.0,
            ..Race::default()
        };
        assert_eq!(level.catch_time(), Some(0.0));
    }

    #[test]
    fn test_stage_ratio_is_speed_ratio() {
        let stage = Race::default().stage(100.0);
        assert!((stage.time_to_reach - 10.0).abs() < 1e-12);
        assert!((stage.new_lead - 10.0).abs() < 1e-12);
        assert!((stage.ratio - 0.1).abs() < 1e-12);
        assert_eq!(Race::default().stage(0.0).ratio, 0.0);
    }

    #[test]
    fn test_race_table() {
        let rows = Race::default().table(1.0);
        // Level after 12 one-second steps: 120 >= 112
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].gap, 100.0);
        assert_eq!(rows[11].time, 11.0);
        assert!(Race::default().table(0.0).is_empty());
    }

    #[test]
    fn test_race_table_capped() {
        let race = Race {
            pursuer_speed: 1.0,
            target_speed: 1.0,
            ..Race::default()
        };
        assert_eq!(race.table(1.0).len(), MAX_PURSUIT_ROWS);
    }

    #[test]
    fn test_zeno_series_converges() {
        let race = Race::default();
        let series = race.zeno_series(10);
        assert_eq!(series.len(), 10);
        assert!((series[0].step_time - 10.0).abs() < 1e-12);
        assert!((series[1].step_time - 1.0).abs() < 1e-12);
        let limit = race.catch_time().unwrap();
        assert!((series[9].total_time - limit).abs() < 1e-8);
        assert!(series.windows(2).all(|w| w[1].total_time > w[0].total_time));
    }

    #[test]
    fn test_dichotomy_table() {
        let rows = dichotomy_table(8.0, 0.001);
        let last = rows.last().unwrap();
        assert!(last.remaining < 0.001);
        // 8 / 2^13 < 0.001 <= 8 / 2^12
        assert_eq!(last.step, 13);
        assert_eq!(rows[1].position, 4.0);
    }

    #[test]
    fn test_dichotomy_table_capped() {
        let rows = dichotomy_table(8.0, 0.0);
        assert_eq!(rows.len(), MAX_HALVINGS + 1);
    }

    #[test]
    fn test_geometric_series() {
        let rows = geometric_series(4.0, 0.5, 15);
        assert_eq!(rows.len(), 15);
        assert_eq!(rows[0].partial_sum, 4.0);
        assert_eq!(rows[0].rest, 4.0);
        assert!(rows[14].rest < 0.001);
        assert_eq!(geometric_limit(4.0, 0.5), Some(8.0));
        assert_eq!(geometric_limit(1.0, 1.0), None);
    }

    #[test]
    fn test_step_ladder() {
        assert_eq!(step_ladder(3), vec![0.5, 0.25, 0.125]);
        assert!(step_ladder(0).is_empty());
    }

    #[test]
    fn test_instant_table() {
        // 25 m/s to 50 m: two one-second instants
        let rows = instant_table(25.0, 50.0, 1.0);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.mean_speed == 25.0));
        assert_eq!(instant_table(25.0, 50.0, 0.01).len(), MAX_INSTANTS);
    }

    #[test]
    fn test_difference_quotients() {
        let rows = difference_quotients(25.0, 1.0, &[1.0, 0.1, 0.0, 0.001]);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| (r.quotient - 25.0).abs() < 1e-6));
    }
}
