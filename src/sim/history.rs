//! Time-sampled history for plotting
//!
//! Samples are spaced by at least `min_interval` seconds so growth tracks
//! simulated duration, not frame count.

use serde::Serialize;

/// One recorded sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistorySample<T> {
    pub time: f32,
    pub values: T,
}

#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    samples: Vec<HistorySample<T>>,
    min_interval: f32,
}

impl<T: Copy> HistoryBuffer<T> {
    pub fn new(min_interval: f32) -> Self {
        Self {
            samples: Vec::new(),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> f32 {
        self.min_interval
    }

    /// Append if the buffer is empty or `time` is at least `min_interval`
    /// past the last sample. Returns whether the sample was kept.
    pub fn record(&mut self, time: f32, values: T) -> bool {
        let accept = match self.samples.last() {
            None => time.is_finite(),
            Some(last) => time - last.time >= self.min_interval,
        };
        if accept {
            self.samples.push(HistorySample { time, values });
        }
        accept
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Read-only view for plotting
    pub fn samples(&self) -> &[HistorySample<T>] {
        &self.samples
    }

    /// Owned copy for consumers that outlive the tick
    pub fn snapshot(&self) -> Vec<HistorySample<T>> {
        self.samples.clone()
    }

    pub fn last(&self) -> Option<&HistorySample<T>> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
