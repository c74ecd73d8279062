//! Time interpolated pose history

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;

use crate::geom::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A window of timestamped poses which can be sampled at any time inside the window.
#[derive(Debug, Clone)]
pub struct PoseBuffer {
    /// Units: seconds
    history_s: f64,

    /// Samples in ascending time order.
    samples: VecDeque<(f64, Pose)>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PoseBuffer {
    pub fn new(history_s: f64) -> Self {
        Self {
            history_s,
            samples: VecDeque::new(),
        }
    }

    /// Add a sample, dropping those which have fallen out of the window.
    ///
    /// A sample with the same time as an existing one replaces it.
    pub fn add_sample(&mut self, time_s: f64, pose: Pose) {
        while let Some((t, _)) = self.samples.front() {
            if time_s - t >= self.history_s {
                self.samples.pop_front();
            }
            else {
                break;
            }
        }

        let idx = self.samples.partition_point(|(t, _)| *t < time_s);
        match self.samples.get_mut(idx) {
            Some(s) if s.0 == time_s => s.1 = pose,
            _ => self.samples.insert(idx, (time_s, pose)),
        }
    }

    /// Sample the buffer at the given time.
    ///
    /// Times outside the window are clamped to the oldest or newest sample. Returns `None` only
    /// if the buffer is empty.
    pub fn sample(&self, time_s: f64) -> Option<Pose> {
        let (first_t, first) = *self.samples.front()?;
        let (last_t, last) = *self.samples.back()?;

        if time_s <= first_t {
            return Some(first);
        }
        if time_s >= last_t {
            return Some(last);
        }

        // first_t < time_s < last_t so both neighbours exist
        let idx = self.samples.partition_point(|(t, _)| *t <= time_s);
        let (floor_t, floor) = self.samples[idx - 1];
        let (ceil_t, ceil) = self.samples[idx];

        if floor_t == time_s {
            return Some(floor);
        }

        Some(floor.interpolate(&ceil, (time_s - floor_t) / (ceil_t - floor_t)))
    }

    pub fn first_time_s(&self) -> Option<f64> {
        self.samples.front().map(|s| s.0)
    }

    pub fn last_time_s(&self) -> Option<f64> {
        self.samples.back().map(|s| s.0)
    }

    pub fn history_s(&self) -> f64 {
        self.history_s
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
