//! Throughput estimation (smoothed speed, time remaining).
//!
//! Each tick turns the bytes moved since the previous tick into a rate, keeps
//! the last `WINDOW_CAPACITY` rates, and reports their mean as the smoothed
//! speed. ETA = (total_expected - total_now) / smoothed speed.

use std::collections::VecDeque;
use std::time::Duration;

/// Number of interval rates kept for smoothing.
pub const WINDOW_CAPACITY: usize = 5;

/// Bounded FIFO of recent interval rates (bytes per second).
#[derive(Debug, Clone, Default)]
pub struct SpeedWindow {
    samples: VecDeque<f64>,
}

impl SpeedWindow {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(WINDOW_CAPACITY),
        }
    }

    /// Push a rate, evicting the oldest once the window is full.
    pub fn push(&mut self, rate: f64) {
        if self.samples.len() == WINDOW_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(rate);
    }

    /// Samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Arithmetic mean of the window (0 when empty).
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }
}

/// Estimated time remaining.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Eta {
    Seconds(f64),
    /// Speed is zero, so no finite estimate exists.
    Unknown,
}

impl Eta {
    pub fn from_remaining(remaining_bytes: u64, bytes_per_sec: f64) -> Self {
        if remaining_bytes == 0 {
            return Eta::Seconds(0.0);
        }
        if bytes_per_sec <= 0.0 || !bytes_per_sec.is_finite() {
            return Eta::Unknown;
        }
        Eta::Seconds(remaining_bytes as f64 / bytes_per_sec)
    }

    pub fn as_secs(&self) -> Option<f64> {
        match self {
            Eta::Seconds(s) => Some(*s),
            Eta::Unknown => None,
        }
    }
}

/// Output of one estimator tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Smoothed speed in bytes per second.
    pub bytes_per_sec: f64,
    pub eta: Eta,
}

/// Sliding-window speed/ETA estimator. Not thread-safe by itself; the batch
/// gives it to exactly one ticking thread.
#[derive(Debug, Clone)]
pub struct ThroughputEstimator {
    window: SpeedWindow,
    last_total: u64,
}

impl ThroughputEstimator {
    /// Start from the byte total observed when the batch began.
    pub fn new(start_total: u64) -> Self {
        Self {
            window: SpeedWindow::new(),
            last_total: start_total,
        }
    }

    /// Record one interval and return the smoothed speed and ETA.
    pub fn tick(&mut self, total_now: u64, total_expected: u64, interval: Duration) -> Estimate {
        let delta = total_now.saturating_sub(self.last_total);
        self.last_total = total_now;
        let secs = interval.as_secs_f64();
        let rate = if secs > 0.0 { delta as f64 / secs } else { 0.0 };
        self.window.push(rate);
        let bytes_per_sec = self.window.mean();
        Estimate {
            bytes_per_sec,
            eta: Eta::from_remaining(total_expected.saturating_sub(total_now), bytes_per_sec),
        }
    }

    pub fn window(&self) -> &SpeedWindow {
        &self.window
    }
}
