//! Temporal smoothing with z-score outlier rejection.
//!
//! Converts a noisy per-frame scalar stream into a stable value suitable
//! for display, resilient to detection jitter and sporadic bad frames.

use crate::constants::EPSILON;
use std::collections::VecDeque;

/// Statistical summary of a data window
#[derive(Debug, Clone, Copy)]
pub struct Statistics {
    /// Mean value of the data
    pub mean: f64,
    /// Population standard deviation of the data
    pub std_dev: f64,
    /// Minimum value in the window
    pub min: f64,
    /// Maximum value in the window
    pub max: f64,
    /// Range (max - min) of the data
    pub range: f64,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    value: f64,
    timestamp_ms: f64,
}

/// Rolling smoother over the most recent accepted samples
///
/// Holds at most `window_size` samples (FIFO). A new value is rejected as
/// an outlier when it deviates from the current window mean by more than
/// `outlier_std_dev_threshold` standard deviations; rejected values never
/// enter the window, so a single bad frame cannot corrupt the trend.
pub struct DataSmoother {
    window_size: usize,
    outlier_std_dev_threshold: f64,
    window: VecDeque<Sample>,
    last_smoothed: Option<f64>,
}

impl DataSmoother {
    /// Create a new smoother
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is zero or the threshold is negative.
    #[must_use]
    pub fn new(window_size: usize, outlier_std_dev_threshold: f64) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        assert!(
            outlier_std_dev_threshold >= 0.0,
            "Outlier threshold must be non-negative, got {}",
            outlier_std_dev_threshold
        );
        Self {
            window_size,
            outlier_std_dev_threshold,
            window: VecDeque::with_capacity(window_size),
            last_smoothed: None,
        }
    }

    /// Add a sample; returns `true` when it was rejected as an outlier
    ///
    /// With fewer than 2 samples of history every finite value is
    /// accepted, as is any value when the window has zero variance.
    /// Non-finite values are always rejected.
    pub fn add_value(&mut self, value: f64, timestamp_ms: f64) -> bool {
        if !value.is_finite() {
            log::debug!("rejecting non-finite sample {value}");
            return true;
        }

        if self.window.len() >= 2 && self.classify_outlier(value) {
            log::debug!("rejecting outlier sample {value}");
            return true;
        }

        if self.window.len() >= self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(Sample {
            value,
            timestamp_ms,
        });
        self.last_smoothed = Some(self.window_mean());
        false
    }

    /// Read-only z-score probe: would `value` be rejected as an outlier?
    #[must_use]
    pub fn is_outlier(&self, value: f64) -> bool {
        if !value.is_finite() {
            return true;
        }
        if self.window.len() < 2 {
            return false;
        }
        self.classify_outlier(value)
    }

    /// Mean of the current window
    ///
    /// When the window is empty this returns the last value that was ever
    /// smoothed (the sentinel survives `reset`), or `0.0` if the smoother
    /// was never populated.
    #[must_use]
    pub fn smoothed_value(&self) -> f64 {
        if self.window.is_empty() {
            return self.last_smoothed.unwrap_or(0.0);
        }
        self.window_mean()
    }

    /// Statistics over the current window, `None` when empty
    #[must_use]
    pub fn stats(&self) -> Option<Statistics> {
        if self.window.is_empty() {
            return None;
        }

        let n = self.window.len() as f64;
        let mean = self.window_mean();
        let variance = self
            .window
            .iter()
            .map(|s| (s.value - mean).powi(2))
            .sum::<f64>()
            / n;
        let min = self
            .window
            .iter()
            .map(|s| s.value)
            .fold(f64::INFINITY, f64::min);
        let max = self
            .window
            .iter()
            .map(|s| s.value)
            .fold(f64::NEG_INFINITY, f64::max);

        Some(Statistics {
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
            range: max - min,
        })
    }

    /// Time span covered by the current window in milliseconds
    ///
    /// Zero with fewer than 2 samples.
    #[must_use]
    pub fn window_span_ms(&self) -> f64 {
        match (self.window.front(), self.window.back()) {
            (Some(oldest), Some(newest)) => newest.timestamp_ms - oldest.timestamp_ms,
            _ => 0.0,
        }
    }

    /// Number of samples currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// True when no samples are held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// True when the window holds `window_size` samples
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.window.len() >= self.window_size
    }

    /// Configured window size
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Clear the window; the smoothed-value sentinel is retained
    pub fn reset(&mut self) {
        self.window.clear();
    }

    fn window_mean(&self) -> f64 {
        self.window.iter().map(|s| s.value).sum::<f64>() / self.window.len() as f64
    }

    fn classify_outlier(&self, value: f64) -> bool {
        let stats = match self.stats() {
            Some(stats) => stats,
            None => return false,
        };
        if stats.std_dev <= EPSILON {
            return false;
        }
        (value - stats.mean).abs() > self.outlier_std_dev_threshold * stats.std_dev
    }
}
