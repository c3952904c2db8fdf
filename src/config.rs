//! Configuration management for the measurement pipeline

use crate::constants;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Session configuration
///
/// Loaded once at startup and read-only thereafter; no component mutates
/// it, so it may be freely shared across the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reference card validation parameters
    pub card: CardConfig,

    /// Detection acceptance thresholds
    pub detection: DetectionConfig,

    /// Temporal smoothing parameters
    pub smoothing: SmoothingConfig,

    /// Measurement lifecycle parameters
    pub measurement: MeasurementConfig,
}

/// Reference card parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardConfig {
    /// Real-world card width in millimeters
    pub real_width_mm: f64,

    /// Real-world card height in millimeters
    pub real_height_mm: f64,

    /// Relative tolerance on the detected aspect ratio
    pub aspect_ratio_tolerance: f64,

    /// Maximum accepted in-plane tilt in degrees
    pub max_tilt_angle_deg: f64,

    /// Minimum card detection confidence (0.0-1.0)
    pub confidence_threshold: f32,
}

/// Detection acceptance thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum face detection confidence (0.0-1.0)
    pub face_confidence_threshold: f32,

    /// Minimum eye detection confidence (0.0-1.0)
    pub eye_confidence_threshold: f32,
}

/// Temporal smoothing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Number of samples in the rolling window
    pub window_size: usize,

    /// Z-score threshold for outlier rejection
    pub outlier_std_dev_threshold: f64,
}

/// Measurement lifecycle parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementConfig {
    /// Lower bound of the plausible IPD band in millimeters
    pub ipd_plausible_min_mm: f64,

    /// Upper bound of the plausible IPD band in millimeters
    pub ipd_plausible_max_mm: f64,

    /// Dropout tolerance while measuring, in milliseconds
    pub grace_period_ms: f64,

    /// Confidence scale applied to outlier-flagged samples
    pub outlier_confidence_scale: f32,

    /// Confidence scale applied to implausible smoothed values
    pub implausible_confidence_scale: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            card: CardConfig::default(),
            detection: DetectionConfig::default(),
            smoothing: SmoothingConfig::default(),
            measurement: MeasurementConfig::default(),
        }
    }
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            real_width_mm: constants::CARD_REAL_WIDTH_MM,
            real_height_mm: constants::CARD_REAL_HEIGHT_MM,
            aspect_ratio_tolerance: constants::DEFAULT_ASPECT_RATIO_TOLERANCE,
            max_tilt_angle_deg: constants::DEFAULT_MAX_TILT_ANGLE_DEG,
            confidence_threshold: constants::DEFAULT_CARD_CONFIDENCE_THRESHOLD,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            face_confidence_threshold: constants::DEFAULT_FACE_CONFIDENCE_THRESHOLD,
            eye_confidence_threshold: constants::DEFAULT_EYE_CONFIDENCE_THRESHOLD,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_size: constants::DEFAULT_SMOOTHING_WINDOW,
            outlier_std_dev_threshold: constants::DEFAULT_OUTLIER_STD_DEV_THRESHOLD,
        }
    }
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            ipd_plausible_min_mm: constants::IPD_PLAUSIBLE_MIN_MM,
            ipd_plausible_max_mm: constants::IPD_PLAUSIBLE_MAX_MM,
            grace_period_ms: constants::DEFAULT_GRACE_PERIOD_MS,
            outlier_confidence_scale: constants::DEFAULT_OUTLIER_CONFIDENCE_SCALE,
            implausible_confidence_scale: constants::DEFAULT_IMPLAUSIBLE_CONFIDENCE_SCALE,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` when the file cannot be read and
    /// `Error::ConfigError` when it cannot be parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` on serialization failure and
    /// `Error::Io` when the file cannot be written.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` describing the first out-of-range
    /// value found.
    pub fn validate(&self) -> Result<()> {
        if self.card.real_width_mm <= 0.0 || self.card.real_height_mm <= 0.0 {
            return Err(Error::ConfigError(
                "Card dimensions must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.card.aspect_ratio_tolerance) {
            return Err(Error::ConfigError(
                "Aspect ratio tolerance must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=90.0).contains(&self.card.max_tilt_angle_deg) {
            return Err(Error::ConfigError(
                "Maximum tilt angle must be between 0 and 90 degrees".to_string(),
            ));
        }
        for (name, value) in [
            ("Card confidence threshold", self.card.confidence_threshold),
            (
                "Face confidence threshold",
                self.detection.face_confidence_threshold,
            ),
            (
                "Eye confidence threshold",
                self.detection.eye_confidence_threshold,
            ),
            (
                "Outlier confidence scale",
                self.measurement.outlier_confidence_scale,
            ),
            (
                "Implausible confidence scale",
                self.measurement.implausible_confidence_scale,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigError(format!(
                    "{name} must be between 0.0 and 1.0"
                )));
            }
        }
        if self.smoothing.window_size == 0 {
            return Err(Error::ConfigError(
                "Smoothing window size must be greater than 0".to_string(),
            ));
        }
        if self.smoothing.outlier_std_dev_threshold < 0.0 {
            return Err(Error::ConfigError(
                "Outlier threshold must be non-negative".to_string(),
            ));
        }
        if self.measurement.ipd_plausible_min_mm <= 0.0
            || self.measurement.ipd_plausible_min_mm >= self.measurement.ipd_plausible_max_mm
        {
            return Err(Error::ConfigError(
                "Plausible IPD range must satisfy 0 < min < max".to_string(),
            ));
        }
        if self.measurement.grace_period_ms < 0.0 || !self.measurement.grace_period_ms.is_finite() {
            return Err(Error::ConfigError(
                "Grace period must be non-negative and finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# IPD Measurement Configuration

# Reference card validation
card:
  real_width_mm: 85.60
  real_height_mm: 53.98
  aspect_ratio_tolerance: 0.1
  max_tilt_angle_deg: 15.0
  confidence_threshold: 0.6

# Detection acceptance thresholds
detection:
  face_confidence_threshold: 0.6
  eye_confidence_threshold: 0.6

# Temporal smoothing
smoothing:
  window_size: 5
  outlier_std_dev_threshold: 3.0

# Measurement lifecycle
measurement:
  ipd_plausible_min_mm: 40.0
  ipd_plausible_max_mm: 85.0
  grace_period_ms: 500.0
  outlier_confidence_scale: 0.5
  implausible_confidence_scale: 0.8
"#;
