//! Constants used throughout the measurement pipeline

/// Reference card width in millimeters (ISO/IEC 7810 ID-1)
pub const CARD_REAL_WIDTH_MM: f64 = 85.60;

/// Reference card height in millimeters (ISO/IEC 7810 ID-1)
pub const CARD_REAL_HEIGHT_MM: f64 = 53.98;

/// Reference card aspect ratio (85.60 / 53.98)
pub const CARD_ASPECT_RATIO: f64 = CARD_REAL_WIDTH_MM / CARD_REAL_HEIGHT_MM;

/// Number of corners in a card detection quad
pub const CARD_CORNER_COUNT: usize = 4;

/// Default relative tolerance on the card aspect ratio
pub const DEFAULT_ASPECT_RATIO_TOLERANCE: f64 = 0.1;

/// Default maximum in-plane card tilt in degrees
pub const DEFAULT_MAX_TILT_ANGLE_DEG: f64 = 15.0;

/// Default confidence thresholds for accepting detections
pub const DEFAULT_CARD_CONFIDENCE_THRESHOLD: f32 = 0.6;
pub const DEFAULT_FACE_CONFIDENCE_THRESHOLD: f32 = 0.6;
pub const DEFAULT_EYE_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// Default smoothing window size
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Default z-score threshold for outlier rejection
pub const DEFAULT_OUTLIER_STD_DEV_THRESHOLD: f64 = 3.0;

/// Clinically plausible adult IPD range in millimeters
pub const IPD_PLAUSIBLE_MIN_MM: f64 = 40.0;
pub const IPD_PLAUSIBLE_MAX_MM: f64 = 85.0;

/// Default grace period for card/eye dropouts while measuring, in milliseconds
pub const DEFAULT_GRACE_PERIOD_MS: f64 = 500.0;

/// Confidence scale factor applied when a sample was rejected as an outlier
pub const DEFAULT_OUTLIER_CONFIDENCE_SCALE: f32 = 0.5;

/// Confidence scale factor applied when the smoothed IPD is implausible
pub const DEFAULT_IMPLAUSIBLE_CONFIDENCE_SCALE: f32 = 0.8;

/// Minimum card edge length in pixels before corners count as degenerate
pub const MIN_CARD_EDGE_PX: f64 = 1.0;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
