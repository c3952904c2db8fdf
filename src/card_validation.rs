//! Reference-card geometric validation and perspective correction.
//!
//! Decides whether a detected quadrilateral plausibly represents the
//! ID-1 reference card and derives its corrected pixel width for the
//! distance conversion. An invalid card is an expected, recoverable
//! condition and is reported as a value, never as an error.

use crate::config::Config;
use crate::constants::{CARD_ASPECT_RATIO, MIN_CARD_EDGE_PX};
use crate::detection::CardDetection;
use crate::geometry;

/// Why a card candidate was accepted or rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// Candidate passed every check
    Ok,
    /// Detection confidence below the configured threshold
    LowConfidence,
    /// Width/height ratio too far from the ID-1 ratio
    AspectRatioOutOfRange,
    /// In-plane tilt beyond the configured maximum
    TiltTooHigh,
}

impl ValidationReason {
    /// User guidance for this outcome
    #[must_use]
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::Ok => "Card detected, hold still",
            Self::LowConfidence => "Move the card into better light",
            Self::AspectRatioOutOfRange => "Show the full card to the camera",
            Self::TiltTooHigh => "Hold the card flat and parallel to the camera",
        }
    }
}

/// Outcome of validating a card candidate
#[derive(Debug, Clone, Copy)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub reason: ValidationReason,
}

impl ValidationResult {
    fn ok() -> Self {
        Self {
            is_valid: true,
            reason: ValidationReason::Ok,
        }
    }

    fn fail(reason: ValidationReason) -> Self {
        Self {
            is_valid: false,
            reason,
        }
    }
}

/// Stateless card validator holding the configured thresholds
#[derive(Debug, Clone)]
pub struct CardValidator {
    confidence_threshold: f32,
    aspect_ratio_tolerance: f64,
    max_tilt_angle_deg: f64,
}

impl CardValidator {
    /// Create a validator from the session configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            confidence_threshold: config.card.confidence_threshold,
            aspect_ratio_tolerance: config.card.aspect_ratio_tolerance,
            max_tilt_angle_deg: config.card.max_tilt_angle_deg,
        }
    }

    /// Validate a card candidate against confidence, aspect ratio and tilt
    ///
    /// Checks run in a fixed order (confidence, aspect ratio, tilt) and the
    /// first failure wins, so diagnostics are deterministic when multiple
    /// checks fail at once.
    #[must_use]
    pub fn validate(&self, detection: &CardDetection) -> ValidationResult {
        if detection.confidence < self.confidence_threshold {
            return ValidationResult::fail(ValidationReason::LowConfidence);
        }

        match geometry::aspect_ratio(detection.width, detection.height) {
            Ok(ratio) => {
                let deviation = (ratio - CARD_ASPECT_RATIO).abs() / CARD_ASPECT_RATIO;
                if deviation > self.aspect_ratio_tolerance {
                    return ValidationResult::fail(ValidationReason::AspectRatioOutOfRange);
                }
            }
            // Zero height is a degenerate shape, not a card
            Err(_) => return ValidationResult::fail(ValidationReason::AspectRatioOutOfRange),
        }

        if detection.angle_deg.abs() > self.max_tilt_angle_deg {
            return ValidationResult::fail(ValidationReason::TiltTooHigh);
        }

        ValidationResult::ok()
    }

    /// Perspective-corrected planar width of the card in pixels
    ///
    /// Uses the mean of the top and bottom edge lengths of the corner
    /// quad, which is independent of in-plane tilt and so avoids the
    /// tilt-induced bias of a raw bounding width. Falls back to
    /// `detection.width` when the corners are degenerate.
    #[must_use]
    pub fn corrected_width(detection: &CardDetection) -> f64 {
        let corners = &detection.corners;
        if corners.iter().any(|c| !c.is_finite()) {
            return detection.width;
        }

        let top = geometry::edge_length(corners, 0, 1);
        let bottom = geometry::edge_length(corners, 3, 2);
        if top < MIN_CARD_EDGE_PX || bottom < MIN_CARD_EDGE_PX {
            return detection.width;
        }

        (top + bottom) / 2.0
    }
}
