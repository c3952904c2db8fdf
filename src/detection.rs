//! Input data model for per-frame detections.
//!
//! These types are produced by external collaborators (the face/eye
//! detector and the card detector) once per processed frame. The pipeline
//! consumes them read-only; it places no constraint on how they were
//! computed, only on their shape and numeric ranges.

use crate::geometry::Point;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Face detection result
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FaceDetection {
    /// Bounding box of the detected face
    pub bbox: BoundingBox,
    /// Confidence score of the detection, in [0, 1]
    pub confidence: f32,
}

/// Detected eye-center pair
///
/// `left.x < right.x` must hold in a correctly oriented, non-mirrored
/// frame; a violation is rejected as malformed input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EyePosition {
    pub left: Point,
    pub right: Point,
    /// Confidence score of the detection, in [0, 1]
    pub confidence: f32,
}

/// Reference-card detection result
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CardDetection {
    /// Corner quad, ordered clockwise from top-left
    pub corners: [Point; 4],
    /// Perspective-corrected pixel width
    pub width: f64,
    /// Perspective-corrected pixel height
    pub height: f64,
    /// In-plane tilt in degrees
    pub angle_deg: f64,
    /// Confidence score of the detection, in [0, 1]
    pub confidence: f32,
}

/// One frame's worth of detections, supplied by the frame-processing actor
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DetectionBundle {
    /// Frame timestamp in milliseconds, monotonic within a session
    pub timestamp_ms: f64,
    pub face: Option<FaceDetection>,
    pub eyes: Option<EyePosition>,
    pub card: Option<CardDetection>,
}

fn check_confidence(confidence: f32, what: &str) -> Result<()> {
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(Error::InvalidInput(format!(
            "{what} confidence {confidence} outside [0, 1]"
        )));
    }
    Ok(())
}

impl FaceDetection {
    /// Check shape and numeric-range constraints
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` on non-finite coordinates, negative
    /// dimensions or an out-of-range confidence.
    pub fn validate(&self) -> Result<()> {
        let b = &self.bbox;
        if !(b.x.is_finite() && b.y.is_finite() && b.width.is_finite() && b.height.is_finite()) {
            return Err(Error::InvalidInput(
                "face bounding box has non-finite values".to_string(),
            ));
        }
        if b.width < 0.0 || b.height < 0.0 {
            return Err(Error::InvalidInput(format!(
                "face bounding box has negative dimensions {}x{}",
                b.width, b.height
            )));
        }
        check_confidence(self.confidence, "face")
    }
}

impl EyePosition {
    /// Check shape and numeric-range constraints, including eye ordering
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` on non-finite coordinates, an
    /// out-of-range confidence, or when `left.x >= right.x`.
    pub fn validate(&self) -> Result<()> {
        if !self.left.is_finite() || !self.right.is_finite() {
            return Err(Error::InvalidInput(
                "eye positions have non-finite coordinates".to_string(),
            ));
        }
        if self.left.x >= self.right.x {
            return Err(Error::InvalidInput(format!(
                "eyes out of order: left.x {} >= right.x {}",
                self.left.x, self.right.x
            )));
        }
        check_confidence(self.confidence, "eye")
    }
}

impl CardDetection {
    /// Check shape and numeric-range constraints
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` on non-finite corners, dimensions or
    /// angle, negative dimensions, or an out-of-range confidence.
    pub fn validate(&self) -> Result<()> {
        for (i, corner) in self.corners.iter().enumerate() {
            if !corner.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "card corner {i} has non-finite coordinates"
                )));
            }
        }
        if !(self.width.is_finite() && self.height.is_finite() && self.angle_deg.is_finite()) {
            return Err(Error::InvalidInput(
                "card dimensions or angle are non-finite".to_string(),
            ));
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(Error::InvalidInput(format!(
                "card has negative dimensions {}x{}",
                self.width, self.height
            )));
        }
        check_confidence(self.confidence, "card")
    }
}

impl DetectionBundle {
    /// Validate every detection present in the bundle
    ///
    /// Absence of a detection is normal operating data and passes
    /// validation; only malformed values fail.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        if !self.timestamp_ms.is_finite() {
            return Err(Error::InvalidInput(format!(
                "bundle timestamp {} is not finite",
                self.timestamp_ms
            )));
        }
        if let Some(face) = &self.face {
            face.validate()?;
        }
        if let Some(eyes) = &self.eyes {
            eyes.validate()?;
        }
        if let Some(card) = &self.card {
            card.validate()?;
        }
        Ok(())
    }
}
