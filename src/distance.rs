//! Pixel-to-millimeter distance conversion.
//!
//! Pure conversion functions; plausibility is a separate, explicit check
//! so implausible results can be surfaced with a warning instead of being
//! silently dropped.

use crate::detection::EyePosition;
use crate::geometry;
use crate::{Error, Result};

/// Pixel distance between the two eye centers
#[must_use]
pub fn pixel_eye_distance(eyes: &EyePosition) -> f64 {
    geometry::pixel_distance(eyes.left, eyes.right)
}

/// Convert an eye pixel distance to millimeters using the card as scale
///
/// `ipd = (eye_px / card_px_width) * card_real_width_mm`
///
/// # Errors
///
/// Returns `Error::InvalidInput` when any input is non-finite and
/// `Error::DivisionByZero` when `card_px_width <= 0`.
pub fn compute_ipd(eye_px: f64, card_px_width: f64, card_real_width_mm: f64) -> Result<f64> {
    if !eye_px.is_finite() || !card_px_width.is_finite() || !card_real_width_mm.is_finite() {
        return Err(Error::InvalidInput(format!(
            "non-finite distance inputs: eye_px={eye_px}, card_px={card_px_width}, real_mm={card_real_width_mm}"
        )));
    }
    if card_px_width <= 0.0 {
        return Err(Error::DivisionByZero(format!(
            "card pixel width {card_px_width} must be positive"
        )));
    }
    Ok((eye_px / card_px_width) * card_real_width_mm)
}

/// Whether an IPD falls within the clinically plausible adult band
#[must_use]
pub fn is_plausible(ipd_mm: f64, min_mm: f64, max_mm: f64) -> bool {
    ipd_mm.is_finite() && ipd_mm >= min_mm && ipd_mm <= max_mm
}
