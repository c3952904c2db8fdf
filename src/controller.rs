//! Measurement lifecycle orchestration.
//!
//! The controller consumes one detection bundle per processed frame,
//! drives the validator, distance conversion and smoother, and exposes
//! the measurement lifecycle to the presentation layer as a state
//! machine plus observer notifications.

use crate::card_validation::{CardValidator, ValidationReason};
use crate::config::Config;
use crate::detection::DetectionBundle;
use crate::distance;
use crate::smoothing::DataSmoother;
use crate::{Error, Result};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;

/// Measurement acquisition states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MeasurementState {
    /// Waiting for collaborators to become ready
    Initializing,
    /// No face with sufficient confidence in view
    WaitingForFace,
    /// Face locked, waiting for a usable eye pair
    FaceDetected,
    /// Face and eyes locked, waiting for a valid reference card
    WaitingForCard,
    /// Accumulating samples into the smoother
    Measuring,
    /// A trustworthy smoothed measurement is available
    MeasurementComplete,
    /// A collaborator failed; explicit re-initialization required
    Error,
}

impl MeasurementState {
    /// String form of the state, for UIs and logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "INITIALIZING",
            Self::WaitingForFace => "WAITING_FOR_FACE",
            Self::FaceDetected => "FACE_DETECTED",
            Self::WaitingForCard => "WAITING_FOR_CARD",
            Self::Measuring => "MEASURING",
            Self::MeasurementComplete => "MEASUREMENT_COMPLETE",
            Self::Error => "ERROR",
        }
    }

    /// User guidance for this state
    #[must_use]
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::Initializing => "Starting up",
            Self::WaitingForFace => "Face the camera",
            Self::FaceDetected => "Look straight ahead",
            Self::WaitingForCard => "Hold the reference card against your forehead",
            Self::Measuring => "Hold still, measuring",
            Self::MeasurementComplete => "Measurement complete",
            Self::Error => "Something went wrong, restart the measurement",
        }
    }
}

impl fmt::Display for MeasurementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The externally visible, smoothed measurement output
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MeasurementResult {
    /// Smoothed interpupillary distance in millimeters
    pub ipd_mm: f64,
    /// Aggregate confidence in [0, 1]
    pub confidence: f32,
    /// Timestamp of the frame that produced this result
    pub timestamp_ms: f64,
}

/// Diagnostic snapshot for overlay rendering; informational only
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugInfo {
    pub face_detected: bool,
    pub eye_detected: bool,
    pub card_detected: bool,
    /// Last computed eye pixel distance
    pub pixel_distance: f64,
    /// Last computed corrected card pixel width
    pub card_pixel_width: f64,
    pub state: Option<MeasurementState>,
}

/// Fire-and-forget observer of the measurement lifecycle
///
/// All hooks have empty default implementations; implement only the ones
/// of interest. Notifications arrive in the order the underlying events
/// occurred within a single frame-processing step.
pub trait MeasurementObserver {
    /// Called after every state transition
    fn on_state_changed(&mut self, _old: MeasurementState, _new: MeasurementState) {}

    /// Called whenever the latest result is updated
    fn on_result(&mut self, _result: &MeasurementResult) {}

    /// Called when an error is reported through the error channel
    fn on_error(&mut self, _error: &Error) {}
}

/// Timestamps of the most recent usable sightings, for grace-period checks
#[derive(Debug, Clone, Copy, Default)]
struct SightingTimes {
    face_ms: Option<f64>,
    eyes_ms: Option<f64>,
    card_ms: Option<f64>,
}

/// The measurement state machine
///
/// Owns the smoother and the current state; receives (but does not own)
/// the per-frame detections. All methods take `&mut self` and must be
/// called from a single logical frame-processing actor.
pub struct MeasurementController {
    config: Config,
    validator: CardValidator,
    smoother: DataSmoother,
    state: MeasurementState,
    latest_result: Option<MeasurementResult>,
    last_card_reason: ValidationReason,
    sightings: SightingTimes,
    debug_info: DebugInfo,
    observers: Vec<Box<dyn MeasurementObserver>>,
}

impl MeasurementController {
    /// Create a controller in the `Initializing` state
    #[must_use]
    pub fn new(config: Config) -> Self {
        let validator = CardValidator::new(&config);
        let smoother = DataSmoother::new(
            config.smoothing.window_size,
            config.smoothing.outlier_std_dev_threshold,
        );
        Self {
            config,
            validator,
            smoother,
            state: MeasurementState::Initializing,
            latest_result: None,
            last_card_reason: ValidationReason::Ok,
            sightings: SightingTimes::default(),
            debug_info: DebugInfo::default(),
            observers: Vec::new(),
        }
    }

    /// Register an observer; notifications fire in registration order
    pub fn add_observer(&mut self, observer: Box<dyn MeasurementObserver>) {
        self.observers.push(observer);
    }

    /// Mark the external collaborators ready and enter `WaitingForFace`
    ///
    /// Also the only recovery path out of the `Error` state.
    pub fn initialize(&mut self) {
        info!("measurement controller initialized");
        self.smoother.reset();
        self.sightings = SightingTimes::default();
        self.set_state(MeasurementState::WaitingForFace);
    }

    /// Begin a fresh measurement session
    ///
    /// Clears the smoother and the latest result and re-enters
    /// `WaitingForFace`. This is the explicit user-triggered restart out
    /// of `MeasurementComplete`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` when called before `initialize()` or
    /// while in the `Error` state.
    pub fn start_measurement(&mut self) -> Result<()> {
        match self.state {
            MeasurementState::Initializing => {
                return Err(Error::InvalidState(
                    "start_measurement() before initialize()".to_string(),
                ))
            }
            MeasurementState::Error => {
                return Err(Error::InvalidState(
                    "start_measurement() in error state; initialize() first".to_string(),
                ))
            }
            _ => {}
        }
        info!("starting measurement session");
        self.latest_result = None;
        self.sightings = SightingTimes::default();
        self.set_state(MeasurementState::WaitingForFace);
        Ok(())
    }

    /// Stop the current session and return to `Initializing`
    ///
    /// Safe to call from the frame-processing actor at any time; the
    /// latest result survives until a new session supersedes it.
    pub fn stop_measurement(&mut self) {
        info!("stopping measurement session");
        self.smoother.reset();
        self.sightings = SightingTimes::default();
        self.set_state(MeasurementState::Initializing);
    }

    /// Report a failure of an external collaborator
    ///
    /// Forces the `Error` state; recovery requires `initialize()`.
    pub fn report_collaborator_fault(&mut self, message: &str) {
        let error = Error::CollaboratorFault(message.to_string());
        log::error!("{error}");
        self.notify_error(&error);
        self.set_state(MeasurementState::Error);
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> MeasurementState {
        self.state
    }

    /// Most recent measurement result, if any
    #[must_use]
    pub fn latest_result(&self) -> Option<MeasurementResult> {
        self.latest_result
    }

    /// Diagnostic snapshot of the last processed frame
    #[must_use]
    pub fn debug_info(&self) -> DebugInfo {
        self.debug_info
    }

    /// User guidance for the current situation
    ///
    /// While waiting for the card, a failing validation refines the
    /// message (e.g. tilt vs. lighting); every state has guidance.
    #[must_use]
    pub fn guidance(&self) -> &'static str {
        if self.state == MeasurementState::WaitingForCard
            && self.last_card_reason != ValidationReason::Ok
        {
            return self.last_card_reason.guidance();
        }
        self.state.guidance()
    }

    /// Process one frame's detection bundle
    ///
    /// Transition rules are evaluated once per call. Absent detections
    /// are normal operating data; only malformed input produces an
    /// error, which is also reported to the error observers. A malformed
    /// frame is skipped entirely and never reaches the smoother.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for malformed bundles (non-finite
    /// coordinates, negative dimensions, out-of-order eyes).
    pub fn process_frame(&mut self, bundle: &DetectionBundle) -> Result<()> {
        if let Err(error) = bundle.validate() {
            warn!("skipping malformed frame at {} ms: {error}", bundle.timestamp_ms);
            self.notify_error(&error);
            return Err(error);
        }

        self.update_debug_info(bundle);

        match self.state {
            MeasurementState::Initializing
            | MeasurementState::Error
            | MeasurementState::MeasurementComplete => {}
            MeasurementState::WaitingForFace => {
                if self.face_usable(bundle) {
                    self.set_state(MeasurementState::FaceDetected);
                }
            }
            MeasurementState::FaceDetected => {
                if bundle.face.is_none() {
                    self.set_state(MeasurementState::WaitingForFace);
                } else if self.eyes_usable(bundle) {
                    self.set_state(MeasurementState::WaitingForCard);
                }
            }
            MeasurementState::WaitingForCard => {
                if bundle.face.is_none() {
                    self.set_state(MeasurementState::WaitingForFace);
                } else if self.card_usable(bundle) {
                    let t = bundle.timestamp_ms;
                    self.sightings = SightingTimes {
                        face_ms: Some(t),
                        eyes_ms: Some(t),
                        card_ms: Some(t),
                    };
                    self.set_state(MeasurementState::Measuring);
                }
            }
            MeasurementState::Measuring => self.measuring_step(bundle),
        }

        Ok(())
    }

    fn face_usable(&self, bundle: &DetectionBundle) -> bool {
        bundle
            .face
            .map(|face| face.confidence >= self.config.detection.face_confidence_threshold)
            .unwrap_or(false)
    }

    fn eyes_usable(&self, bundle: &DetectionBundle) -> bool {
        bundle
            .eyes
            .map(|eyes| eyes.confidence >= self.config.detection.eye_confidence_threshold)
            .unwrap_or(false)
    }

    /// Validates the card when present, remembering the reason for guidance
    fn card_usable(&mut self, bundle: &DetectionBundle) -> bool {
        match &bundle.card {
            Some(card) => {
                let result = self.validator.validate(card);
                self.last_card_reason = result.reason;
                result.is_valid
            }
            None => false,
        }
    }

    fn measuring_step(&mut self, bundle: &DetectionBundle) {
        let t = bundle.timestamp_ms;

        let face_ok = self.face_usable(bundle);
        let eyes_ok = self.eyes_usable(bundle);
        let card_ok = self.card_usable(bundle);
        if face_ok {
            self.sightings.face_ms = Some(t);
        }
        if eyes_ok {
            self.sightings.eyes_ms = Some(t);
        }
        if card_ok {
            self.sightings.card_ms = Some(t);
        }

        if face_ok && eyes_ok && card_ok {
            self.accumulate_sample(bundle);
            return;
        }

        // Tolerate brief dropouts; regress only past the grace period
        let grace = self.config.measurement.grace_period_ms;
        let expired = |seen: Option<f64>| seen.map(|s| t - s > grace).unwrap_or(true);

        if expired(self.sightings.face_ms) {
            debug!("face lost beyond grace period at {t} ms");
            self.set_state(MeasurementState::WaitingForFace);
        } else if expired(self.sightings.eyes_ms) || expired(self.sightings.card_ms) {
            debug!("card or eyes lost beyond grace period at {t} ms");
            self.set_state(MeasurementState::WaitingForCard);
        }
    }

    /// Compute and smooth one sample; all detections are present and valid
    fn accumulate_sample(&mut self, bundle: &DetectionBundle) {
        let (face, eyes, card) = match (&bundle.face, &bundle.eyes, &bundle.card) {
            (Some(face), Some(eyes), Some(card)) => (face, eyes, card),
            _ => return,
        };
        let t = bundle.timestamp_ms;

        let eye_px = distance::pixel_eye_distance(eyes);
        let card_px = CardValidator::corrected_width(card);
        self.debug_info.pixel_distance = eye_px;
        self.debug_info.card_pixel_width = card_px;

        let ipd = match distance::compute_ipd(eye_px, card_px, self.config.card.real_width_mm) {
            Ok(ipd) => ipd,
            Err(error) => {
                warn!("skipping frame at {t} ms: {error}");
                self.notify_error(&error);
                return;
            }
        };

        let was_outlier = self.smoother.add_value(ipd, t);
        let smoothed = self.smoother.smoothed_value();
        let plausible = distance::is_plausible(
            smoothed,
            self.config.measurement.ipd_plausible_min_mm,
            self.config.measurement.ipd_plausible_max_mm,
        );

        // Aggregate confidence: minimum of the sub-confidences, scaled
        // down when the sample was an outlier or the value implausible
        let mut confidence = face.confidence.min(eyes.confidence).min(card.confidence);
        if was_outlier {
            confidence *= self.config.measurement.outlier_confidence_scale;
        }
        if !plausible {
            warn!("smoothed IPD {smoothed:.1} mm outside plausible range");
            confidence *= self.config.measurement.implausible_confidence_scale;
        }

        let result = MeasurementResult {
            ipd_mm: smoothed,
            confidence,
            timestamp_ms: t,
        };
        self.latest_result = Some(result);
        self.notify_result(&result);

        if self.smoother.is_full() && !was_outlier && plausible {
            info!(
                "measurement complete: {smoothed:.1} mm (confidence {confidence:.2}, window span {:.0} ms)",
                self.smoother.window_span_ms()
            );
            self.set_state(MeasurementState::MeasurementComplete);
        }
    }

    fn update_debug_info(&mut self, bundle: &DetectionBundle) {
        self.debug_info.face_detected = bundle.face.is_some();
        self.debug_info.eye_detected = bundle.eyes.is_some();
        self.debug_info.card_detected = bundle.card.is_some();
        self.debug_info.state = Some(self.state);
    }

    fn set_state(&mut self, next: MeasurementState) {
        if next == self.state {
            return;
        }
        let old = self.state;
        self.state = next;
        self.debug_info.state = Some(next);

        // Re-entering the initial acquisition state discards the window
        if next == MeasurementState::WaitingForFace {
            self.smoother.reset();
        }

        debug!("state {old} -> {next}");
        let mut observers = std::mem::take(&mut self.observers);
        for observer in &mut observers {
            observer.on_state_changed(old, next);
        }
        self.observers = observers;
    }

    fn notify_result(&mut self, result: &MeasurementResult) {
        let mut observers = std::mem::take(&mut self.observers);
        for observer in &mut observers {
            observer.on_result(result);
        }
        self.observers = observers;
    }

    fn notify_error(&mut self, error: &Error) {
        let mut observers = std::mem::take(&mut self.observers);
        for observer in &mut observers {
            observer.on_error(error);
        }
        self.observers = observers;
    }
}
