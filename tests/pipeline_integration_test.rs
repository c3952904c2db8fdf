//! Integration tests for the measurement pipeline state machine


use ipd_measurement::config::Config;
use ipd_measurement::controller::{
    MeasurementController, MeasurementObserver, MeasurementResult, MeasurementState,
};
use ipd_measurement::detection::DetectionBundle;
use std::cell::RefCell;
use std::rc::Rc;
use test_helpers::{empty_bundle, eyes_spanning, face, full_bundle, FRAME_MS};

fn ready_controller() -> MeasurementController {
    let mut controller = MeasurementController::new(Config::default());
    controller.initialize();
    controller
}

/// Drive the controller from `WaitingForFace` into `Measuring` using
/// three full bundles (one transition per frame). Returns the next frame
/// index to use.
fn advance_to_measuring(controller: &mut MeasurementController) -> usize {
    for frame in 0..3 {
        controller
            .process_frame(&full_bundle(frame, 90.0, 120.0))
            .unwrap();
    }
    assert_eq!(controller.state(), MeasurementState::Measuring);
    3
}

#[test]
fn test_full_acquisition_to_completion() {
    let mut controller = ready_controller();
    let mut frame = advance_to_measuring(&mut controller);

    let window = Config::default().smoothing.window_size;
    for _ in 0..window {
        controller
            .process_frame(&full_bundle(frame, 90.0, 120.0))
            .unwrap();
        frame += 1;
    }

    assert_eq!(controller.state(), MeasurementState::MeasurementComplete);
    let result = controller.latest_result().expect("result must exist");
    // 90 px eyes against a 120 px card: 90 / 120 * 85.60 = 64.2 mm
    assert!((result.ipd_mm - 64.2).abs() < 1e-9);
    assert!((result.confidence - 0.9).abs() < 1e-6);

    // Further frames do not leave the completed state
    controller
        .process_frame(&empty_bundle(frame))
        .unwrap();
    assert_eq!(controller.state(), MeasurementState::MeasurementComplete);
}

#[test]
fn test_face_loss_regresses_immediately() {
    // Face lock, then a run of empty frames: the regression happens on
    // the very first frame without a face
    let mut controller = ready_controller();
    controller
        .process_frame(&DetectionBundle {
            timestamp_ms: 0.0,
            face: Some(face(0.9)),
            eyes: None,
            card: None,
        })
        .unwrap();
    assert_eq!(controller.state(), MeasurementState::FaceDetected);

    for frame in 1..6 {
        controller.process_frame(&empty_bundle(frame)).unwrap();
        assert_eq!(controller.state(), MeasurementState::WaitingForFace);
    }
}

#[test]
fn test_card_dropout_within_grace_keeps_measuring() {
    let mut controller = ready_controller();
    let frame = advance_to_measuring(&mut controller);

    // A few frames without the card, well inside the 500 ms grace period
    for i in 0..3 {
        let bundle = DetectionBundle {
            timestamp_ms: (frame + i) as f64 * FRAME_MS,
            face: Some(face(0.9)),
            eyes: Some(eyes_spanning(90.0, 0.9)),
            card: None,
        };
        controller.process_frame(&bundle).unwrap();
        assert_eq!(controller.state(), MeasurementState::Measuring);
    }
}

#[test]
fn test_card_lost_beyond_grace_regresses_to_waiting_for_card() {
    let mut controller = ready_controller();
    advance_to_measuring(&mut controller);

    // Face and eyes still tracked, card gone for longer than the grace
    let grace = Config::default().measurement.grace_period_ms;
    let late = DetectionBundle {
        timestamp_ms: 2.0 * FRAME_MS + grace + 1.0,
        face: Some(face(0.9)),
        eyes: Some(eyes_spanning(90.0, 0.9)),
        card: None,
    };
    controller.process_frame(&late).unwrap();
    assert_eq!(controller.state(), MeasurementState::WaitingForCard);
}

#[test]
fn test_everything_lost_beyond_grace_regresses_to_waiting_for_face() {
    let mut controller = ready_controller();
    advance_to_measuring(&mut controller);

    let grace = Config::default().measurement.grace_period_ms;
    let late = DetectionBundle {
        timestamp_ms: 2.0 * FRAME_MS + grace + 1.0,
        face: None,
        eyes: None,
        card: None,
    };
    controller.process_frame(&late).unwrap();
    assert_eq!(controller.state(), MeasurementState::WaitingForFace);
}

#[test]
fn test_outlier_sample_scales_confidence_and_is_excluded() {
    let mut controller = ready_controller();
    let mut frame = advance_to_measuring(&mut controller);

    // Jittery but consistent eye spans build the window
    for span in [90.0, 90.4, 89.8, 90.2] {
        controller
            .process_frame(&full_bundle(frame, span, 120.0))
            .unwrap();
        frame += 1;
    }
    assert_eq!(controller.state(), MeasurementState::Measuring);

    // A wild detection glitch: flagged, excluded, confidence scaled down
    controller
        .process_frame(&full_bundle(frame, 150.0, 120.0))
        .unwrap();
    frame += 1;
    assert_eq!(controller.state(), MeasurementState::Measuring);
    let flagged = controller.latest_result().unwrap();
    let scale = Config::default().measurement.outlier_confidence_scale;
    assert!((flagged.confidence - 0.9 * scale).abs() < 1e-6);

    // A good frame completes the window
    controller
        .process_frame(&full_bundle(frame, 90.0, 120.0))
        .unwrap();
    assert_eq!(controller.state(), MeasurementState::MeasurementComplete);
    let result = controller.latest_result().unwrap();
    assert!((result.ipd_mm - 64.2).abs() < 0.5);
    assert!((result.confidence - 0.9).abs() < 1e-6);
}

#[test]
fn test_implausible_value_flagged_not_completed() {
    let mut controller = ready_controller();
    let mut frame = advance_to_measuring(&mut controller);

    // 200 px eyes against a 120 px card: 142.7 mm, far outside [40, 85]
    let window = Config::default().smoothing.window_size;
    for _ in 0..(window + 2) {
        controller
            .process_frame(&full_bundle(frame, 200.0, 120.0))
            .unwrap();
        frame += 1;
    }

    // Result is surfaced with reduced confidence, but never trusted
    assert_eq!(controller.state(), MeasurementState::Measuring);
    let result = controller.latest_result().unwrap();
    assert!(result.ipd_mm > 100.0);
    let scale = Config::default().measurement.implausible_confidence_scale;
    assert!((result.confidence - 0.9 * scale).abs() < 1e-6);
}

#[test]
fn test_restart_clears_result_and_returns_to_waiting_for_face() {
    let mut controller = ready_controller();
    let mut frame = advance_to_measuring(&mut controller);
    for _ in 0..Config::default().smoothing.window_size {
        controller
            .process_frame(&full_bundle(frame, 90.0, 120.0))
            .unwrap();
        frame += 1;
    }
    assert_eq!(controller.state(), MeasurementState::MeasurementComplete);

    controller.start_measurement().unwrap();
    assert_eq!(controller.state(), MeasurementState::WaitingForFace);
    assert!(controller.latest_result().is_none());

    // A fresh session completes again from scratch
    for i in 0..(3 + Config::default().smoothing.window_size) {
        controller
            .process_frame(&full_bundle(frame + i, 92.0, 120.0))
            .unwrap();
    }
    assert_eq!(controller.state(), MeasurementState::MeasurementComplete);
}

#[test]
fn test_stop_keeps_latest_result() {
    let mut controller = ready_controller();
    let mut frame = advance_to_measuring(&mut controller);
    for _ in 0..Config::default().smoothing.window_size {
        controller
            .process_frame(&full_bundle(frame, 90.0, 120.0))
            .unwrap();
        frame += 1;
    }
    let result = controller.latest_result().unwrap();

    controller.stop_measurement();
    assert_eq!(controller.state(), MeasurementState::Initializing);
    let kept = controller.latest_result().unwrap();
    assert!((kept.ipd_mm - result.ipd_mm).abs() < 1e-12);

    // And the controller can go again
    controller.initialize();
    controller.start_measurement().unwrap();
    assert_eq!(controller.state(), MeasurementState::WaitingForFace);
}

/// Records every notification in arrival order
struct RecordingObserver {
    events: Rc<RefCell<Vec<String>>>,
}

impl MeasurementObserver for RecordingObserver {
    fn on_state_changed(&mut self, old: MeasurementState, new: MeasurementState) {
        self.events.borrow_mut().push(format!("state:{old}->{new}"));
    }

    fn on_result(&mut self, result: &MeasurementResult) {
        self.events
            .borrow_mut()
            .push(format!("result:{:.1}", result.ipd_mm));
    }

    fn on_error(&mut self, error: &ipd_measurement::Error) {
        self.events.borrow_mut().push(format!("error:{error}"));
    }
}

#[test]
fn test_observer_notifications_follow_event_order() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut controller = MeasurementController::new(Config::default());
    controller.add_observer(Box::new(RecordingObserver {
        events: Rc::clone(&events),
    }));
    controller.initialize();

    let mut frame = 0;
    for _ in 0..3 {
        controller
            .process_frame(&full_bundle(frame, 90.0, 120.0))
            .unwrap();
        frame += 1;
    }
    for _ in 0..Config::default().smoothing.window_size {
        controller
            .process_frame(&full_bundle(frame, 90.0, 120.0))
            .unwrap();
        frame += 1;
    }

    let recorded = events.borrow();
    let expected_prefix = [
        "state:INITIALIZING->WAITING_FOR_FACE",
        "state:WAITING_FOR_FACE->FACE_DETECTED",
        "state:FACE_DETECTED->WAITING_FOR_CARD",
        "state:WAITING_FOR_CARD->MEASURING",
    ];
    assert_eq!(&recorded[..4], &expected_prefix);

    // The completing frame reports its result before the state change
    let last_two = &recorded[recorded.len() - 2..];
    assert_eq!(last_two[0], "result:64.2");
    assert_eq!(last_two[1], "state:MEASURING->MEASUREMENT_COMPLETE");
}

#[test]
fn test_malformed_frame_reported_and_skipped() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut controller = MeasurementController::new(Config::default());
    controller.add_observer(Box::new(RecordingObserver {
        events: Rc::clone(&events),
    }));
    controller.initialize();
    advance_to_measuring(&mut controller);

    let mut bad = full_bundle(3, 90.0, 120.0);
    if let Some(eyes) = bad.eyes.as_mut() {
        eyes.left.x = f64::NAN;
    }
    assert!(controller.process_frame(&bad).is_err());

    // Error surfaced to observers, state and smoother untouched
    assert!(events.borrow().iter().any(|e| e.starts_with("error:")));
    assert_eq!(controller.state(), MeasurementState::Measuring);

    // Pipeline continues normally afterwards
    let mut frame = 4;
    for _ in 0..Config::default().smoothing.window_size {
        controller
            .process_frame(&full_bundle(frame, 90.0, 120.0))
            .unwrap();
        frame += 1;
    }
    assert_eq!(controller.state(), MeasurementState::MeasurementComplete);
}

#[test]
fn test_debug_info_tracks_last_frame() {
    let mut controller = ready_controller();
    let frame = advance_to_measuring(&mut controller);
    controller
        .process_frame(&full_bundle(frame, 90.0, 120.0))
        .unwrap();

    let info = controller.debug_info();
    assert!(info.face_detected);
    assert!(info.eye_detected);
    assert!(info.card_detected);
    assert!((info.pixel_distance - 90.0).abs() < 1e-9);
    assert!((info.card_pixel_width - 120.0).abs() < 1e-9);
    assert_eq!(info.state, Some(MeasurementState::Measuring));

    controller.process_frame(&empty_bundle(frame + 1)).unwrap();
    let info = controller.debug_info();
    assert!(!info.face_detected);
    assert!(!info.eye_detected);
    assert!(!info.card_detected);
}
