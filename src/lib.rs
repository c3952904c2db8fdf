//! Interpupillary distance (IPD) measurement library.
//!
//! This library turns per-frame detections (a face region, two eye-center
//! points, optionally a reference-card outline) into a stable, physically
//! meaningful IPD in millimeters, while guiding the user through a
//! multi-step acquisition workflow:
//!
//! 1. Card geometric validation and tilt-corrected pixel width
//! 2. Pixel-to-millimeter conversion using the ID-1 card as a known scale
//! 3. Temporal smoothing with z-score outlier rejection
//! 4. A finite state machine that sequences acquisition and decides when
//!    a measurement is trustworthy
//!
//! Detections are supplied by external collaborators (camera, face/eye
//! detector, card detector); the pipeline never touches pixel buffers and
//! performs no I/O of its own.
//!
//! # Examples
//!
//! ## Driving the pipeline
//!
//! ```
//! use ipd_measurement::config::Config;
//! use ipd_measurement::controller::{MeasurementController, MeasurementState};
//! use ipd_measurement::detection::{BoundingBox, DetectionBundle, FaceDetection};
//!
//! let mut controller = MeasurementController::new(Config::default());
//! controller.initialize();
//! assert_eq!(controller.state(), MeasurementState::WaitingForFace);
//!
//! // One frame from the detector: a face, no eyes or card yet
//! let bundle = DetectionBundle {
//!     timestamp_ms: 0.0,
//!     face: Some(FaceDetection {
//!         bbox: BoundingBox { x: 100.0, y: 80.0, width: 220.0, height: 220.0 },
//!         confidence: 0.9,
//!     }),
//!     eyes: None,
//!     card: None,
//! };
//! controller.process_frame(&bundle).unwrap();
//! assert_eq!(controller.state(), MeasurementState::FaceDetected);
//! println!("{}", controller.guidance());
//! ```
//!
//! ## Smoothing a noisy stream
//!
//! ```
//! use ipd_measurement::smoothing::DataSmoother;
//!
//! let mut smoother = DataSmoother::new(5, 3.0);
//! for (i, value) in [63.0, 63.4, 62.8, 63.1, 63.2].iter().enumerate() {
//!     smoother.add_value(*value, i as f64 * 33.0);
//! }
//!
//! // A detection glitch is rejected without corrupting the trend
//! assert!(smoother.add_value(120.0, 166.0));
//! assert!((smoother.smoothed_value() - 63.1).abs() < 0.1);
//! ```

/// Reference card geometric validation and perspective correction
pub mod card_validation;

/// Configuration management
pub mod config;

/// Constants used throughout the measurement pipeline
pub mod constants;

/// Measurement lifecycle orchestration (state machine, observers)
pub mod controller;

/// Input data model for per-frame detections
pub mod detection;

/// Pixel-to-millimeter distance conversion
pub mod distance;

/// Error types and result handling
pub mod error;

/// Geometric primitives and pure math helpers
pub mod geometry;

/// Temporal smoothing with outlier rejection
pub mod smoothing;

pub use error::{Error, Result};
