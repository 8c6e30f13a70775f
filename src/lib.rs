//! Gait Sensing Engine Library
//!
//! Turns a stream of 2D human-pose keypoints (one pose per video frame) into
//! discrete gait events, a per-foot gait phase, and windowed gait parameters
//! such as cadence, step length, walking speed and left/right symmetry.
//!
//! # Design Philosophy
//!
//! - **Evidence first**: frames that cannot be trusted (low ankle confidence,
//!   non-finite coordinates, out-of-order timestamps) are dropped at the door
//!   rather than averaged in.
//! - **Plausibility filtering**: every aggregate passes its samples through a
//!   physiological range, so a single mis-detection cannot skew a metric.
//! - **Derived, not stored**: phase and parameters are computed fresh from the
//!   history and event log on every query. Queries never mutate state.
//! - **Bounded memory**: the frame history has a fixed capacity and the event
//!   log is pruned by age.
//!
//! # Example
//!
//! ```
//! use gait_sensing::{CalibrationData, GaitEngine, Keypoint, Landmark, Pose};
//!
//! let mut engine = GaitEngine::default();
//! engine.calibrate(CalibrationData::new(150.0)).unwrap();
//!
//! let pose = Pose::default()
//!     .with(Landmark::LeftAnkle, Keypoint::new(300.0, 400.0, 0.9))
//!     .with(Landmark::RightAnkle, Keypoint::new(330.0, 400.0, 0.9));
//! engine.add_pose(&pose, 0);
//!
//! // Cold start: fewer than 30 frames yields the zeroed snapshot.
//! let params = engine.calculate_gait_parameters();
//! assert_eq!(params.cadence, 0.0);
//! ```

pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod event_detection;
pub mod history;
pub mod parameters;
pub mod phase_tracking;
pub mod smoothing;
pub mod types;



// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::{GaitEngine, DEFAULT_EVENT_WINDOW_MS, DEFAULT_HISTORY_WINDOW_MS};
pub use error::{GaitError, Result};
pub use types::{
    CalibrationData, Foot, FootPhase, GaitEvent, GaitEventType, GaitParameters, GaitPhase, Keypoint,
    Landmark, NamedKeypoint, PhaseLabel, Point2, Pose, PoseFrame,
};
