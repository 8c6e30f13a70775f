//! Gait engine: the single entry point tying all stages together.
//!
//! Data flows strictly downstream:
//! 1. **Smoothing** (optional): EMA + outlier rejection on raw keypoints
//! 2. **History**: confidence-gated, bounded frame buffer
//! 3. **Event detection**: heel-strike / toe-off per foot
//! 4. **Phase tracking**: derived on demand from events and time
//! 5. **Parameters**: windowed metrics, computed fresh per query
//!
//! The engine is synchronous and driven entirely by its caller: one
//! [`GaitEngine::add_pose`] per video frame, and
//! [`GaitEngine::calculate_gait_parameters`] at whatever rate the consumer
//! wants. Queries take `&self` and never change state.
//!
//! "Now" is the engine clock: the newest timestamp passed to `add_pose`. All
//! windowed queries are relative to it, so results are reproducible.

use tracing::{info, trace};

use crate::calibration::Calibrator;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::event_detection::{EventLog, GaitEventDetector};
use crate::history::PoseHistory;
use crate::parameters::{CadenceStatistics, ParameterCalculator};
use crate::phase_tracking;
use crate::smoothing::KeypointSmoother;
use crate::types::{CalibrationData, GaitEvent, GaitParameters, GaitPhase, NamedKeypoint, Pose, PoseFrame};

/// Default window for [`GaitEngine::recent_events`] (ms).
pub const DEFAULT_EVENT_WINDOW_MS: u64 = 5_000;

/// Default window for [`GaitEngine::pose_history`] (ms).
pub const DEFAULT_HISTORY_WINDOW_MS: u64 = 3_000;

/// Gait event detection and parameter calculation engine.
///
/// Owns its history buffer, event log, cadence statistics and calibration.
/// There is no shared or global state; create one engine per tracked person.
pub struct GaitEngine {
    config: EngineConfig,

    // Processing stages
    calibrator: Calibrator,
    detector: GaitEventDetector,
    calculator: ParameterCalculator,
    smoother: Option<KeypointSmoother>,

    // Stateful collections, replaced wholesale by `reset`
    history: PoseHistory,
    events: EventLog,
    cadence: CadenceStatistics,

    clock_ms: u64,
}

impl GaitEngine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            calibrator: Calibrator::new(config.calibration.clone()),
            detector: GaitEventDetector::new(config.detector.clone()),
            calculator: ParameterCalculator::new(config.parameters.clone()),
            smoother: config.smoothing.clone().map(KeypointSmoother::new),
            history: PoseHistory::new(&config.history),
            events: EventLog::new(),
            cadence: CadenceStatistics::new(config.parameters.cadence_smoothing_window),
            clock_ms: 0,
            config,
        }
    }

    /// Validates the configuration before building the engine.
    pub fn try_new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Ingest one pose sample.
    ///
    /// Frames that fail validation (low ankle confidence, non-finite
    /// coordinates, out-of-order timestamp) are dropped silently. Returns the
    /// gait events this frame triggered, usually none.
    pub fn add_pose(&mut self, pose: &Pose, timestamp_ms: u64) -> Vec<GaitEvent> {
        self.clock_ms = self.clock_ms.max(timestamp_ms);

        // Raw input must pass admission before it may move the smoother.
        let admission = self.history.admission(&PoseFrame::new(timestamp_ms, *pose));
        if !admission.is_accepted() {
            trace!(timestamp_ms, ?admission, "pose dropped before smoothing");
            return Vec::new();
        }

        let pose = match self.smoother.as_mut() {
            Some(smoother) => smoother.apply(pose),
            None => *pose,
        };

        // A smoothed outlier can still lose its ankle confidence here.
        if !self.history.append(PoseFrame::new(timestamp_ms, pose)).is_accepted() {
            return Vec::new();
        }

        let detected = self.detector.detect(&self.history, &self.events);
        for event in &detected {
            self.events.push(*event);
        }
        self.events
            .prune(self.clock_ms, self.config.detector.retention_ms);

        if detected.iter().any(GaitEvent::is_heel_strike) {
            if let Some(cadence) = self.calculator.raw_cadence(&self.events) {
                self.cadence.record(cadence);
            }
        }

        detected
    }

    /// Ingest a pose in the estimator's `{name, x, y, score}` format.
    pub fn add_named_keypoints(&mut self, keypoints: &[NamedKeypoint], timestamp_ms: u64) -> Vec<GaitEvent> {
        let pose = Pose::from_named(keypoints);
        self.add_pose(&pose, timestamp_ms)
    }

    /// Replace the calibration. Fails only for non-positive scales.
    pub fn calibrate(&mut self, data: CalibrationData) -> Result<()> {
        self.calibrator.calibrate(data)
    }

    /// Estimate calibration from body proportions in `pose` and apply it.
    pub fn auto_calibrate(&mut self, pose: &Pose) -> Option<CalibrationData> {
        self.calibrator.auto_calibrate(pose)
    }

    /// Current parameter snapshot. Always fully populated.
    pub fn calculate_gait_parameters(&self) -> GaitParameters {
        self.calculator.calculate(
            &self.history,
            &self.events,
            self.calibrator.calibration(),
            &self.cadence,
            self.clock_ms,
        )
    }

    /// Events newer than `window_ms` before the engine clock.
    pub fn recent_events(&self, window_ms: u64) -> Vec<GaitEvent> {
        self.events.recent(self.clock_ms, window_ms)
    }

    /// Buffered frames newer than `window_ms` before the engine clock.
    pub fn pose_history(&self, window_ms: u64) -> Vec<PoseFrame> {
        self.history.recent(self.clock_ms, window_ms)
    }

    /// Phase of both feet at the engine clock.
    pub fn gait_phase(&self) -> GaitPhase {
        self.gait_phase_at(self.clock_ms)
    }

    /// Phase of both feet at an arbitrary time.
    pub fn gait_phase_at(&self, now_ms: u64) -> GaitPhase {
        phase_tracking::gait_phase(&self.events, now_ms, &self.config.phase)
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_calibrated()
    }

    pub fn calibration(&self) -> Option<&CalibrationData> {
        self.calibrator.calibration()
    }

    /// Clear history, events and statistics. Calibration is kept.
    pub fn reset(&mut self) {
        self.history = PoseHistory::new(&self.config.history);
        self.events = EventLog::new();
        self.cadence = CadenceStatistics::new(self.config.parameters.cadence_smoothing_window);
        if let Some(smoother) = self.smoother.as_mut() {
            smoother.reset();
        }
        self.clock_ms = 0;
        info!("gait engine reset");
    }

    /// Newest timestamp seen by `add_pose`.
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn frame_count(&self) -> usize {
        self.history.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for GaitEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
