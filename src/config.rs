//! Engine configuration.
//!
//! Every stage has its own config struct with conservative defaults tuned for
//! ~30 fps webcam input. The whole tree deserializes from TOML, and any field
//! left out of the file keeps its default.
//!
//! ```toml
//! [history]
//! capacity = 600
//!
//! [detector]
//! heel_strike_velocity = 45.0
//!
//! [parameters.step_length_range_m]
//! min = 0.25
//! max = 1.8
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GaitError, Result};

/// Closed interval used by the plausibility filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlausibleRange {
    pub min: f32,
    pub max: f32,
}

impl PlausibleRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn is_ordered(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Pose history buffer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum buffered frames. Oldest frames are evicted first.
    pub capacity: usize,
    /// Both ankles must be strictly above this confidence for a frame to be kept.
    pub min_confidence: f32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 300,       // ~10s at 30fps
            min_confidence: 0.3,
        }
    }
}

/// Anthropometric auto-calibration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Typical adult shoulder width (m).
    pub shoulder_width_m: f32,
    /// Typical adult hip width (m).
    pub hip_width_m: f32,
    /// Typical shoulder-midpoint to hip-midpoint distance (m).
    pub torso_height_m: f32,
    /// Shoulders and hips must reach this confidence for auto-calibration.
    pub min_landmark_confidence: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            shoulder_width_m: 0.45,
            hip_width_m: 0.35,
            torso_height_m: 0.60,
            min_landmark_confidence: 0.6,
        }
    }
}

/// Gait event detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Frames used for the averaged vertical velocity.
    pub window_frames: usize,
    /// Downward ankle velocity above which a heel-strike may fire (px/s).
    pub heel_strike_velocity: f32,
    /// Upward ankle velocity magnitude above which a toe-off fires (px/s).
    pub toe_off_velocity: f32,
    /// Ankle may sit at most this far above the knee line for a heel-strike (px).
    pub ground_margin_px: f32,
    /// Same-foot, same-type events closer than this are suppressed (ms).
    pub min_step_duration_ms: u64,
    /// Events older than this are pruned from the log (ms).
    pub retention_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_frames: 5,
            heel_strike_velocity: 60.0,
            toe_off_velocity: 80.0,
            ground_margin_px: 20.0,
            min_step_duration_ms: 200,
            retention_ms: 30_000,
        }
    }
}

/// Phase tracker timing, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Events older than this no longer define a phase.
    pub lookback_ms: u64,
    /// End of the heel-strike phase after a heel-strike event.
    pub heel_strike_ms: u64,
    /// End of foot-flat; also the progress denominator for foot-flat.
    pub foot_flat_ms: u64,
    /// Duration over which mid-stance progress runs from 0 to 1.
    pub mid_stance_ms: u64,
    /// End of the toe-off phase after a toe-off event.
    pub toe_off_ms: u64,
    /// Duration of mid-swing.
    pub mid_swing_ms: u64,
    /// Duration over which terminal-swing progress runs from 0 to 1.
    pub terminal_swing_ms: u64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            lookback_ms: 5_000,
            heel_strike_ms: 200,
            foot_flat_ms: 400,
            mid_stance_ms: 400,
            toe_off_ms: 300,
            mid_swing_ms: 300,
            terminal_swing_ms: 200,
        }
    }
}

/// Parameter calculator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterConfig {
    /// Below this many buffered frames the zeroed snapshot is returned.
    pub min_frames: usize,
    /// Heel-strikes (either foot) used per cadence estimate.
    pub cadence_heel_strikes: usize,
    /// Fewer heel-strikes than this yield zero cadence.
    pub min_cadence_heel_strikes: usize,
    /// Cadence estimates averaged for the reported cadence.
    pub cadence_smoothing_window: usize,
    /// Accepted cadence estimates (steps/min).
    pub cadence_range_spm: PlausibleRange,
    /// Same-foot heel-strikes considered for step length and stride time.
    pub stride_heel_strikes: usize,
    /// Accepted step lengths (m).
    pub step_length_range_m: PlausibleRange,
    /// Accepted stride times (s).
    pub stride_time_range_s: PlausibleRange,
    /// Frames averaged for step width.
    pub step_width_frames: usize,
    /// Accepted step widths (m).
    pub step_width_range_m: PlausibleRange,
    /// Accepted stance times (s).
    pub stance_time_range_s: PlausibleRange,
    /// Fixed double-support percentage.
    pub double_support_percent: f32,
    /// Frames whose ankle confidence feeds the overall confidence.
    pub confidence_frames: usize,
    /// Recent event count at which the confidence scale saturates.
    pub confidence_event_target: usize,
    /// Window defining "recent" events for the confidence scale (ms).
    pub recent_event_window_ms: u64,
}

impl Default for ParameterConfig {
    fn default() -> Self {
        Self {
            min_frames: 30,
            cadence_heel_strikes: 10,
            min_cadence_heel_strikes: 4,
            cadence_smoothing_window: 20,
            cadence_range_spm: PlausibleRange::new(20.0, 250.0),
            stride_heel_strikes: 10,
            step_length_range_m: PlausibleRange::new(0.3, 2.0),
            stride_time_range_s: PlausibleRange::new(0.5, 3.0),
            step_width_frames: 10,
            step_width_range_m: PlausibleRange::new(0.05, 0.5),
            stance_time_range_s: PlausibleRange::new(0.2, 1.5),
            double_support_percent: 20.0,
            confidence_frames: 10,
            confidence_event_target: 10,
            recent_event_window_ms: 5_000,
        }
    }
}

/// Optional keypoint smoothing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// EMA weight of the new sample (0-1, lower = more smoothing).
    pub alpha: f32,
    /// A frame-to-frame jump larger than this is treated as an outlier (px).
    pub max_jump_px: f32,
    /// Confidence multiplier applied to a rejected outlier.
    pub outlier_confidence_scale: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            max_jump_px: 80.0,
            outlier_confidence_scale: 0.5,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub history: HistoryConfig,
    pub calibration: CalibrationConfig,
    pub detector: DetectorConfig,
    pub phase: PhaseConfig,
    pub parameters: ParameterConfig,
    /// Disabled unless present; keypoints are assumed smoothed upstream.
    pub smoothing: Option<SmoothingConfig>,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.history.capacity == 0 {
            return Err(invalid("history.capacity must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.history.min_confidence) {
            return Err(invalid("history.min_confidence must be in [0, 1)"));
        }

        let c = &self.calibration;
        for (name, value) in [
            ("shoulder_width_m", c.shoulder_width_m),
            ("hip_width_m", c.hip_width_m),
            ("torso_height_m", c.torso_height_m),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(&format!("calibration.{name} must be positive")));
            }
        }

        let d = &self.detector;
        if d.window_frames < 2 {
            return Err(invalid("detector.window_frames must be at least 2"));
        }
        if !(is_positive(d.heel_strike_velocity) && is_positive(d.toe_off_velocity)) {
            return Err(invalid("detector velocity thresholds must be positive"));
        }

        let p = &self.parameters;
        if p.min_cadence_heel_strikes < 2 {
            return Err(invalid("parameters.min_cadence_heel_strikes must be at least 2"));
        }
        if p.cadence_heel_strikes < p.min_cadence_heel_strikes {
            return Err(invalid(
                "parameters.cadence_heel_strikes must not be below min_cadence_heel_strikes",
            ));
        }
        if p.cadence_smoothing_window == 0 || p.confidence_event_target == 0 {
            return Err(invalid("parameters windows must be at least 1"));
        }
        for (name, range) in [
            ("cadence_range_spm", p.cadence_range_spm),
            ("step_length_range_m", p.step_length_range_m),
            ("stride_time_range_s", p.stride_time_range_s),
            ("step_width_range_m", p.step_width_range_m),
            ("stance_time_range_s", p.stance_time_range_s),
        ] {
            if !range.is_ordered() {
                return Err(invalid(&format!("parameters.{name} has min > max")));
            }
        }

        if let Some(s) = &self.smoothing {
            if !(s.alpha > 0.0 && s.alpha <= 1.0) {
                return Err(invalid("smoothing.alpha must be in (0, 1]"));
            }
            if !(s.max_jump_px.is_finite() && s.max_jump_px > 0.0) {
                return Err(invalid("smoothing.max_jump_px must be positive"));
            }
            if !(0.0..=1.0).contains(&s.outlier_confidence_scale) {
                return Err(invalid("smoothing.outlier_confidence_scale must be in [0, 1]"));
            }
        }

        Ok(())
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid(message: &str) -> GaitError {
    GaitError::InvalidConfig(message.to_string())
}
