//! Core data types for the gait engine.
//!
//! This module defines the shared data model used throughout the gait
//! pipeline: keypoints and poses coming in from the pose estimator, the
//! discrete gait events the detector emits, the derived phase state, and the
//! windowed parameter snapshot handed to consumers.
//!
//! Design principle: the small, fixed set of tracked landmarks is an enum and
//! a pose is an enum-indexed array, so every landmark is always present. A
//! landmark the estimator did not report simply carries zero confidence.
//!
//! All coordinates are image pixels with `y` growing downward. All timestamps
//! are monotonic milliseconds.

use serde::{Deserialize, Serialize};

// ============================================================================
// KEYPOINT AND POSE TYPES
// ============================================================================

/// The body landmarks the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum Landmark {
    LeftShoulder = 0,
    RightShoulder = 1,
    LeftHip = 2,
    RightHip = 3,
    LeftKnee = 4,
    RightKnee = 5,
    LeftAnkle = 6,
    RightAnkle = 7,
}

impl Landmark {
    pub const COUNT: usize = 8;

    pub const ALL: [Landmark; Landmark::COUNT] = [
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftHip,
        Landmark::RightHip,
        Landmark::LeftKnee,
        Landmark::RightKnee,
        Landmark::LeftAnkle,
        Landmark::RightAnkle,
    ];

    /// Resolve a pose-estimator keypoint name.
    ///
    /// Accepts `left_ankle`, `leftAnkle`, `left-ankle` and any casing of them.
    /// Names of landmarks the engine does not track return `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "leftshoulder" => Some(Self::LeftShoulder),
            "rightshoulder" => Some(Self::RightShoulder),
            "lefthip" => Some(Self::LeftHip),
            "righthip" => Some(Self::RightHip),
            "leftknee" => Some(Self::LeftKnee),
            "rightknee" => Some(Self::RightKnee),
            "leftankle" => Some(Self::LeftAnkle),
            "rightankle" => Some(Self::RightAnkle),
            _ => None,
        }
    }

    /// Canonical snake_case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

/// A 2D point in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Midpoint between two points.
    pub fn midpoint(&self, other: &Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// A single keypoint as reported by the pose estimator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
    /// X coordinate in pixels.
    pub x: f32,
    /// Y coordinate in pixels (downward).
    pub y: f32,
    /// Detection confidence [0.0, 1.0].
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Strictly above the given confidence threshold.
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }

    /// All three components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.confidence.is_finite()
    }

    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Keypoint in the external estimator format: `{name, x, y, score}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedKeypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

impl NamedKeypoint {
    pub fn new(name: impl Into<String>, x: f32, y: f32, score: f32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            score,
        }
    }
}

/// The tracked landmarks of one detected person.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub keypoints: [Keypoint; Landmark::COUNT],
}

impl Pose {
    pub fn new(keypoints: [Keypoint; Landmark::COUNT]) -> Self {
        Self { keypoints }
    }

    /// Build a pose from the estimator's named keypoint list.
    ///
    /// Untracked names are ignored; tracked landmarks missing from the list
    /// keep zero confidence.
    pub fn from_named<'a>(keypoints: impl IntoIterator<Item = &'a NamedKeypoint>) -> Self {
        let mut pose = Pose::default();
        for kp in keypoints {
            if let Some(landmark) = Landmark::from_name(&kp.name) {
                pose.set(landmark, Keypoint::new(kp.x, kp.y, kp.score));
            }
        }
        pose
    }

    pub fn get(&self, landmark: Landmark) -> &Keypoint {
        &self.keypoints[landmark as usize]
    }

    pub fn set(&mut self, landmark: Landmark, keypoint: Keypoint) {
        self.keypoints[landmark as usize] = keypoint;
    }

    /// Builder-style variant of [`Pose::set`].
    pub fn with(mut self, landmark: Landmark, keypoint: Keypoint) -> Self {
        self.set(landmark, keypoint);
        self
    }

    /// True when no keypoint carries a NaN or infinite component.
    pub fn is_finite(&self) -> bool {
        self.keypoints.iter().all(Keypoint::is_finite)
    }
}

/// One validated pose sample, owned by the history buffer once appended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Monotonic timestamp in milliseconds.
    pub timestamp_ms: u64,
    pub pose: Pose,
}

impl PoseFrame {
    pub fn new(timestamp_ms: u64, pose: Pose) -> Self {
        Self { timestamp_ms, pose }
    }

    pub fn get(&self, landmark: Landmark) -> &Keypoint {
        self.pose.get(landmark)
    }
}

// ============================================================================
// GAIT EVENT TYPES
// ============================================================================

/// Which foot an event or phase belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Foot {
    Left,
    Right,
}

impl Foot {
    pub const BOTH: [Foot; 2] = [Foot::Left, Foot::Right];

    pub fn ankle(&self) -> Landmark {
        match self {
            Foot::Left => Landmark::LeftAnkle,
            Foot::Right => Landmark::RightAnkle,
        }
    }

    pub fn knee(&self) -> Landmark {
        match self {
            Foot::Left => Landmark::LeftKnee,
            Foot::Right => Landmark::RightKnee,
        }
    }

    pub fn opposite(&self) -> Foot {
        match self {
            Foot::Left => Foot::Right,
            Foot::Right => Foot::Left,
        }
    }
}

/// Kind of discrete gait event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaitEventType {
    /// First ground contact of the foot.
    HeelStrike,
    /// Foot leaves the ground, swing begins.
    ToeOff,
}

/// A detected gait event. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaitEvent {
    pub event_type: GaitEventType,
    pub foot: Foot,
    /// Timestamp of the frame that triggered the event.
    pub timestamp_ms: u64,
    /// Ankle position at the triggering frame.
    pub position: Point2,
    /// min(ankle, knee) confidence at the triggering frame.
    pub confidence: f32,
}

impl GaitEvent {
    pub fn new(
        event_type: GaitEventType,
        foot: Foot,
        timestamp_ms: u64,
        position: Point2,
        confidence: f32,
    ) -> Self {
        Self {
            event_type,
            foot,
            timestamp_ms,
            position,
            confidence,
        }
    }

    pub fn is_heel_strike(&self) -> bool {
        self.event_type == GaitEventType::HeelStrike
    }

    pub fn is_toe_off(&self) -> bool {
        self.event_type == GaitEventType::ToeOff
    }
}

// ============================================================================
// GAIT PHASE TYPES
// ============================================================================

/// Portion of the gait cycle a foot occupies, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseLabel {
    HeelStrike,
    FootFlat,
    MidStance,
    HeelOff,
    ToeOff,
    MidSwing,
    TerminalSwing,
}

impl PhaseLabel {
    /// Position of the label within the cycle (0 = heel-strike).
    pub fn ordinal(&self) -> usize {
        match self {
            PhaseLabel::HeelStrike => 0,
            PhaseLabel::FootFlat => 1,
            PhaseLabel::MidStance => 2,
            PhaseLabel::HeelOff => 3,
            PhaseLabel::ToeOff => 4,
            PhaseLabel::MidSwing => 5,
            PhaseLabel::TerminalSwing => 6,
        }
    }

    /// Foot is on the ground during this phase.
    pub fn is_stance(&self) -> bool {
        matches!(
            self,
            PhaseLabel::HeelStrike | PhaseLabel::FootFlat | PhaseLabel::MidStance | PhaseLabel::HeelOff
        )
    }
}

/// Phase state of one foot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootPhase {
    pub label: PhaseLabel,
    /// Progress within the phase [0.0, 1.0].
    pub progress: f32,
    /// Confidence [0.0, 1.0]. Zero means "unknown".
    pub confidence: f32,
}

impl FootPhase {
    pub fn new(label: PhaseLabel, progress: f32, confidence: f32) -> Self {
        Self {
            label,
            progress,
            confidence,
        }
    }

    /// Placeholder used when no recent event exists for the foot.
    pub fn unknown() -> Self {
        Self::new(PhaseLabel::MidStance, 0.5, 0.0)
    }

    pub fn is_known(&self) -> bool {
        self.confidence > 0.0
    }
}

/// Combined left/right phase state. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaitPhase {
    pub left: FootPhase,
    pub right: FootPhase,
    /// min(left.confidence, right.confidence).
    pub confidence: f32,
}

impl GaitPhase {
    pub fn new(left: FootPhase, right: FootPhase) -> Self {
        Self {
            left,
            right,
            confidence: left.confidence.min(right.confidence),
        }
    }

    pub fn foot(&self, foot: Foot) -> &FootPhase {
        match foot {
            Foot::Left => &self.left,
            Foot::Right => &self.right,
        }
    }

    /// Both feet are in a stance phase and both phases are known.
    pub fn is_double_support(&self) -> bool {
        self.left.is_known()
            && self.right.is_known()
            && self.left.label.is_stance()
            && self.right.label.is_stance()
    }
}

// ============================================================================
// CALIBRATION AND OUTPUT TYPES
// ============================================================================

/// Pixel-to-meter conversion plus descriptive metadata.
///
/// Replaced wholesale by each calibration call, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationData {
    /// Pixels per meter at the subject's depth. Always positive once accepted.
    pub pixels_per_meter: f32,
    /// Subject height used for the measurement, if known (m).
    pub reference_height_m: Option<f32>,
    /// Camera mounting height, if known (m).
    pub camera_height_m: Option<f32>,
    /// Camera pitch, if known (degrees).
    pub camera_angle_deg: Option<f32>,
}

impl CalibrationData {
    pub fn new(pixels_per_meter: f32) -> Self {
        Self {
            pixels_per_meter,
            reference_height_m: None,
            camera_height_m: None,
            camera_angle_deg: None,
        }
    }

    pub fn with_reference_height(mut self, meters: f32) -> Self {
        self.reference_height_m = Some(meters);
        self
    }

    pub fn with_camera(mut self, height_m: f32, angle_deg: f32) -> Self {
        self.camera_height_m = Some(height_m);
        self.camera_angle_deg = Some(angle_deg);
        self
    }

    /// Convert a pixel distance to meters.
    pub fn to_meters(&self, pixels: f32) -> f32 {
        pixels / self.pixels_per_meter
    }
}

/// Snapshot of windowed gait metrics.
///
/// `Default` is the fully zeroed struct returned during cold start.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GaitParameters {
    /// Steps per minute.
    pub cadence: f32,
    /// Mean of left and right step length (m).
    pub stride_length: f32,
    /// Left step length (m).
    pub step_length_left: f32,
    /// Right step length (m).
    pub step_length_right: f32,
    /// Lateral ankle separation (m).
    pub step_width: f32,
    /// Walking speed (m/s).
    pub velocity: f32,
    /// min/max of step lengths, as a percentage [0, 100].
    pub symmetry_index: f32,
    /// Left heel-strike to left heel-strike (s).
    pub stride_time: f32,
    /// Heel-strike to toe-off (s).
    pub stance_time: f32,
    /// Stride time minus stance time (s).
    pub swing_time: f32,
    /// Portion of the cycle with both feet down (%).
    pub double_support: f32,
    /// Overall confidence [0.0, 1.0].
    pub confidence: f32,
}

impl GaitParameters {
    /// True when any spatial metric could be computed.
    pub fn has_spatial_metrics(&self) -> bool {
        self.stride_length > 0.0 || self.step_width > 0.0
    }
}
