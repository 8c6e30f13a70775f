//! Optional keypoint smoothing stage.
//!
//! Per-landmark exponential moving average with outlier rejection. Upstream
//! callers normally smooth keypoints themselves; this stage exists for
//! callers feeding raw estimator output straight into the engine.
//!
//! A keypoint whose raw position jumps farther than `max_jump_px` from the
//! previous raw frame is treated as a mis-detection: the previous smoothed
//! position is held and the confidence is scaled down. Jumps are measured
//! raw-to-raw, so a subject that really relocates is tracked again from the
//! next frame on instead of being pinned to the held position.

use crate::config::SmoothingConfig;
use crate::types::{Keypoint, Landmark, Pose};

/// EMA keypoint filter with jump rejection.
#[derive(Debug, Clone)]
pub struct KeypointSmoother {
    config: SmoothingConfig,
    /// Last (raw, smoothed) pair.
    prev: Option<(Pose, Pose)>,
}

impl KeypointSmoother {
    pub fn new(config: SmoothingConfig) -> Self {
        Self { config, prev: None }
    }

    /// Smooth one pose. The first pose after construction passes through.
    pub fn apply(&mut self, pose: &Pose) -> Pose {
        let Some((last_raw, last_smoothed)) = self.prev else {
            self.prev = Some((*pose, *pose));
            return *pose;
        };

        let mut smoothed = *pose;
        for landmark in Landmark::ALL {
            smoothed.set(
                landmark,
                self.smooth_keypoint(pose.get(landmark), last_raw.get(landmark), last_smoothed.get(landmark)),
            );
        }

        self.prev = Some((*pose, smoothed));
        smoothed
    }

    /// Forget all history; the next pose passes through.
    pub fn reset(&mut self) {
        self.prev = None;
    }

    fn smooth_keypoint(&self, raw: &Keypoint, last_raw: &Keypoint, last_smoothed: &Keypoint) -> Keypoint {
        // Nothing trustworthy to blend with yet.
        if last_raw.confidence <= 0.0 {
            return *raw;
        }

        let jump = raw.position().distance_to(&last_raw.position());
        if jump > self.config.max_jump_px {
            return Keypoint::new(
                last_smoothed.x,
                last_smoothed.y,
                raw.confidence * self.config.outlier_confidence_scale,
            );
        }

        let a = self.config.alpha;
        Keypoint::new(
            a * raw.x + (1.0 - a) * last_smoothed.x,
            a * raw.y + (1.0 - a) * last_smoothed.y,
            raw.confidence,
        )
    }
}
