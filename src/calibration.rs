//! Calibration Module.
//!
//! Converts pixel distances to meters. Calibration comes either from an
//! explicit reference measurement or from standard body proportions visible
//! in a single frame:
//!
//! - shoulder width ≈ 0.45 m
//! - hip width ≈ 0.35 m
//! - torso height (shoulder midpoint to hip midpoint) ≈ 0.60 m
//!
//! Each proportion gives an independent pixels-per-meter estimate and the
//! estimates are averaged, so one mis-detected landmark moves the result less.

use tracing::{debug, info, warn};

use crate::config::CalibrationConfig;
use crate::error::{GaitError, Result};
use crate::types::{CalibrationData, Landmark, Pose};

/// Holds the active calibration, if any.
#[derive(Debug, Clone)]
pub struct Calibrator {
    config: CalibrationConfig,
    current: Option<CalibrationData>,
}

impl Calibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            current: None,
        }
    }

    /// Replace the calibration. Rejects non-positive or non-finite scales.
    pub fn calibrate(&mut self, data: CalibrationData) -> Result<()> {
        if !(data.pixels_per_meter.is_finite() && data.pixels_per_meter > 0.0) {
            warn!(pixels_per_meter = data.pixels_per_meter, "calibration rejected");
            return Err(GaitError::InvalidCalibration {
                pixels_per_meter: data.pixels_per_meter,
            });
        }
        info!(pixels_per_meter = data.pixels_per_meter, "calibration set");
        self.current = Some(data);
        Ok(())
    }

    /// Estimate from body proportions and, on success, install the estimate.
    ///
    /// Returns `None` and leaves the current calibration untouched when any
    /// shoulder or hip is below the confidence threshold.
    pub fn auto_calibrate(&mut self, pose: &Pose) -> Option<CalibrationData> {
        let estimate = self.estimate(pose)?;
        info!(pixels_per_meter = estimate.pixels_per_meter, "auto-calibration applied");
        self.current = Some(estimate);
        Some(estimate)
    }

    /// Pure anthropometric estimate; does not change state.
    pub fn estimate(&self, pose: &Pose) -> Option<CalibrationData> {
        let references = [
            Landmark::LeftShoulder,
            Landmark::RightShoulder,
            Landmark::LeftHip,
            Landmark::RightHip,
        ];
        let all_confident = references.iter().all(|&l| {
            let kp = pose.get(l);
            kp.is_finite() && kp.confidence >= self.config.min_landmark_confidence
        });
        if !all_confident {
            debug!("auto-calibration skipped: reference landmarks below confidence");
            return None;
        }

        let left_shoulder = pose.get(Landmark::LeftShoulder).position();
        let right_shoulder = pose.get(Landmark::RightShoulder).position();
        let left_hip = pose.get(Landmark::LeftHip).position();
        let right_hip = pose.get(Landmark::RightHip).position();

        let shoulder_px = left_shoulder.distance_to(&right_shoulder);
        let hip_px = left_hip.distance_to(&right_hip);
        let torso_px = left_shoulder
            .midpoint(&right_shoulder)
            .distance_to(&left_hip.midpoint(&right_hip));

        // A side-on view collapses the widths to ~0 px; skip degenerate ratios.
        let estimates: Vec<f32> = [
            (shoulder_px, self.config.shoulder_width_m),
            (hip_px, self.config.hip_width_m),
            (torso_px, self.config.torso_height_m),
        ]
        .iter()
        .filter(|(px, _)| *px > 0.0)
        .map(|(px, meters)| px / meters)
        .collect();

        if estimates.is_empty() {
            return None;
        }
        let pixels_per_meter = estimates.iter().sum::<f32>() / estimates.len() as f32;
        if !(pixels_per_meter.is_finite() && pixels_per_meter > 0.0) {
            return None;
        }

        debug!(
            shoulder_px,
            hip_px,
            torso_px,
            pixels_per_meter,
            "anthropometric calibration estimate"
        );
        Some(CalibrationData::new(pixels_per_meter))
    }

    pub fn is_calibrated(&self) -> bool {
        self.current.is_some()
    }

    pub fn calibration(&self) -> Option<&CalibrationData> {
        self.current.as_ref()
    }
}
