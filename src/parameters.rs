//! Gait Parameter Calculation Module.
//!
//! Aggregates the event log and pose history into windowed gait metrics:
//! - cadence from heel-strike timing, smoothed over recent estimates
//! - step/stride length from same-foot heel-strike displacement
//! - stride, stance and swing timing
//! - step width from lateral ankle separation
//! - velocity, left/right symmetry, overall confidence
//!
//! Every metric is an independent function of (history, events, calibration).
//! Every aggregate passes its samples through a plausibility range first, so
//! a wild detection is excluded rather than averaged in. Spatial metrics are
//! zero whenever no calibration is present.

use std::collections::VecDeque;

use crate::config::ParameterConfig;
use crate::event_detection::EventLog;
use crate::history::PoseHistory;
use crate::types::{CalibrationData, Foot, GaitParameters, Landmark, Point2};

// ============================================================================
// CADENCE STATISTICS
// ============================================================================

/// Rolling window of recent cadence estimates (steps/min).
///
/// Fed on ingestion, each time a heel-strike is logged, so parameter queries
/// stay read-only.
#[derive(Debug, Clone)]
pub struct CadenceStatistics {
    samples: VecDeque<f32>,
    window: usize,
}

impl CadenceStatistics {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            samples: VecDeque::with_capacity(window),
            window,
        }
    }

    pub fn record(&mut self, cadence: f32) {
        self.samples.push_back(cadence);
        while self.samples.len() > self.window {
            self.samples.pop_front();
        }
    }

    /// Mean of the retained estimates.
    pub fn mean(&self) -> Option<f32> {
        mean(self.samples.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ============================================================================
// CALCULATOR
// ============================================================================

/// Computes [`GaitParameters`] snapshots. Holds configuration only.
#[derive(Debug, Clone)]
pub struct ParameterCalculator {
    config: ParameterConfig,
}

impl ParameterCalculator {
    pub fn new(config: ParameterConfig) -> Self {
        Self { config }
    }

    /// Full snapshot. Zeroed below `min_frames` buffered frames.
    pub fn calculate(
        &self,
        history: &PoseHistory,
        events: &EventLog,
        calibration: Option<&CalibrationData>,
        cadence_stats: &CadenceStatistics,
        now_ms: u64,
    ) -> GaitParameters {
        if history.len() < self.config.min_frames {
            return GaitParameters::default();
        }

        let cadence = self.cadence(events, cadence_stats);
        let step_length_left = self.step_length(events, Foot::Left, calibration);
        let step_length_right = self.step_length(events, Foot::Right, calibration);
        let stride_length = (step_length_left + step_length_right) / 2.0;
        let stride_time = self.stride_time(events);
        let stance_time = self.stance_time(events);

        GaitParameters {
            cadence,
            stride_length,
            step_length_left,
            step_length_right,
            step_width: self.step_width(history, calibration),
            velocity: stride_length * cadence / 60.0,
            symmetry_index: symmetry_index(step_length_left, step_length_right),
            stride_time,
            stance_time,
            swing_time: (stride_time - stance_time).max(0.0),
            double_support: self.config.double_support_percent,
            confidence: self.overall_confidence(history, events, now_ms),
        }
    }

    /// Instantaneous cadence from the last heel-strikes of both feet.
    ///
    /// `None` with too few heel-strikes, a zero time span, or an implausible
    /// result.
    pub fn raw_cadence(&self, events: &EventLog) -> Option<f32> {
        let strikes: Vec<u64> = events
            .heel_strikes()
            .rev()
            .take(self.config.cadence_heel_strikes)
            .map(|e| e.timestamp_ms)
            .collect();
        if strikes.len() < self.config.min_cadence_heel_strikes {
            return None;
        }

        // `strikes` is newest first.
        let newest = strikes[0];
        let oldest = strikes[strikes.len() - 1];
        let span_s = newest.saturating_sub(oldest) as f32 / 1000.0;
        if span_s <= 0.0 {
            return None;
        }

        let cadence = (strikes.len() - 1) as f32 / span_s * 60.0;
        self.config.cadence_range_spm.contains(cadence).then_some(cadence)
    }

    /// Smoothed cadence (steps/min), 0 with too few heel-strikes.
    pub fn cadence(&self, events: &EventLog, stats: &CadenceStatistics) -> f32 {
        if events.heel_strikes().count() < self.config.min_cadence_heel_strikes {
            return 0.0;
        }
        stats.mean().unwrap_or(0.0)
    }

    /// Mean displacement between consecutive same-foot heel-strikes (m).
    pub fn step_length(&self, events: &EventLog, foot: Foot, calibration: Option<&CalibrationData>) -> f32 {
        let Some(calibration) = calibration else {
            return 0.0;
        };
        let positions: Vec<_> = self
            .last_heel_strikes(events, foot)
            .iter()
            .map(|(_, position)| *position)
            .collect();

        let lengths = positions
            .windows(2)
            .map(|pair| calibration.to_meters(pair[0].distance_to(&pair[1])))
            .filter(|m| self.config.step_length_range_m.contains(*m));
        mean(lengths).unwrap_or(0.0)
    }

    /// Mean interval between consecutive left heel-strikes (s).
    pub fn stride_time(&self, events: &EventLog) -> f32 {
        let times: Vec<u64> = self
            .last_heel_strikes(events, Foot::Left)
            .iter()
            .map(|(t, _)| *t)
            .collect();

        let intervals = times
            .windows(2)
            .map(|pair| pair[1].saturating_sub(pair[0]) as f32 / 1000.0)
            .filter(|s| self.config.stride_time_range_s.contains(*s));
        mean(intervals).unwrap_or(0.0)
    }

    /// Mean heel-strike to next same-foot toe-off interval, both feet (s).
    pub fn stance_time(&self, events: &EventLog) -> f32 {
        let mut pending: [Option<u64>; 2] = [None, None];
        let mut intervals = Vec::new();

        for event in events.iter() {
            let slot = &mut pending[foot_index(event.foot)];
            if event.is_heel_strike() {
                *slot = Some(event.timestamp_ms);
            } else if let Some(strike_ms) = slot.take() {
                let seconds = event.timestamp_ms.saturating_sub(strike_ms) as f32 / 1000.0;
                if self.config.stance_time_range_s.contains(seconds) {
                    intervals.push(seconds);
                }
            }
        }
        mean(intervals.into_iter()).unwrap_or(0.0)
    }

    /// Mean lateral ankle separation over the last frames (m).
    pub fn step_width(&self, history: &PoseHistory, calibration: Option<&CalibrationData>) -> f32 {
        let Some(calibration) = calibration else {
            return 0.0;
        };
        let widths = history
            .last_n(self.config.step_width_frames)
            .map(|f| {
                let left = f.get(Landmark::LeftAnkle).x;
                let right = f.get(Landmark::RightAnkle).x;
                calibration.to_meters((left - right).abs())
            })
            .filter(|m| self.config.step_width_range_m.contains(*m));
        mean(widths).unwrap_or(0.0)
    }

    /// Mean confident-ankle confidence, scaled by recent event support.
    pub fn overall_confidence(&self, history: &PoseHistory, events: &EventLog, now_ms: u64) -> f32 {
        let threshold = history.min_confidence();
        let confidences = history
            .last_n(self.config.confidence_frames)
            .flat_map(|f| {
                [
                    f.get(Landmark::LeftAnkle).confidence,
                    f.get(Landmark::RightAnkle).confidence,
                ]
            })
            .filter(|c| *c > threshold);
        let Some(detection) = mean(confidences) else {
            return 0.0;
        };

        let recent_events = events.recent(now_ms, self.config.recent_event_window_ms).len();
        let support = (recent_events as f32 / self.config.confidence_event_target as f32).min(1.0);
        (detection * support).clamp(0.0, 1.0)
    }

    pub fn config(&self) -> &ParameterConfig {
        &self.config
    }

    /// Last `stride_heel_strikes` heel-strikes of a foot as (time, position), oldest first.
    fn last_heel_strikes(&self, events: &EventLog, foot: Foot) -> Vec<(u64, Point2)> {
        let mut strikes: Vec<_> = events
            .heel_strikes_for(foot)
            .rev()
            .take(self.config.stride_heel_strikes)
            .map(|e| (e.timestamp_ms, e.position))
            .collect();
        strikes.reverse();
        strikes
    }
}

/// `min / max * 100`, or 0 when either side is 0.
pub fn symmetry_index(left: f32, right: f32) -> f32 {
    if left <= 0.0 || right <= 0.0 {
        return 0.0;
    }
    left.min(right) / left.max(right) * 100.0
}

fn foot_index(foot: Foot) -> usize {
    match foot {
        Foot::Left => 0,
        Foot::Right => 1,
    }
}

fn mean(values: impl Iterator<Item = f32>) -> Option<f32> {
    let (sum, count) = values.fold((0.0f32, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f32)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistoryConfig;
    use crate::types::{GaitEvent, GaitEventType, Keypoint, Pose, PoseFrame};

    fn calculator() -> ParameterCalculator {
        ParameterCalculator::new(ParameterConfig::default())
    }

    fn heel_strike(foot: Foot, t: u64, x: f32, y: f32) -> GaitEvent {
        GaitEvent::new(GaitEventType::HeelStrike, foot, t, Point2::new(x, y), 0.9)
    }

    fn toe_off(foot: Foot, t: u64) -> GaitEvent {
        GaitEvent::new(GaitEventType::ToeOff, foot, t, Point2::default(), 0.9)
    }

    fn log_with(events: &[GaitEvent]) -> EventLog {
        let mut log = EventLog::new();
        for e in events {
            log.push(*e);
        }
        log
    }

    fn history_with(count: u64, left_x: f32, right_x: f32, confidence: f32) -> PoseHistory {
        let mut history = PoseHistory::new(&HistoryConfig::default());
        for i in 0..count {
            let pose = Pose::default()
                .with(Landmark::LeftAnkle, Keypoint::new(left_x, 400.0, confidence))
                .with(Landmark::RightAnkle, Keypoint::new(right_x, 400.0, confidence));
            history.append(PoseFrame::new(i * 100, pose));
        }
        history
    }

    /// Alternating heel-strikes every 500ms, 100px apart per foot.
    fn walking_log() -> EventLog {
        let mut events = Vec::new();
        for i in 0..10u64 {
            let foot = if i % 2 == 0 { Foot::Right } else { Foot::Left };
            let t = 600 + i * 500;
            events.push(heel_strike(foot, t, 100.0 + i as f32 * 50.0, 410.0));
            events.push(toe_off(foot.opposite(), t + 100));
        }
        log_with(&events)
    }

    #[test]
    fn test_raw_cadence_requires_four_heel_strikes() {
        let c = calculator();
        let log = log_with(&[
            heel_strike(Foot::Left, 0, 0.0, 0.0),
            heel_strike(Foot::Right, 500, 0.0, 0.0),
            heel_strike(Foot::Left, 1_000, 0.0, 0.0),
        ]);
        assert!(c.raw_cadence(&log).is_none());

        let mut log = log;
        log.push(heel_strike(Foot::Right, 1_500, 0.0, 0.0));
        // 3 steps over 1.5s = 120 steps/min
        assert!((c.raw_cadence(&log).unwrap() - 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_raw_cadence_uses_last_ten() {
        let c = calculator();
        let mut events = Vec::new();
        // Slow early steps, then 500ms steps.
        for i in 0..5u64 {
            events.push(heel_strike(Foot::Left, i * 2_000, 0.0, 0.0));
        }
        for i in 0..10u64 {
            events.push(heel_strike(Foot::Right, 10_000 + i * 500, 0.0, 0.0));
        }
        let cadence = c.raw_cadence(&log_with(&events)).unwrap();
        assert!((cadence - 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_raw_cadence_rejects_implausible() {
        let c = calculator();
        // 4 strikes 50ms apart -> 1200 steps/min
        let log = log_with(&[
            heel_strike(Foot::Left, 0, 0.0, 0.0),
            heel_strike(Foot::Right, 50, 0.0, 0.0),
            heel_strike(Foot::Left, 100, 0.0, 0.0),
            heel_strike(Foot::Right, 150, 0.0, 0.0),
        ]);
        assert!(c.raw_cadence(&log).is_none());
    }

    #[test]
    fn test_cadence_statistics_window() {
        let mut stats = CadenceStatistics::new(3);
        assert!(stats.mean().is_none());
        for v in [60.0, 90.0, 120.0, 150.0] {
            stats.record(v);
        }
        assert_eq!(stats.len(), 3);
        assert!((stats.mean().unwrap() - 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_cadence_zero_without_enough_strikes() {
        let c = calculator();
        let mut stats = CadenceStatistics::new(20);
        stats.record(110.0);
        let log = log_with(&[heel_strike(Foot::Left, 0, 0.0, 0.0)]);
        assert_eq!(c.cadence(&log, &stats), 0.0);
        assert!((c.cadence(&walking_log(), &stats) - 110.0).abs() < 1e-3);
    }

    #[test]
    fn test_step_length_outlier_excluded() {
        let c = calculator();
        let calibration = CalibrationData::new(100.0);
        let log = log_with(&[
            heel_strike(Foot::Left, 0, 0.0, 400.0),
            heel_strike(Foot::Left, 1_000, 150.0, 400.0), // 1.5m, kept
            heel_strike(Foot::Left, 2_000, 550.0, 400.0), // 4.0m, excluded
        ]);
        let length = c.step_length(&log, Foot::Left, Some(&calibration));
        assert!((length - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_step_length_requires_calibration() {
        let c = calculator();
        assert_eq!(c.step_length(&walking_log(), Foot::Left, None), 0.0);
    }

    #[test]
    fn test_step_length_scales_inversely_with_calibration() {
        let c = calculator();
        let log = walking_log();
        let at_100 = c.step_length(&log, Foot::Left, Some(&CalibrationData::new(100.0)));
        let at_200 = c.step_length(&log, Foot::Left, Some(&CalibrationData::new(200.0)));
        // Same-foot strikes are 100px apart.
        assert!((at_100 - 1.0).abs() < 1e-5);
        assert!((at_200 - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_stride_time_filters_range() {
        let c = calculator();
        let log = log_with(&[
            heel_strike(Foot::Left, 0, 0.0, 0.0),
            heel_strike(Foot::Left, 1_000, 0.0, 0.0), // 1.0s
            heel_strike(Foot::Left, 1_200, 0.0, 0.0), // 0.2s, excluded
            heel_strike(Foot::Left, 2_400, 0.0, 0.0), // 1.2s
            heel_strike(Foot::Right, 2_500, 0.0, 0.0),
        ]);
        assert!((c.stride_time(&log) - 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_stance_time_pairs_strike_with_next_toe_off() {
        let c = calculator();
        let log = log_with(&[
            heel_strike(Foot::Left, 0, 0.0, 0.0),
            toe_off(Foot::Right, 100),
            toe_off(Foot::Left, 600), // 0.6s
            heel_strike(Foot::Right, 700, 0.0, 0.0),
            toe_off(Foot::Right, 1_500), // 0.8s
            toe_off(Foot::Left, 1_600),  // no pending strike
            heel_strike(Foot::Left, 2_000, 0.0, 0.0),
            toe_off(Foot::Left, 4_000), // 2.0s, excluded
        ]);
        assert!((c.stance_time(&log) - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_step_width() {
        let c = calculator();
        let history = history_with(20, 100.0, 130.0, 0.9);
        let width = c.step_width(&history, Some(&CalibrationData::new(100.0)));
        assert!((width - 0.3).abs() < 1e-5);
        assert_eq!(c.step_width(&history, None), 0.0);

        // 3px = 0.03m falls below the plausible minimum.
        let narrow = history_with(20, 100.0, 103.0, 0.9);
        assert_eq!(c.step_width(&narrow, Some(&CalibrationData::new(100.0))), 0.0);
    }

    #[test]
    fn test_symmetry_index() {
        assert_eq!(symmetry_index(1.0, 1.0), 100.0);
        assert!((symmetry_index(0.8, 1.0) - 80.0).abs() < 1e-4);
        assert!((symmetry_index(1.0, 0.8) - 80.0).abs() < 1e-4);
        assert_eq!(symmetry_index(0.0, 1.0), 0.0);
        assert_eq!(symmetry_index(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_overall_confidence_scaled_by_event_count() {
        let c = calculator();
        let history = history_with(40, 100.0, 130.0, 0.8);
        let now = 3_900;

        assert_eq!(c.overall_confidence(&history, &EventLog::new(), now), 0.0);

        let five = log_with(&[
            heel_strike(Foot::Left, 3_000, 0.0, 0.0),
            heel_strike(Foot::Right, 3_200, 0.0, 0.0),
            heel_strike(Foot::Left, 3_400, 0.0, 0.0),
            heel_strike(Foot::Right, 3_600, 0.0, 0.0),
            heel_strike(Foot::Left, 3_800, 0.0, 0.0),
        ]);
        assert!((c.overall_confidence(&history, &five, now) - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_cold_start_returns_zeroed() {
        let c = calculator();
        let history = history_with(29, 100.0, 130.0, 0.9);
        let params = c.calculate(
            &history,
            &walking_log(),
            Some(&CalibrationData::new(100.0)),
            &CadenceStatistics::new(20),
            2_900,
        );
        assert_eq!(params, GaitParameters::default());
    }

    #[test]
    fn test_full_snapshot() {
        let c = calculator();
        let history = history_with(60, 100.0, 130.0, 0.9);
        let log = walking_log();
        let mut stats = CadenceStatistics::new(20);
        stats.record(120.0);

        let params = c.calculate(&history, &log, Some(&CalibrationData::new(100.0)), &stats, 5_900);

        assert!((params.cadence - 120.0).abs() < 1e-3);
        assert!((params.stride_length - 1.0).abs() < 1e-4);
        assert!((params.velocity - 2.0).abs() < 1e-3);
        assert!((params.symmetry_index - 100.0).abs() < 1e-3);
        assert!((params.stride_time - 1.0).abs() < 1e-4);
        assert!((params.step_width - 0.3).abs() < 1e-4);
        assert_eq!(params.double_support, 20.0);
        assert!(params.confidence > 0.5);
    }
}
