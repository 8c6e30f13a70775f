//! Gait Phase Tracking Module.
//!
//! Derives, for each foot, which portion of the gait cycle it occupies. The
//! phase is a pure function of the event log and the query time: nothing is
//! maintained incrementally, so there is no phase state to go stale.
//!
//! After a heel-strike:
//! - `[0, 200)` ms: heel-strike, progress 0
//! - `[200, 400)` ms: foot-flat, progress = elapsed / 400
//! - `400+` ms: mid-stance, progress = min((elapsed - 400) / 400, 1)
//!
//! After a toe-off:
//! - `[0, 300)` ms: toe-off, progress 0
//! - `[300, 600)` ms: mid-swing, progress = (elapsed - 300) / 300
//! - `600+` ms: terminal-swing, progress = min((elapsed - 600) / 200, 1)
//!
//! With no event inside the lookback window the foot reports mid-stance at
//! progress 0.5 with zero confidence, meaning "unknown".

use crate::config::PhaseConfig;
use crate::event_detection::EventLog;
use crate::types::{Foot, FootPhase, GaitEvent, GaitEventType, GaitPhase, PhaseLabel};

/// Phase of both feet at `now_ms`.
pub fn gait_phase(log: &EventLog, now_ms: u64, config: &PhaseConfig) -> GaitPhase {
    GaitPhase::new(
        foot_phase(log, Foot::Left, now_ms, config),
        foot_phase(log, Foot::Right, now_ms, config),
    )
}

/// Phase of one foot at `now_ms`.
pub fn foot_phase(log: &EventLog, foot: Foot, now_ms: u64, config: &PhaseConfig) -> FootPhase {
    match log.latest_for_at(foot, now_ms) {
        Some(event) if now_ms - event.timestamp_ms <= config.lookback_ms => phase_since(event, now_ms, config),
        _ => FootPhase::unknown(),
    }
}

/// Phase implied by a single event after the elapsed time to `now_ms`.
pub fn phase_since(event: &GaitEvent, now_ms: u64, config: &PhaseConfig) -> FootPhase {
    let elapsed = now_ms.saturating_sub(event.timestamp_ms);
    let (label, progress) = match event.event_type {
        GaitEventType::HeelStrike => stance_phase(elapsed, config),
        GaitEventType::ToeOff => swing_phase(elapsed, config),
    };
    FootPhase::new(label, progress, event.confidence)
}

fn stance_phase(elapsed: u64, config: &PhaseConfig) -> (PhaseLabel, f32) {
    if elapsed < config.heel_strike_ms {
        (PhaseLabel::HeelStrike, 0.0)
    } else if elapsed < config.foot_flat_ms {
        (PhaseLabel::FootFlat, ratio(elapsed, config.foot_flat_ms))
    } else {
        (
            PhaseLabel::MidStance,
            ratio(elapsed - config.foot_flat_ms, config.mid_stance_ms).min(1.0),
        )
    }
}

fn swing_phase(elapsed: u64, config: &PhaseConfig) -> (PhaseLabel, f32) {
    let mid_swing_end = config.toe_off_ms + config.mid_swing_ms;
    if elapsed < config.toe_off_ms {
        (PhaseLabel::ToeOff, 0.0)
    } else if elapsed < mid_swing_end {
        (PhaseLabel::MidSwing, ratio(elapsed - config.toe_off_ms, config.mid_swing_ms))
    } else {
        (
            PhaseLabel::TerminalSwing,
            ratio(elapsed - mid_swing_end, config.terminal_swing_ms).min(1.0),
        )
    }
}

fn ratio(numerator: u64, denominator: u64) -> f32 {
    if denominator == 0 {
        return 1.0;
    }
    numerator as f32 / denominator as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point2;

    fn event(event_type: GaitEventType, foot: Foot, timestamp_ms: u64, confidence: f32) -> GaitEvent {
        GaitEvent::new(event_type, foot, timestamp_ms, Point2::default(), confidence)
    }

    fn log_with(events: &[GaitEvent]) -> EventLog {
        let mut log = EventLog::new();
        for e in events {
            log.push(*e);
        }
        log
    }

    fn config() -> PhaseConfig {
        PhaseConfig::default()
    }

    #[test]
    fn test_heel_strike_progression() {
        let hs = event(GaitEventType::HeelStrike, Foot::Left, 1_000, 0.9);
        let c = config();

        let p = phase_since(&hs, 1_100, &c);
        assert_eq!(p.label, PhaseLabel::HeelStrike);
        assert_eq!(p.progress, 0.0);
        assert_eq!(p.confidence, 0.9);

        let p = phase_since(&hs, 1_300, &c);
        assert_eq!(p.label, PhaseLabel::FootFlat);
        assert!((p.progress - 0.75).abs() < 1e-6);

        let p = phase_since(&hs, 1_600, &c);
        assert_eq!(p.label, PhaseLabel::MidStance);
        assert!((p.progress - 0.5).abs() < 1e-6);

        let p = phase_since(&hs, 3_000, &c);
        assert_eq!(p.label, PhaseLabel::MidStance);
        assert_eq!(p.progress, 1.0);
    }

    #[test]
    fn test_heel_strike_boundaries() {
        let hs = event(GaitEventType::HeelStrike, Foot::Left, 0, 0.9);
        let c = config();
        assert_eq!(phase_since(&hs, 199, &c).label, PhaseLabel::HeelStrike);
        assert_eq!(phase_since(&hs, 200, &c).label, PhaseLabel::FootFlat);
        assert_eq!(phase_since(&hs, 400, &c).label, PhaseLabel::MidStance);
        assert_eq!(phase_since(&hs, 400, &c).progress, 0.0);
    }

    #[test]
    fn test_toe_off_progression() {
        let to = event(GaitEventType::ToeOff, Foot::Right, 2_000, 0.8);
        let c = config();

        let p = phase_since(&to, 2_100, &c);
        assert_eq!(p.label, PhaseLabel::ToeOff);
        assert_eq!(p.progress, 0.0);

        let p = phase_since(&to, 2_450, &c);
        assert_eq!(p.label, PhaseLabel::MidSwing);
        assert!((p.progress - 0.5).abs() < 1e-6);

        let p = phase_since(&to, 2_700, &c);
        assert_eq!(p.label, PhaseLabel::TerminalSwing);
        assert!((p.progress - 0.5).abs() < 1e-6);

        let p = phase_since(&to, 4_000, &c);
        assert_eq!(p.label, PhaseLabel::TerminalSwing);
        assert_eq!(p.progress, 1.0);
    }

    #[test]
    fn test_no_events_is_unknown_mid_stance() {
        let phase = gait_phase(&EventLog::new(), 10_000, &config());
        assert_eq!(phase.left, FootPhase::unknown());
        assert_eq!(phase.right.label, PhaseLabel::MidStance);
        assert_eq!(phase.right.progress, 0.5);
        assert_eq!(phase.confidence, 0.0);
    }

    #[test]
    fn test_event_outside_lookback_is_ignored() {
        let log = log_with(&[event(GaitEventType::HeelStrike, Foot::Left, 1_000, 0.9)]);
        assert!(foot_phase(&log, Foot::Left, 6_000, &config()).is_known());
        assert!(!foot_phase(&log, Foot::Left, 6_001, &config()).is_known());
    }

    #[test]
    fn test_most_recent_event_wins() {
        let log = log_with(&[
            event(GaitEventType::HeelStrike, Foot::Left, 1_000, 0.9),
            event(GaitEventType::ToeOff, Foot::Left, 1_600, 0.85),
        ]);
        let p = foot_phase(&log, Foot::Left, 1_700, &config());
        assert_eq!(p.label, PhaseLabel::ToeOff);
        assert_eq!(p.confidence, 0.85);
    }

    #[test]
    fn test_past_query_uses_event_preceding_it() {
        let log = log_with(&[
            event(GaitEventType::HeelStrike, Foot::Left, 1_000, 0.9),
            event(GaitEventType::ToeOff, Foot::Left, 1_600, 0.85),
        ]);
        let p = foot_phase(&log, Foot::Left, 1_300, &config());
        assert_eq!(p.label, PhaseLabel::FootFlat);
        assert_eq!(p.confidence, 0.9);

        assert!(!foot_phase(&log, Foot::Left, 999, &config()).is_known());
    }

    #[test]
    fn test_combined_confidence_is_min() {
        let log = log_with(&[
            event(GaitEventType::HeelStrike, Foot::Left, 1_000, 0.9),
            event(GaitEventType::ToeOff, Foot::Right, 1_050, 0.6),
        ]);
        let phase = gait_phase(&log, 1_100, &config());
        assert_eq!(phase.left.label, PhaseLabel::HeelStrike);
        assert_eq!(phase.right.label, PhaseLabel::ToeOff);
        assert_eq!(phase.confidence, 0.6);
    }

    #[test]
    fn test_one_unknown_foot_zeroes_combined_confidence() {
        let log = log_with(&[event(GaitEventType::HeelStrike, Foot::Left, 1_000, 0.9)]);
        let phase = gait_phase(&log, 1_100, &config());
        assert!(phase.left.is_known());
        assert_eq!(phase.confidence, 0.0);
    }

    #[test]
    fn test_pure_function_of_inputs() {
        let log = log_with(&[event(GaitEventType::ToeOff, Foot::Right, 500, 0.7)]);
        let a = gait_phase(&log, 900, &config());
        let b = gait_phase(&log, 900, &config());
        assert_eq!(a, b);
    }
}
