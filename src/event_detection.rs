//! Gait Event Detection Module.
//!
//! Classifies ankle vertical motion into discrete heel-strike and toe-off
//! events, independently for each foot:
//! - averaged vertical velocity over the last few frames
//! - heel-strike: fast descent while the ankle is down near ground level
//! - toe-off: fast ascent, regardless of position
//! - per-foot, per-type refractory period against detector chatter
//!
//! Image `y` grows downward, so a positive velocity is a descending ankle.
//!
//! Detection is re-evaluated on every accepted frame. Left and right never
//! influence each other, so their events interleave naturally.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::DetectorConfig;
use crate::history::PoseHistory;
use crate::types::{Foot, GaitEvent, GaitEventType, PoseFrame};

// ============================================================================
// EVENT LOG
// ============================================================================

/// Append-only, time-ordered log of gait events, pruned by age.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: VecDeque<GaitEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GaitEvent) {
        self.events.push_back(event);
    }

    /// Drop every event older than `retention_ms` relative to `now_ms`.
    pub fn prune(&mut self, now_ms: u64, retention_ms: u64) {
        while let Some(front) = self.events.front() {
            if now_ms.saturating_sub(front.timestamp_ms) > retention_ms {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &GaitEvent> + '_ {
        self.events.iter()
    }

    /// Events with `timestamp > now - window_ms`, oldest first.
    pub fn recent(&self, now_ms: u64, window_ms: u64) -> Vec<GaitEvent> {
        self.events
            .iter()
            .filter(|e| now_ms.saturating_sub(e.timestamp_ms) < window_ms)
            .copied()
            .collect()
    }

    /// Most recent event for a foot stamped at or before `at_ms`.
    pub fn latest_for_at(&self, foot: Foot, at_ms: u64) -> Option<&GaitEvent> {
        self.events
            .iter()
            .rev()
            .find(|e| e.foot == foot && e.timestamp_ms <= at_ms)
    }

    /// Most recent event of one type for a foot.
    pub fn latest_of(&self, foot: Foot, event_type: GaitEventType) -> Option<&GaitEvent> {
        self.events
            .iter()
            .rev()
            .find(|e| e.foot == foot && e.event_type == event_type)
    }

    /// Heel-strikes of both feet, oldest first.
    pub fn heel_strikes(&self) -> impl DoubleEndedIterator<Item = &GaitEvent> + '_ {
        self.events.iter().filter(|e| e.is_heel_strike())
    }

    /// Heel-strikes of one foot, oldest first.
    pub fn heel_strikes_for(&self, foot: Foot) -> impl DoubleEndedIterator<Item = &GaitEvent> + '_ {
        self.events
            .iter()
            .filter(move |e| e.foot == foot && e.is_heel_strike())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// ============================================================================
// DETECTOR
// ============================================================================

/// Stateless heel-strike / toe-off classifier.
///
/// All memory lives in the [`PoseHistory`] and the [`EventLog`]; the detector
/// only holds thresholds.
#[derive(Debug, Clone)]
pub struct GaitEventDetector {
    config: DetectorConfig,
}

impl GaitEventDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Evaluate both feet against the newest frames.
    ///
    /// Returns the events to append, in left-then-right order. Fewer than
    /// `window_frames` buffered frames yields nothing.
    pub fn detect(&self, history: &PoseHistory, log: &EventLog) -> Vec<GaitEvent> {
        let window: Vec<&PoseFrame> = history.last_n(self.config.window_frames).collect();
        if window.len() < self.config.window_frames {
            return Vec::new();
        }

        Foot::BOTH
            .iter()
            .filter_map(|&foot| self.detect_foot(foot, &window, log))
            .collect()
    }

    /// Classify one foot over the given window (oldest first).
    pub fn detect_foot(&self, foot: Foot, window: &[&PoseFrame], log: &EventLog) -> Option<GaitEvent> {
        let velocity = Self::average_vertical_velocity(foot, window)?;
        let current = window.last()?;
        let ankle = current.get(foot.ankle());
        let knee = current.get(foot.knee());

        let event_type = if velocity > self.config.heel_strike_velocity
            && ankle.y >= knee.y - self.config.ground_margin_px
        {
            GaitEventType::HeelStrike
        } else if velocity < -self.config.toe_off_velocity {
            GaitEventType::ToeOff
        } else {
            return None;
        };

        if self.is_refractory(foot, event_type, current.timestamp_ms, log) {
            return None;
        }

        let event = GaitEvent::new(
            event_type,
            foot,
            current.timestamp_ms,
            ankle.position(),
            ankle.confidence.min(knee.confidence),
        );
        debug!(
            ?foot,
            ?event_type,
            timestamp_ms = event.timestamp_ms,
            velocity,
            confidence = event.confidence,
            "gait event"
        );
        Some(event)
    }

    /// Mean of the per-step ankle velocities `Δy/Δt` in px/s.
    ///
    /// Steps with a zero time delta are skipped. `None` when no step remains.
    pub fn average_vertical_velocity(foot: Foot, window: &[&PoseFrame]) -> Option<f32> {
        let landmark = foot.ankle();
        let velocities: Vec<f32> = window
            .windows(2)
            .filter_map(|pair| {
                let dt_ms = pair[1].timestamp_ms.saturating_sub(pair[0].timestamp_ms);
                if dt_ms == 0 {
                    return None;
                }
                let dy = pair[1].get(landmark).y - pair[0].get(landmark).y;
                Some(dy / (dt_ms as f32 / 1000.0))
            })
            .collect();

        if velocities.is_empty() {
            return None;
        }
        Some(velocities.iter().sum::<f32>() / velocities.len() as f32)
    }

    fn is_refractory(&self, foot: Foot, event_type: GaitEventType, now_ms: u64, log: &EventLog) -> bool {
        log.latest_of(foot, event_type).is_some_and(|last| {
            now_ms.saturating_sub(last.timestamp_ms) <= self.config.min_step_duration_ms
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

// ============================================================================
// TESTS
// ============================================================================
