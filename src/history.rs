//! Pose History Buffer.
//!
//! A bounded, time-ordered ring of recent validated frames. Every downstream
//! stage reads from it; nothing downstream writes to it.
//!
//! Admission rules:
//! - both ankles must be strictly above `min_confidence`
//! - every keypoint must be finite
//! - timestamps may not go backwards
//!
//! A frame failing any rule is dropped silently. The buffer never holds
//! placeholders for dropped frames.

use std::collections::VecDeque;

use tracing::trace;

use crate::config::HistoryConfig;
use crate::types::{Landmark, PoseFrame};

/// Outcome of an append attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    LowConfidence,
    NonFinite,
    OutOfOrder,
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        *self == Admission::Accepted
    }
}

/// Bounded FIFO of validated pose frames.
#[derive(Debug, Clone)]
pub struct PoseHistory {
    frames: VecDeque<PoseFrame>,
    capacity: usize,
    min_confidence: f32,
}

impl PoseHistory {
    pub fn new(config: &HistoryConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            min_confidence: config.min_confidence,
        }
    }

    /// Append a frame if it passes admission, evicting the oldest beyond capacity.
    pub fn append(&mut self, frame: PoseFrame) -> Admission {
        let admission = self.admission(&frame);
        if !admission.is_accepted() {
            trace!(timestamp_ms = frame.timestamp_ms, ?admission, "pose frame dropped");
            return admission;
        }

        self.frames.push_back(frame);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
        Admission::Accepted
    }

    /// Frames with `timestamp > now - window_ms`, oldest first.
    pub fn recent(&self, now_ms: u64, window_ms: u64) -> Vec<PoseFrame> {
        // Frames are time-ordered, so scan back from the newest one.
        let start = self
            .frames
            .iter()
            .rposition(|f| now_ms.saturating_sub(f.timestamp_ms) >= window_ms)
            .map_or(0, |i| i + 1);
        self.frames.range(start..).copied().collect()
    }

    /// The last `n` frames, oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &PoseFrame> + '_ {
        let skip = self.frames.len().saturating_sub(n);
        self.frames.iter().skip(skip)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Admission verdict for `frame` without buffering it.
    pub fn admission(&self, frame: &PoseFrame) -> Admission {
        if !frame.pose.is_finite() {
            return Admission::NonFinite;
        }
        let left = frame.get(Landmark::LeftAnkle);
        let right = frame.get(Landmark::RightAnkle);
        if !left.is_confident(self.min_confidence) || !right.is_confident(self.min_confidence) {
            return Admission::LowConfidence;
        }
        if let Some(latest) = self.frames.back() {
            if frame.timestamp_ms < latest.timestamp_ms {
                return Admission::OutOfOrder;
            }
        }
        Admission::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Keypoint, Pose};

    fn frame(timestamp_ms: u64, ankle_confidence: f32) -> PoseFrame {
        let pose = Pose::default()
            .with(Landmark::LeftAnkle, Keypoint::new(100.0, 400.0, ankle_confidence))
            .with(Landmark::RightAnkle, Keypoint::new(140.0, 400.0, ankle_confidence));
        PoseFrame::new(timestamp_ms, pose)
    }

    fn history(capacity: usize) -> PoseHistory {
        PoseHistory::new(&HistoryConfig {
            capacity,
            min_confidence: 0.3,
        })
    }

    #[test]
    fn test_accepts_confident_frame() {
        let mut h = history(10);
        assert_eq!(h.append(frame(0, 0.9)), Admission::Accepted);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_drops_low_confidence_ankle() {
        let mut h = history(10);
        assert_eq!(h.append(frame(0, 0.1)), Admission::LowConfidence);

        // Exactly at the threshold is not "above" it.
        assert_eq!(h.append(frame(0, 0.3)), Admission::LowConfidence);

        let one_sided = PoseFrame::new(
            0,
            frame(0, 0.9).pose.with(Landmark::RightAnkle, Keypoint::new(1.0, 1.0, 0.2)),
        );
        assert_eq!(h.append(one_sided), Admission::LowConfidence);
        assert!(h.is_empty());
    }

    #[test]
    fn test_drops_non_finite_frame() {
        let mut h = history(10);
        let bad = PoseFrame::new(
            0,
            frame(0, 0.9).pose.with(Landmark::LeftKnee, Keypoint::new(f32::INFINITY, 0.0, 0.9)),
        );
        assert_eq!(h.append(bad), Admission::NonFinite);
        assert!(h.is_empty());
    }

    #[test]
    fn test_drops_out_of_order_frame() {
        let mut h = history(10);
        h.append(frame(500, 0.9));
        assert_eq!(h.append(frame(400, 0.9)), Admission::OutOfOrder);
        assert_eq!(h.append(frame(500, 0.9)), Admission::Accepted);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_admission_check_does_not_buffer() {
        let mut h = history(10);
        h.append(frame(500, 0.9));
        assert_eq!(h.admission(&frame(600, 0.9)), Admission::Accepted);
        assert_eq!(h.admission(&frame(400, 0.9)), Admission::OutOfOrder);
        assert_eq!(h.admission(&frame(600, 0.2)), Admission::LowConfidence);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_evicts_oldest_beyond_capacity() {
        let mut h = history(3);
        for i in 0..5 {
            h.append(frame(i * 100, 0.9));
        }
        assert_eq!(h.len(), 3);
        let timestamps: Vec<u64> = h.last_n(10).map(|f| f.timestamp_ms).collect();
        assert_eq!(timestamps, vec![200, 300, 400]);
    }

    #[test]
    fn test_recent_window_is_exclusive_and_ordered() {
        let mut h = history(100);
        for i in 0..10 {
            h.append(frame(i * 100, 0.9));
        }
        // now = 900, window 300 -> timestamps > 600
        let recent = h.recent(900, 300);
        let timestamps: Vec<u64> = recent.iter().map(|f| f.timestamp_ms).collect();
        assert_eq!(timestamps, vec![700, 800, 900]);

        assert_eq!(h.recent(900, 10_000).len(), 10);
        assert!(h.recent(900, 0).is_empty());
    }

    #[test]
    fn test_last_n_shorter_history() {
        let mut h = history(10);
        h.append(frame(0, 0.9));
        h.append(frame(100, 0.9));
        assert_eq!(h.last_n(5).count(), 2);
        assert_eq!(h.last_n(1).next().map(|f| f.timestamp_ms), Some(100));
    }
}
