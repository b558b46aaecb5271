//! Per-frame findings and the batch commit buffer.
//!
//! Findings accumulate per frame and are flushed to the store in batches:
//! one transaction per `batch_frames` frames bounds commit overhead, and
//! each committed batch advances the crash-recovery checkpoint.

use custodia_db::models::detection::CreateDetectedObject;
use custodia_db::models::face::CreateFaceObservation;
use custodia_inference::harness::DegradedNote;

/// Everything one frame contributed to the run.
#[derive(Debug, Default)]
pub struct FrameFindings {
    pub frame_number: i64,
    pub timestamp_secs: f64,
    pub detections: Vec<CreateDetectedObject>,
    pub faces: Vec<CreateFaceObservation>,
    /// Weapon classes seen on this frame (post-filter over detections).
    pub weapon_classes: Vec<String>,
    /// Degraded stage calls, surfaced in the run diagnostics.
    pub notes: Vec<DegradedNote>,
}

/// The highest frame number in a batch (the checkpoint value it commits).
pub fn highest_frame(batch: &[FrameFindings]) -> i64 {
    batch.iter().map(|f| f.frame_number).max().unwrap_or(-1)
}

/// Accumulates frame findings until a full batch is ready to flush.
#[derive(Debug)]
pub struct BatchBuffer {
    batch_frames: usize,
    pending: Vec<FrameFindings>,
}

impl BatchBuffer {
    pub fn new(batch_frames: usize) -> Self {
        Self {
            batch_frames: batch_frames.max(1),
            pending: Vec::new(),
        }
    }

    /// Add one frame's findings. Returns a full batch when the buffer
    /// reaches the configured size.
    pub fn push(&mut self, findings: FrameFindings) -> Option<Vec<FrameFindings>> {
        self.pending.push(findings);
        if self.pending.len() >= self.batch_frames {
            Some(std::mem::take(&mut self.pending))
        } else {
            None
        }
    }

    /// Take whatever remains after the last full batch.
    pub fn drain(&mut self) -> Option<Vec<FrameFindings>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(number: i64) -> FrameFindings {
        FrameFindings {
            frame_number: number,
            timestamp_secs: number as f64 / 30.0,
            ..Default::default()
        }
    }

    #[test]
    fn push_returns_batch_at_configured_size() {
        let mut buffer = BatchBuffer::new(3);
        assert!(buffer.push(frame(0)).is_none());
        assert!(buffer.push(frame(30)).is_none());
        let batch = buffer.push(frame(60)).expect("third frame completes a batch");
        assert_eq!(batch.len(), 3);
        // Buffer restarts empty.
        assert!(buffer.push(frame(90)).is_none());
    }

    #[test]
    fn drain_returns_partial_remainder() {
        let mut buffer = BatchBuffer::new(3);
        buffer.push(frame(0));
        buffer.push(frame(30));
        let remainder = buffer.drain().expect("two pending frames remain");
        assert_eq!(remainder.len(), 2);
        assert!(buffer.drain().is_none());
    }

    #[test]
    fn drain_of_empty_buffer_is_none() {
        let mut buffer = BatchBuffer::new(5);
        assert!(buffer.drain().is_none());
    }

    #[test]
    fn zero_batch_size_is_clamped_to_one() {
        let mut buffer = BatchBuffer::new(0);
        assert!(buffer.push(frame(0)).is_some());
    }

    #[test]
    fn highest_frame_of_batch() {
        let batch = vec![frame(30), frame(90), frame(60)];
        assert_eq!(highest_frame(&batch), 90);
    }

    #[test]
    fn highest_frame_of_empty_batch_is_sentinel() {
        assert_eq!(highest_frame(&[]), -1);
    }
}
