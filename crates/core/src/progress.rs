//! Processing progress phases and the monotonic progress guard.
//!
//! Progress is reported as an integer percentage that must be
//! non-decreasing as observed by any external reader. The phase constants
//! fix how much of the bar each pipeline step owns; the per-frame span
//! (30-80) is interpolated by completed frame count.

// ---------------------------------------------------------------------------
// Phase constants
// ---------------------------------------------------------------------------

/// Raw bytes retrieved and integrity re-hashed.
pub const PROGRESS_DOWNLOAD: i16 = 10;
/// Duration / frame rate / resolution extracted and persisted.
pub const PROGRESS_METADATA: i16 = 20;
/// Thumbnail generated and stored.
pub const PROGRESS_THUMBNAIL: i16 = 25;
/// Frame sampling started; start of the per-frame span.
pub const PROGRESS_FRAMES_START: i16 = 30;
/// End of the per-frame span.
pub const PROGRESS_FRAMES_END: i16 = 80;
/// Motion summary computed.
pub const PROGRESS_MOTION: i16 = 85;
/// Aggregate results being finalized.
pub const PROGRESS_FINALIZE: i16 = 95;
/// Terminal progress on successful completion.
pub const PROGRESS_COMPLETE: i16 = 100;

// ---------------------------------------------------------------------------
// Frame-span interpolation
// ---------------------------------------------------------------------------

/// Map completed frame count into the per-frame progress span.
///
/// With `total_frames == 0` the span is considered already finished.
pub fn frame_progress(completed_frames: usize, total_frames: usize) -> i16 {
    if total_frames == 0 || completed_frames >= total_frames {
        return PROGRESS_FRAMES_END;
    }
    let span = (PROGRESS_FRAMES_END - PROGRESS_FRAMES_START) as f64;
    let fraction = completed_frames as f64 / total_frames as f64;
    PROGRESS_FRAMES_START + (span * fraction) as i16
}

// ---------------------------------------------------------------------------
// Monotonic guard
// ---------------------------------------------------------------------------

/// Tracks the highest progress value reported so far and suppresses
/// regressions, so out-of-order frame completions can never move the
/// externally observed percentage backwards.
#[derive(Debug, Default)]
pub struct MonotonicProgress {
    current: i16,
}

impl MonotonicProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Propose a new progress value. Returns `Some(value)` clamped to 100
    /// when it advances past the current maximum, `None` otherwise.
    pub fn advance(&mut self, value: i16) -> Option<i16> {
        let value = value.min(PROGRESS_COMPLETE);
        if value > self.current {
            self.current = value;
            Some(value)
        } else {
            None
        }
    }

    /// The highest value reported so far.
    pub fn current(&self) -> i16 {
        self.current
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- frame_progress ------------------------------------------------------

    #[test]
    fn frame_progress_starts_at_span_start() {
        assert_eq!(frame_progress(0, 100), PROGRESS_FRAMES_START);
    }

    #[test]
    fn frame_progress_ends_at_span_end() {
        assert_eq!(frame_progress(100, 100), PROGRESS_FRAMES_END);
        assert_eq!(frame_progress(150, 100), PROGRESS_FRAMES_END);
    }

    #[test]
    fn frame_progress_midpoint() {
        assert_eq!(frame_progress(50, 100), 55);
    }

    #[test]
    fn zero_total_frames_is_a_finished_span() {
        assert_eq!(frame_progress(0, 0), PROGRESS_FRAMES_END);
    }

    #[test]
    fn frame_progress_is_nondecreasing_in_completed_count() {
        let mut last = 0;
        for done in 0..=200 {
            let p = frame_progress(done, 200);
            assert!(p >= last);
            last = p;
        }
    }

    // -- MonotonicProgress ---------------------------------------------------

    #[test]
    fn advance_reports_increases_only() {
        let mut progress = MonotonicProgress::new();
        assert_eq!(progress.advance(10), Some(10));
        assert_eq!(progress.advance(25), Some(25));
        assert_eq!(progress.advance(20), None);
        assert_eq!(progress.current(), 25);
    }

    #[test]
    fn advance_clamps_to_complete() {
        let mut progress = MonotonicProgress::new();
        assert_eq!(progress.advance(140), Some(PROGRESS_COMPLETE));
        assert_eq!(progress.advance(PROGRESS_COMPLETE), None);
    }

    #[test]
    fn repeated_value_is_suppressed() {
        let mut progress = MonotonicProgress::new();
        assert_eq!(progress.advance(50), Some(50));
        assert_eq!(progress.advance(50), None);
    }
}
