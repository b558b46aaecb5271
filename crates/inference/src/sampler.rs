//! Deterministic, time-indexed frame sampling.
//!
//! Sampling takes every `floor(native_fps / target_fps)`-th frame, so each
//! sampled frame's timestamp is exactly `frame_number / native_fps`. The
//! sampler is finite and single-pass: the plan is computed up front from
//! the probe, and each `next_frame` call decodes exactly one frame, so
//! memory holds at most the frames currently in flight.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use custodia_core::video::{self, VideoSourceError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for sampling operations.
#[derive(Debug, thiserror::Error)]
pub enum SamplerError {
    #[error("unable to read video source: {0}")]
    UnreadableSource(#[from] VideoSourceError),

    #[error("invalid frame rate: native {native} fps, target {target} fps")]
    InvalidFrameRate { native: f64, target: f64 },
}

// ---------------------------------------------------------------------------
// Probing
// ---------------------------------------------------------------------------

/// Media properties needed before sampling.
#[derive(Debug, Clone)]
pub struct VideoProperties {
    pub duration_secs: f64,
    pub fps: f64,
    pub width: i32,
    pub height: i32,
    pub codec: String,
    pub total_frames: i64,
    pub file_size_bytes: i64,
}

/// Probe a video file for the properties the pipeline persists and the
/// sampler plans from.
pub async fn probe_properties(path: &Path) -> Result<VideoProperties, SamplerError> {
    let probe = video::probe_video(path).await?;
    let (width, height) = video::parse_resolution(&probe);
    Ok(VideoProperties {
        duration_secs: video::parse_duration(&probe),
        fps: video::parse_framerate(&probe),
        width,
        height,
        codec: video::parse_video_codec(&probe),
        total_frames: video::parse_total_frames(&probe),
        file_size_bytes: video::parse_file_size(&probe),
    })
}

// ---------------------------------------------------------------------------
// Sampling plan
// ---------------------------------------------------------------------------

/// One planned sample: frame index plus its derived timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedFrame {
    pub frame_number: i64,
    pub timestamp_secs: f64,
}

/// Sampling interval in source frames: `floor(native / target)`, at least 1.
///
/// Fails with `InvalidFrameRate` when either rate is zero or negative (the
/// division-by-zero hazard lives here, not at call sites).
pub fn sample_interval(native_fps: f64, target_fps: f64) -> Result<i64, SamplerError> {
    if native_fps <= 0.0 || target_fps <= 0.0 {
        return Err(SamplerError::InvalidFrameRate {
            native: native_fps,
            target: target_fps,
        });
    }
    Ok(((native_fps / target_fps).floor() as i64).max(1))
}

/// Plan the sampled frame indices for a video.
///
/// Frames are taken at multiples of the sampling interval in increasing
/// order, with `timestamp = frame_number / native_fps`, optionally bounded
/// by `max_frames`.
pub fn plan_frames(
    native_fps: f64,
    target_fps: f64,
    total_frames: i64,
    max_frames: Option<usize>,
) -> Result<Vec<PlannedFrame>, SamplerError> {
    let interval = sample_interval(native_fps, target_fps)?;

    let mut plan = Vec::new();
    let mut frame_number = 0i64;
    while frame_number < total_frames {
        plan.push(PlannedFrame {
            frame_number,
            timestamp_secs: frame_number as f64 / native_fps,
        });
        if let Some(max) = max_frames {
            if plan.len() >= max {
                break;
            }
        }
        frame_number += interval;
    }
    Ok(plan)
}

// ---------------------------------------------------------------------------
// FrameSampler
// ---------------------------------------------------------------------------

/// A sampled frame ready for inference.
pub struct SampledFrame {
    pub frame_number: i64,
    pub timestamp_secs: f64,
    pub image: DynamicImage,
}

/// Lazy single-pass frame source for one video.
///
/// Obtain with [`FrameSampler::open`]; drain with [`FrameSampler::next_frame`]
/// until it returns `None`. Reopening the source is the only way to restart.
pub struct FrameSampler {
    video_path: PathBuf,
    plan: std::vec::IntoIter<PlannedFrame>,
    total_planned: usize,
}

impl FrameSampler {
    /// Probe the source and build a sampler at the target rate.
    pub async fn open(
        path: &Path,
        target_fps: f64,
        max_frames: Option<usize>,
    ) -> Result<(Self, VideoProperties), SamplerError> {
        let properties = probe_properties(path).await?;
        let plan = plan_frames(
            properties.fps,
            target_fps,
            properties.total_frames,
            max_frames,
        )?;
        let total_planned = plan.len();
        Ok((
            Self {
                video_path: path.to_path_buf(),
                plan: plan.into_iter(),
                total_planned,
            },
            properties,
        ))
    }

    /// Number of frames this sampler will yield in total.
    pub fn total_planned(&self) -> usize {
        self.total_planned
    }

    /// Decode and return the next planned frame, or `None` when drained.
    pub async fn next_frame(&mut self) -> Result<Option<SampledFrame>, SamplerError> {
        let Some(planned) = self.plan.next() else {
            return Ok(None);
        };
        let image = video::extract_frame(&self.video_path, planned.timestamp_secs).await?;
        Ok(Some(SampledFrame {
            frame_number: planned.frame_number,
            timestamp_secs: planned.timestamp_secs,
            image,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- sample_interval -----------------------------------------------------

    #[test]
    fn interval_for_thirty_native_one_target() {
        assert_eq!(sample_interval(30.0, 1.0).unwrap(), 30);
    }

    #[test]
    fn interval_floors_fractional_ratio() {
        assert_eq!(sample_interval(29.97, 1.0).unwrap(), 29);
    }

    #[test]
    fn interval_is_at_least_one() {
        assert_eq!(sample_interval(10.0, 30.0).unwrap(), 1);
    }

    #[test]
    fn zero_native_rate_is_invalid() {
        assert!(matches!(
            sample_interval(0.0, 1.0),
            Err(SamplerError::InvalidFrameRate { .. })
        ));
    }

    #[test]
    fn zero_target_rate_is_invalid() {
        assert!(matches!(
            sample_interval(30.0, 0.0),
            Err(SamplerError::InvalidFrameRate { .. })
        ));
    }

    #[test]
    fn negative_rate_is_invalid() {
        assert!(sample_interval(-30.0, 1.0).is_err());
    }

    // -- plan_frames ---------------------------------------------------------

    #[test]
    fn plan_yields_interval_multiples() {
        let plan = plan_frames(30.0, 1.0, 90, None).unwrap();
        let indices: Vec<i64> = plan.iter().map(|p| p.frame_number).collect();
        assert_eq!(indices, vec![0, 30, 60]);
    }

    #[test]
    fn plan_timestamps_derive_from_native_rate() {
        let plan = plan_frames(30.0, 1.0, 90, None).unwrap();
        for entry in &plan {
            let expected = entry.frame_number as f64 / 30.0;
            assert!((entry.timestamp_secs - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn plan_is_bounded_by_max_frames() {
        let plan = plan_frames(30.0, 1.0, 30_000, Some(5)).unwrap();
        assert_eq!(plan.len(), 5);
        assert_eq!(plan.last().unwrap().frame_number, 120);
    }

    #[test]
    fn plan_is_strictly_increasing() {
        let plan = plan_frames(24.0, 2.0, 240, None).unwrap();
        for pair in plan.windows(2) {
            assert!(pair[0].frame_number < pair[1].frame_number);
        }
    }

    #[test]
    fn empty_video_plans_no_frames() {
        let plan = plan_frames(30.0, 1.0, 0, None).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn plan_propagates_invalid_frame_rate() {
        assert!(plan_frames(0.0, 1.0, 100, None).is_err());
    }
}
