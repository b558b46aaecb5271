//! Motion analysis over a window of sampled frames.
//!
//! Consecutive grayscale frames are differenced, the absolute differences
//! accumulated per pixel, and the accumulator min-max normalized to `[0, 1]`.
//! The movement score is the fraction of pixels whose normalized motion
//! exceeds a fixed threshold; hotspots are grid cells whose mean normalized
//! motion exceeds a stricter one. Zero or one input frames produce a
//! well-defined zero-motion result with a black heatmap.

use image::{GrayImage, Rgb, RgbImage};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Heatmap dimensions used when no frames are available to size it from.
pub const HEATMAP_DEFAULT_WIDTH: u32 = 640;
pub const HEATMAP_DEFAULT_HEIGHT: u32 = 480;

/// A pixel counts toward the movement score above this normalized motion.
pub const MOTION_PIXEL_THRESHOLD: f32 = 0.25;

/// Hotspot grid resolution (cells per axis).
pub const HOTSPOT_GRID: u32 = 8;

/// A grid cell is a hotspot when its mean normalized motion exceeds this.
pub const HOTSPOT_CELL_THRESHOLD: f32 = 0.5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A high-motion region: the center of a grid cell plus its mean intensity.
#[derive(Debug, Clone, Serialize)]
pub struct Hotspot {
    pub x: u32,
    pub y: u32,
    pub intensity: f32,
}

/// Aggregated motion data for one window of frames.
#[derive(Debug)]
pub struct MotionAnalysis {
    /// Fraction of pixels with normalized motion above
    /// [`MOTION_PIXEL_THRESHOLD`], in `[0.0, 1.0]`.
    pub movement_score: f64,
    pub hotspots: Vec<Hotspot>,
    /// Heat-colored rendering of the normalized accumulator.
    pub heatmap: RgbImage,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Analyze motion over an ordered window of grayscale frames.
///
/// Frames whose dimensions differ from the first frame are skipped.
pub fn analyze_motion(frames: &[GrayImage]) -> MotionAnalysis {
    let Some(first) = frames.first() else {
        return empty_analysis(HEATMAP_DEFAULT_WIDTH, HEATMAP_DEFAULT_HEIGHT);
    };
    let (width, height) = first.dimensions();

    if frames.len() < 2 {
        return empty_analysis(width, height);
    }

    // Per-pixel accumulation of absolute differences between consecutive
    // frames.
    let mut accumulator = vec![0.0f32; (width * height) as usize];
    for pair in frames.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.dimensions() != (width, height) || prev.dimensions() != (width, height) {
            continue;
        }
        for (acc, (a, b)) in accumulator
            .iter_mut()
            .zip(prev.as_raw().iter().zip(next.as_raw().iter()))
        {
            *acc += (*a as f32 - *b as f32).abs();
        }
    }

    let normalized = normalize(&accumulator);

    let moving = normalized
        .iter()
        .filter(|v| **v > MOTION_PIXEL_THRESHOLD)
        .count();
    let movement_score = moving as f64 / normalized.len() as f64;

    MotionAnalysis {
        movement_score,
        hotspots: find_hotspots(&normalized, width, height),
        heatmap: render_heatmap(&normalized, width, height),
    }
}

fn empty_analysis(width: u32, height: u32) -> MotionAnalysis {
    MotionAnalysis {
        movement_score: 0.0,
        hotspots: Vec::new(),
        heatmap: RgbImage::new(width, height),
    }
}

/// Min-max normalize the accumulator into `[0, 1]`. A flat accumulator
/// (no motion at all) normalizes to all zeros.
fn normalize(accumulator: &[f32]) -> Vec<f32> {
    let min = accumulator.iter().copied().fold(f32::INFINITY, f32::min);
    let max = accumulator.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !min.is_finite() || max <= min {
        return vec![0.0; accumulator.len()];
    }
    let range = max - min;
    accumulator.iter().map(|v| (v - min) / range).collect()
}

/// Scan an `HOTSPOT_GRID` x `HOTSPOT_GRID` grid and report cells whose mean
/// normalized motion exceeds [`HOTSPOT_CELL_THRESHOLD`].
fn find_hotspots(normalized: &[f32], width: u32, height: u32) -> Vec<Hotspot> {
    let cell_w = (width / HOTSPOT_GRID).max(1);
    let cell_h = (height / HOTSPOT_GRID).max(1);
    let mut hotspots = Vec::new();

    for gy in 0..HOTSPOT_GRID {
        for gx in 0..HOTSPOT_GRID {
            let x0 = gx * cell_w;
            let y0 = gy * cell_h;
            if x0 >= width || y0 >= height {
                continue;
            }
            let x1 = (x0 + cell_w).min(width);
            let y1 = (y0 + cell_h).min(height);

            let mut sum = 0.0f32;
            let mut count = 0u32;
            for y in y0..y1 {
                for x in x0..x1 {
                    sum += normalized[(y * width + x) as usize];
                    count += 1;
                }
            }

            let mean = sum / count as f32;
            if mean > HOTSPOT_CELL_THRESHOLD {
                hotspots.push(Hotspot {
                    x: x0 + (x1 - x0) / 2,
                    y: y0 + (y1 - y0) / 2,
                    intensity: mean,
                });
            }
        }
    }

    hotspots
}

/// Render the normalized accumulator as a heat-colored image.
fn render_heatmap(normalized: &[f32], width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        heat_color(normalized[(y * width + x) as usize])
    })
}

/// Map a normalized motion value to a blue-to-red heat color.
fn heat_color(v: f32) -> Rgb<u8> {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8;
    let r = 1.5 - (4.0 * v - 3.0).abs();
    let g = 1.5 - (4.0 * v - 2.0).abs();
    let b = 1.5 - (4.0 * v - 1.0).abs();
    Rgb([channel(r), channel(g), channel(b)])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// A frame with a bright square at the given offset, black elsewhere.
    fn frame_with_square(offset: u32) -> GrayImage {
        GrayImage::from_fn(64, 64, |x, y| {
            let inside = x >= offset && x < offset + 8 && y >= 16 && y < 24;
            image::Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn no_frames_yields_black_default_heatmap() {
        let analysis = analyze_motion(&[]);
        assert_eq!(analysis.movement_score, 0.0);
        assert!(analysis.hotspots.is_empty());
        assert_eq!(
            analysis.heatmap.dimensions(),
            (HEATMAP_DEFAULT_WIDTH, HEATMAP_DEFAULT_HEIGHT)
        );
    }

    #[test]
    fn single_frame_yields_zero_motion() {
        let analysis = analyze_motion(&[frame_with_square(0)]);
        assert_eq!(analysis.movement_score, 0.0);
        assert!(analysis.hotspots.is_empty());
        assert_eq!(analysis.heatmap.dimensions(), (64, 64));
    }

    #[test]
    fn identical_frames_yield_zero_score() {
        let frames = vec![frame_with_square(10), frame_with_square(10)];
        let analysis = analyze_motion(&frames);
        assert_eq!(analysis.movement_score, 0.0);
        assert!(analysis.hotspots.is_empty());
    }

    #[test]
    fn moving_square_produces_motion_and_hotspots() {
        let frames: Vec<GrayImage> = (0..6).map(|i| frame_with_square(i * 8)).collect();
        let analysis = analyze_motion(&frames);
        assert!(analysis.movement_score > 0.0);
        assert!(!analysis.hotspots.is_empty());
        // The square moves along y in 16..24, so hotspots sit on that band.
        for spot in &analysis.hotspots {
            assert!(spot.y >= 8 && spot.y < 32, "hotspot y = {}", spot.y);
        }
    }

    #[test]
    fn movement_score_is_bounded() {
        let frames: Vec<GrayImage> = (0..4).map(|i| frame_with_square(i * 16)).collect();
        let score = analyze_motion(&frames).movement_score;
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn heat_color_endpoints() {
        // Low motion renders blue-ish, high motion red-ish.
        let cold = heat_color(0.0);
        let hot = heat_color(1.0);
        assert!(cold[2] > cold[0]);
        assert!(hot[0] > hot[2]);
    }
}
