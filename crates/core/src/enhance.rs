//! Image enhancement for extracted face crops.
//!
//! A learned super-resolution model is an external collaborator; which
//! enhancer runs is decided once at initialization by picking an
//! [`Enhancer`] implementation. [`InterpolationEnhancer`] is the
//! deterministic fallback: high-quality interpolation, a sharpening
//! convolution, then light denoising. Quality metrics are diagnostic only
//! and never gate the pipeline.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};
use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default upscale factor when no target size is requested.
pub const DEFAULT_UPSCALE_FACTOR: u32 = 4;

/// 3x3 sharpening kernel applied after interpolation.
const SHARPEN_KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];

/// Gaussian sigma for the post-sharpen denoising pass.
const DENOISE_SIGMA: f32 = 0.7;

// ---------------------------------------------------------------------------
// Enhancer capability
// ---------------------------------------------------------------------------

/// An image enhancement capability, selected at initialization.
pub trait Enhancer: Send + Sync {
    /// Produce an upscaled version of `image`.
    ///
    /// `target_size` of `None` scales by the enhancer's native factor.
    fn enhance(&self, image: &DynamicImage, target_size: Option<(u32, u32)>) -> DynamicImage;

    /// Short identifier for diagnostics.
    fn name(&self) -> &'static str;
}

/// Deterministic interpolation-based enhancer.
///
/// Used whenever a learned super-resolution model is not configured;
/// produces a usable, lower-fidelity result rather than failing the job.
pub struct InterpolationEnhancer {
    scale: u32,
}

impl InterpolationEnhancer {
    pub fn new(scale: u32) -> Self {
        Self { scale: scale.max(1) }
    }
}

impl Default for InterpolationEnhancer {
    fn default() -> Self {
        Self::new(DEFAULT_UPSCALE_FACTOR)
    }
}

impl Enhancer for InterpolationEnhancer {
    fn enhance(&self, image: &DynamicImage, target_size: Option<(u32, u32)>) -> DynamicImage {
        let (width, height) = match target_size {
            Some(size) => size,
            None => (image.width() * self.scale, image.height() * self.scale),
        };

        let upscaled = image.resize_exact(width.max(1), height.max(1), FilterType::Lanczos3);
        let sharpened = image::imageops::filter3x3(&upscaled.to_rgb8(), &SHARPEN_KERNEL);
        let denoised = image::imageops::blur(&sharpened, DENOISE_SIGMA);
        DynamicImage::ImageRgb8(denoised)
    }

    fn name(&self) -> &'static str {
        "interpolation"
    }
}

// ---------------------------------------------------------------------------
// Resolution tiers
// ---------------------------------------------------------------------------

/// Named output resolution tiers for enhanced face crops.
///
/// Face crops are square; the tier names follow the video vocabulary the
/// investigators use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    UltraHd,
    FullHd,
    Hd,
}

impl ResolutionTier {
    /// Parse a tier from its configured name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "4k" => Ok(Self::UltraHd),
            "1080p" => Ok(Self::FullHd),
            "720p" => Ok(Self::Hd),
            other => Err(CoreError::Validation(format!(
                "Unknown resolution tier '{other}'. Must be one of: 4k, 1080p, 720p"
            ))),
        }
    }

    /// Configured name.
    pub fn name(self) -> &'static str {
        match self {
            Self::UltraHd => "4k",
            Self::FullHd => "1080p",
            Self::Hd => "720p",
        }
    }

    /// Square pixel dimensions for enhanced face output at this tier.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::UltraHd => (512, 512),
            Self::FullHd => (256, 256),
            Self::Hd => (128, 128),
        }
    }
}

// ---------------------------------------------------------------------------
// Face enhancement
// ---------------------------------------------------------------------------

/// Enhance a face crop to a named resolution tier.
///
/// Runs the configured enhancer at its native scale, resizes to the tier's
/// fixed dimensions, then applies face-specific post-processing (contrast
/// stretch and edge sharpening).
pub fn enhance_face(
    enhancer: &dyn Enhancer,
    face_crop: &DynamicImage,
    tier: ResolutionTier,
) -> DynamicImage {
    let enhanced = enhancer.enhance(face_crop, None);
    let (width, height) = tier.dimensions();
    let resized = enhanced.resize_exact(width, height, FilterType::Lanczos3);
    face_detail_pass(&resized)
}

/// Contrast stretch followed by an unsharp mask.
fn face_detail_pass(image: &DynamicImage) -> DynamicImage {
    let stretched = contrast_stretch(&image.to_rgb8());
    DynamicImage::ImageRgb8(stretched).unsharpen(2.0, 4)
}

/// Linear stretch of all channels to the full `[0, 255]` range.
fn contrast_stretch(image: &RgbImage) -> RgbImage {
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    for pixel in image.pixels() {
        for channel in pixel.0 {
            min = min.min(channel);
            max = max.max(channel);
        }
    }

    if max <= min {
        return image.clone();
    }

    let range = (max - min) as f32;
    let mut stretched = image.clone();
    for pixel in stretched.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (((*channel - min) as f32 / range) * 255.0) as u8;
        }
    }
    stretched
}

// ---------------------------------------------------------------------------
// Quality metrics
// ---------------------------------------------------------------------------

/// Diagnostic quality comparison between an original and enhanced image.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub psnr: f64,
    pub ssim: f64,
    pub sharpness_original: f64,
    pub sharpness_enhanced: f64,
    pub improvement_ratio: f64,
}

/// Compute PSNR, SSIM, and Laplacian-variance sharpness between an original
/// image and its enhanced version. The enhanced image is resized back to
/// the original's dimensions for comparison.
pub fn compare_quality(original: &DynamicImage, enhanced: &DynamicImage) -> QualityReport {
    let reference = original.to_rgb8();
    let comparison = if (enhanced.width(), enhanced.height())
        == (original.width(), original.height())
    {
        enhanced.to_rgb8()
    } else {
        enhanced
            .resize_exact(original.width(), original.height(), FilterType::Lanczos3)
            .to_rgb8()
    };

    let sharpness_original = laplacian_variance(&original.to_luma8());
    let sharpness_enhanced = laplacian_variance(
        &DynamicImage::ImageRgb8(comparison.clone()).to_luma8(),
    );

    QualityReport {
        psnr: psnr(&reference, &comparison),
        ssim: ssim_luma(&original.to_luma8(), &DynamicImage::ImageRgb8(comparison).to_luma8()),
        sharpness_original,
        sharpness_enhanced,
        improvement_ratio: if sharpness_original > 0.0 {
            sharpness_enhanced / sharpness_original
        } else {
            0.0
        },
    }
}

/// Peak signal-to-noise ratio over RGB pixels. Identical images report
/// `f64::INFINITY`.
fn psnr(a: &RgbImage, b: &RgbImage) -> f64 {
    let mut sum_sq = 0.0f64;
    let mut count = 0u64;
    for (pa, pb) in a.pixels().zip(b.pixels()) {
        for (ca, cb) in pa.0.iter().zip(pb.0.iter()) {
            let diff = *ca as f64 - *cb as f64;
            sum_sq += diff * diff;
            count += 1;
        }
    }
    if count == 0 {
        return f64::INFINITY;
    }
    let mse = sum_sq / count as f64;
    if mse == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (255.0f64 * 255.0 / mse).log10()
    }
}

/// Global structural similarity on the luma channel.
fn ssim_luma(a: &GrayImage, b: &GrayImage) -> f64 {
    const C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
    const C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

    let n = a.as_raw().len().min(b.as_raw().len()) as f64;
    if n == 0.0 {
        return 1.0;
    }

    let mean = |img: &GrayImage| img.as_raw().iter().map(|v| *v as f64).sum::<f64>() / n;
    let mean_a = mean(a);
    let mean_b = mean(b);

    let mut var_a = 0.0;
    let mut var_b = 0.0;
    let mut covar = 0.0;
    for (pa, pb) in a.as_raw().iter().zip(b.as_raw().iter()) {
        let da = *pa as f64 - mean_a;
        let db = *pb as f64 - mean_b;
        var_a += da * da;
        var_b += db * db;
        covar += da * db;
    }
    var_a /= n;
    var_b /= n;
    covar /= n;

    ((2.0 * mean_a * mean_b + C1) * (2.0 * covar + C2))
        / ((mean_a * mean_a + mean_b * mean_b + C1) * (var_a + var_b + C2))
}

/// Variance of the Laplacian response; a standard focus/sharpness measure.
fn laplacian_variance(image: &GrayImage) -> f64 {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let mut responses = Vec::with_capacity(((width - 2) * (height - 2)) as usize);
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = image.get_pixel(x, y).0[0] as f64;
            let up = image.get_pixel(x, y - 1).0[0] as f64;
            let down = image.get_pixel(x, y + 1).0[0] as f64;
            let left = image.get_pixel(x - 1, y).0[0] as f64;
            let right = image.get_pixel(x + 1, y).0[0] as f64;
            responses.push(up + down + left + right - 4.0 * center);
        }
    }

    let n = responses.len() as f64;
    let mean = responses.iter().sum::<f64>() / n;
    responses.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / n
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(size: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgb([220, 220, 220])
            } else {
                image::Rgb([40, 40, 40])
            }
        }))
    }

    // -- InterpolationEnhancer -----------------------------------------------

    #[test]
    fn enhance_without_target_scales_by_factor() {
        let enhancer = InterpolationEnhancer::default();
        let out = enhancer.enhance(&checkerboard(16), None);
        assert_eq!(
            (out.width(), out.height()),
            (16 * DEFAULT_UPSCALE_FACTOR, 16 * DEFAULT_UPSCALE_FACTOR)
        );
    }

    #[test]
    fn enhance_with_target_uses_exact_size() {
        let enhancer = InterpolationEnhancer::default();
        let out = enhancer.enhance(&checkerboard(16), Some((100, 60)));
        assert_eq!((out.width(), out.height()), (100, 60));
    }

    #[test]
    fn enhancer_reports_its_name() {
        assert_eq!(InterpolationEnhancer::default().name(), "interpolation");
    }

    // -- ResolutionTier ------------------------------------------------------

    #[test]
    fn tier_from_name_roundtrip() {
        for name in ["4k", "1080p", "720p"] {
            let tier = ResolutionTier::from_name(name).unwrap();
            assert_eq!(tier.name(), name);
        }
    }

    #[test]
    fn unknown_tier_rejected() {
        assert!(ResolutionTier::from_name("8k").is_err());
        assert!(ResolutionTier::from_name("").is_err());
    }

    #[test]
    fn tier_dimensions_are_square_and_ordered() {
        assert_eq!(ResolutionTier::UltraHd.dimensions(), (512, 512));
        assert_eq!(ResolutionTier::FullHd.dimensions(), (256, 256));
        assert_eq!(ResolutionTier::Hd.dimensions(), (128, 128));
    }

    // -- enhance_face --------------------------------------------------------

    #[test]
    fn enhanced_face_matches_tier_dimensions() {
        let enhancer = InterpolationEnhancer::default();
        let out = enhance_face(&enhancer, &checkerboard(20), ResolutionTier::FullHd);
        assert_eq!((out.width(), out.height()), (256, 256));
    }

    // -- Quality metrics -----------------------------------------------------

    #[test]
    fn psnr_of_identical_images_is_infinite() {
        let image = checkerboard(16);
        let report = compare_quality(&image, &image);
        assert!(report.psnr.is_infinite());
    }

    #[test]
    fn ssim_of_identical_images_is_one() {
        let image = checkerboard(16);
        let report = compare_quality(&image, &image);
        assert!((report.ssim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn flat_image_has_zero_sharpness() {
        let flat = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, image::Rgb([128; 3])));
        let report = compare_quality(&flat, &flat);
        assert_eq!(report.sharpness_original, 0.0);
        assert_eq!(report.improvement_ratio, 0.0);
    }

    #[test]
    fn quality_compare_tolerates_different_sizes() {
        let original = checkerboard(16);
        let enhanced = checkerboard(64);
        let report = compare_quality(&original, &enhanced);
        assert!(report.psnr > 0.0);
        assert!((0.0..=1.0 + 1e-9).contains(&report.ssim.abs()));
    }
}
