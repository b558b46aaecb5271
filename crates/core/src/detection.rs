//! Detection types and class-based post-filters.
//!
//! Object and face detectors report findings as class/confidence/bounding
//! box triples. Weapon and vehicle detection are pure post-filters over the
//! object detector's output by class-name membership, not separate models.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Class sets
// ---------------------------------------------------------------------------

/// Default object classes treated as weapons.
pub const DEFAULT_WEAPON_CLASSES: &[&str] = &["knife", "gun", "rifle"];

/// Default object classes treated as vehicles.
pub const DEFAULT_VEHICLE_CLASSES: &[&str] =
    &["car", "truck", "bus", "motorcycle", "bicycle"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// A single object-class finding from the object detector.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectHit {
    pub class: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// A single detected face: location plus detector confidence.
#[derive(Debug, Clone)]
pub struct FaceHit {
    pub confidence: f64,
    pub bbox: BoundingBox,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that a confidence threshold is within `[0.0, 1.0]`.
pub fn validate_confidence_threshold(threshold: f64) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(CoreError::Validation(format!(
            "Confidence threshold must be between 0.0 and 1.0, got {threshold}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Class filters
// ---------------------------------------------------------------------------

/// Keep only hits whose class name (case-insensitive) is in `classes`.
pub fn filter_by_class<'a>(hits: &'a [ObjectHit], classes: &[String]) -> Vec<&'a ObjectHit> {
    hits.iter()
        .filter(|hit| {
            classes
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&hit.class))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Cropping
// ---------------------------------------------------------------------------

/// Crop a bounding-box region out of a frame.
///
/// The box is clamped to the image bounds. Returns `None` when the clamped
/// region is empty (a detector reporting a box entirely outside the frame,
/// or with zero area).
pub fn crop_region(image: &DynamicImage, bbox: &BoundingBox) -> Option<DynamicImage> {
    let (img_w, img_h) = (image.width() as i64, image.height() as i64);

    let x0 = (bbox.x as i64).clamp(0, img_w);
    let y0 = (bbox.y as i64).clamp(0, img_h);
    let x1 = (bbox.x as i64 + bbox.width as i64).clamp(0, img_w);
    let y1 = (bbox.y as i64 + bbox.height as i64).clamp(0, img_h);

    let (w, h) = ((x1 - x0) as u32, (y1 - y0) as u32);
    if w == 0 || h == 0 {
        return None;
    }

    Some(image.crop_imm(x0 as u32, y0 as u32, w, h))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn hit(class: &str, confidence: f64) -> ObjectHit {
        ObjectHit {
            class: class.to_string(),
            confidence,
            bbox: BoundingBox { x: 0, y: 0, width: 10, height: 10 },
        }
    }

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // -- validate_confidence_threshold ---------------------------------------

    #[test]
    fn threshold_boundaries_accepted() {
        assert!(validate_confidence_threshold(0.0).is_ok());
        assert!(validate_confidence_threshold(0.5).is_ok());
        assert!(validate_confidence_threshold(1.0).is_ok());
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        assert!(validate_confidence_threshold(-0.1).is_err());
        assert!(validate_confidence_threshold(1.1).is_err());
    }

    // -- filter_by_class -----------------------------------------------------

    #[test]
    fn weapon_filter_keeps_only_weapons() {
        let hits = vec![hit("person", 0.9), hit("knife", 0.8), hit("GUN", 0.7)];
        let weapons = filter_by_class(&hits, &classes(DEFAULT_WEAPON_CLASSES));
        assert_eq!(weapons.len(), 2);
        assert_eq!(weapons[0].class, "knife");
        assert_eq!(weapons[1].class, "GUN");
    }

    #[test]
    fn filter_with_no_matches_is_empty() {
        let hits = vec![hit("person", 0.9)];
        assert!(filter_by_class(&hits, &classes(DEFAULT_WEAPON_CLASSES)).is_empty());
    }

    #[test]
    fn filter_over_empty_input_is_empty() {
        assert!(filter_by_class(&[], &classes(DEFAULT_VEHICLE_CLASSES)).is_empty());
    }

    // -- crop_region ---------------------------------------------------------

    #[test]
    fn crop_within_bounds_has_requested_size() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(100, 80));
        let bbox = BoundingBox { x: 10, y: 20, width: 30, height: 40 };
        let crop = crop_region(&image, &bbox).unwrap();
        assert_eq!((crop.width(), crop.height()), (30, 40));
    }

    #[test]
    fn crop_is_clamped_to_image_bounds() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(100, 80));
        let bbox = BoundingBox { x: 90, y: 70, width: 50, height: 50 };
        let crop = crop_region(&image, &bbox).unwrap();
        assert_eq!((crop.width(), crop.height()), (10, 10));
    }

    #[test]
    fn crop_entirely_outside_returns_none() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(100, 80));
        let bbox = BoundingBox { x: 200, y: 200, width: 10, height: 10 };
        assert!(crop_region(&image, &bbox).is_none());
    }

    #[test]
    fn zero_area_box_returns_none() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(100, 80));
        let bbox = BoundingBox { x: 10, y: 10, width: 0, height: 5 };
        assert!(crop_region(&image, &bbox).is_none());
    }
}
