//! Explicit "not configured" stage variant.
//!
//! When a deployment has no model wired for a capability, the stage set
//! carries this variant instead of call sites probing for optional
//! modules. Every call reports [`StageError::Unavailable`], which the
//! harness records as a degraded frame contribution.

use async_trait::async_trait;
use image::DynamicImage;

use custodia_core::detection::{FaceHit, ObjectHit};
use custodia_core::embedding::Embedding;

use crate::stage::{
    AttributeAnalyzer, FaceAttributes, FaceDetector, FaceEmbedder, ObjectDetector, StageError,
    StageResult,
};

/// Stage variant for capabilities without a configured model.
pub struct DisabledStage;

const REASON: &str = "not configured";

#[async_trait]
impl ObjectDetector for DisabledStage {
    async fn detect(
        &self,
        _image: &DynamicImage,
        _confidence_threshold: f64,
    ) -> StageResult<Vec<ObjectHit>> {
        Err(StageError::Unavailable(REASON.to_string()))
    }
}

#[async_trait]
impl FaceDetector for DisabledStage {
    async fn detect(
        &self,
        _image: &DynamicImage,
        _confidence_threshold: f64,
    ) -> StageResult<Vec<FaceHit>> {
        Err(StageError::Unavailable(REASON.to_string()))
    }
}

#[async_trait]
impl FaceEmbedder for DisabledStage {
    async fn embed(&self, _face_crop: &DynamicImage) -> StageResult<Embedding> {
        Err(StageError::Unavailable(REASON.to_string()))
    }
}

#[async_trait]
impl AttributeAnalyzer for DisabledStage {
    async fn analyze(&self, _face_crop: &DynamicImage) -> StageResult<FaceAttributes> {
        Err(StageError::Unavailable(REASON.to_string()))
    }
}
