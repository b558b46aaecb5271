//! Inference stage traits and the stage set.
//!
//! Each capability is an independent, swappable unit behind a trait
//! object. Loaded models are read-only shared resources: implementations
//! must be safe for concurrent callers, and the expensive load happens
//! once per worker, not per run.

use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;

use custodia_core::detection::{FaceHit, ObjectHit};
use custodia_core::embedding::Embedding;
use custodia_core::enhance::{Enhancer, InterpolationEnhancer};

use crate::disabled::DisabledStage;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for a single inference stage call.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("model not available: {0}")]
    Unavailable(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

pub type StageResult<T> = Result<T, StageError>;

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Object detection over a full frame.
///
/// A frame with no detectable objects is an empty vec, never an error.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn detect(
        &self,
        image: &DynamicImage,
        confidence_threshold: f64,
    ) -> StageResult<Vec<ObjectHit>>;
}

/// Face detection over a full frame.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect(
        &self,
        image: &DynamicImage,
        confidence_threshold: f64,
    ) -> StageResult<Vec<FaceHit>>;
}

/// Fixed-dimensionality facial embedding extraction from a face crop.
///
/// Implementations return a complete vector or an error; the harness maps
/// errors to the invalid-embedding sentinel so downstream search can
/// filter them deterministically.
#[async_trait]
pub trait FaceEmbedder: Send + Sync {
    async fn embed(&self, face_crop: &DynamicImage) -> StageResult<Embedding>;
}

/// Demographic attribute estimation from a face crop. All fields are
/// optional; absence means "undetermined".
#[async_trait]
pub trait AttributeAnalyzer: Send + Sync {
    async fn analyze(&self, face_crop: &DynamicImage) -> StageResult<FaceAttributes>;
}

/// Estimated demographic attributes for one face.
#[derive(Debug, Clone, Default)]
pub struct FaceAttributes {
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub emotion: Option<String>,
    pub ethnicity: Option<String>,
}

// ---------------------------------------------------------------------------
// Stage set
// ---------------------------------------------------------------------------

/// The full set of per-frame inference capabilities handed to a pipeline
/// run. All stages are `Arc`-shared so concurrent frame tasks reuse the
/// same loaded models.
#[derive(Clone)]
pub struct StageSet {
    pub objects: Arc<dyn ObjectDetector>,
    pub faces: Arc<dyn FaceDetector>,
    pub embedder: Arc<dyn FaceEmbedder>,
    pub attributes: Arc<dyn AttributeAnalyzer>,
    pub enhancer: Arc<dyn Enhancer>,
}

impl StageSet {
    /// A stage set with every model capability disabled and the
    /// interpolation enhancer as the enhancement fallback.
    ///
    /// Disabled stages degrade to empty findings through the harness, so a
    /// worker with no models configured still completes runs (with zero
    /// detections recorded as degraded).
    pub fn disabled() -> Self {
        let disabled = Arc::new(DisabledStage);
        Self {
            objects: disabled.clone(),
            faces: disabled.clone(),
            embedder: disabled.clone(),
            attributes: disabled,
            enhancer: Arc::new(InterpolationEnhancer::default()),
        }
    }
}
