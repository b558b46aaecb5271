//! Inference stages and frame sampling.
//!
//! Detection, embedding, and attribute models are external collaborators
//! reached through the trait seams in [`stage`]; which implementation runs
//! is decided once at initialization. The [`harness`] bounds every model
//! call with a time budget and converts failures into recorded degradation
//! instead of run aborts. The [`sampler`] turns a video into a lazy,
//! single-pass sequence of time-indexed frames.

pub mod disabled;
pub mod harness;
pub mod sampler;
pub mod stage;

pub use sampler::{FrameSampler, SampledFrame, SamplerError, VideoProperties};
pub use stage::{
    AttributeAnalyzer, FaceAttributes, FaceDetector, FaceEmbedder, ObjectDetector, StageError,
    StageResult, StageSet,
};
