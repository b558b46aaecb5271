//! Pipeline error taxonomy.
//!
//! Per-frame stage failures are not errors here; they degrade through the
//! inference harness and are recorded as diagnostics. These variants are
//! the run-level outcomes: each one transitions the evidence to `Failed`
//! with a `processing_failed` custody record.

use custodia_core::types::DbId;
use custodia_inference::SamplerError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("unable to read video source: {0}")]
    UnreadableSource(String),

    #[error("invalid frame rate: {0}")]
    InvalidFrameRate(String),

    #[error("storage unavailable after {attempts} attempts: {reason}")]
    StorageUnavailable { attempts: u32, reason: String },

    #[error("run exceeded its {budget_secs}s time budget")]
    Timeout { budget_secs: u64 },

    #[error("duplicate evidence: content hash {0} is already registered")]
    DuplicateEvidence(String),

    #[error("integrity mismatch: stored hash {stored}, recomputed {recomputed}")]
    IntegrityMismatch { stored: String, recomputed: String },

    #[error("invalid evidence state: {0}")]
    InvalidState(String),

    #[error("face observation {0} not found")]
    FaceNotFound(DbId),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl From<SamplerError> for PipelineError {
    fn from(error: SamplerError) -> Self {
        match error {
            SamplerError::InvalidFrameRate { .. } => Self::InvalidFrameRate(error.to_string()),
            SamplerError::UnreadableSource(inner) => Self::UnreadableSource(inner.to_string()),
        }
    }
}

impl PipelineError {
    /// Whether this error terminates a run without having corrupted
    /// anything, i.e. a redelivered job observing an already-terminal
    /// video.
    pub fn is_noop_redelivery(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn invalid_frame_rate_maps_from_sampler() {
        let error: PipelineError = SamplerError::InvalidFrameRate {
            native: 0.0,
            target: 1.0,
        }
        .into();
        assert_matches!(error, PipelineError::InvalidFrameRate(_));
    }

    #[test]
    fn only_invalid_state_is_a_noop_redelivery() {
        assert!(PipelineError::InvalidState("already completed".into()).is_noop_redelivery());
        assert!(!PipelineError::Timeout { budget_secs: 60 }.is_noop_redelivery());
        assert!(!PipelineError::DuplicateEvidence("abc".into()).is_noop_redelivery());
    }
}
