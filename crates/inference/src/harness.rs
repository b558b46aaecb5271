//! Per-call bounding and degradation for inference stages.
//!
//! A single pathological frame must not stall a run past its per-frame
//! allowance, and a failing stage must not abort the run: every model call
//! goes through [`run_bounded`], which enforces a time budget and converts
//! errors into an empty result plus a [`DegradedNote`] the orchestrator
//! records in the run diagnostics.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use crate::stage::StageResult;

// ---------------------------------------------------------------------------
// Stage names
// ---------------------------------------------------------------------------

pub const STAGE_OBJECT_DETECTION: &str = "object_detection";
pub const STAGE_FACE_DETECTION: &str = "face_detection";
pub const STAGE_EMBEDDING: &str = "embedding";
pub const STAGE_ATTRIBUTES: &str = "attributes";

// ---------------------------------------------------------------------------
// Degradation notes
// ---------------------------------------------------------------------------

/// A recorded degradation: which stage, on which frame, and why.
///
/// These surface in the run's diagnostic summary so degraded output is
/// distinguishable from a genuinely empty frame.
#[derive(Debug, Clone, Serialize)]
pub struct DegradedNote {
    pub stage: &'static str,
    pub frame_number: i64,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Bounded execution
// ---------------------------------------------------------------------------

/// Run one stage call under a time budget.
///
/// Returns the stage's value on success. On stage error or budget
/// exhaustion, returns `empty` plus a note; the caller's frame keeps
/// processing with the degraded contribution.
pub async fn run_bounded<T, F>(
    stage: &'static str,
    frame_number: i64,
    budget: Duration,
    empty: T,
    call: F,
) -> (T, Option<DegradedNote>)
where
    F: Future<Output = StageResult<T>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(Ok(value)) => (value, None),
        Ok(Err(e)) => {
            tracing::warn!(stage, frame_number, error = %e, "Inference stage degraded");
            (
                empty,
                Some(DegradedNote {
                    stage,
                    frame_number,
                    reason: e.to_string(),
                }),
            )
        }
        Err(_) => {
            tracing::warn!(
                stage,
                frame_number,
                budget_ms = budget.as_millis() as u64,
                "Inference stage call exceeded its time budget"
            );
            (
                empty,
                Some(DegradedNote {
                    stage,
                    frame_number,
                    reason: format!("call exceeded {}ms budget", budget.as_millis()),
                }),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageError;

    #[tokio::test]
    async fn successful_call_passes_value_through() {
        let (value, note) = run_bounded(
            STAGE_OBJECT_DETECTION,
            7,
            Duration::from_secs(1),
            Vec::new(),
            async { Ok(vec![1, 2, 3]) },
        )
        .await;
        assert_eq!(value, vec![1, 2, 3]);
        assert!(note.is_none());
    }

    #[tokio::test]
    async fn stage_error_degrades_to_empty_with_note() {
        let (value, note) = run_bounded(
            STAGE_FACE_DETECTION,
            12,
            Duration::from_secs(1),
            Vec::<i32>::new(),
            async { Err(StageError::Unavailable("not configured".to_string())) },
        )
        .await;
        assert!(value.is_empty());
        let note = note.expect("degradation must be recorded, not swallowed");
        assert_eq!(note.stage, STAGE_FACE_DETECTION);
        assert_eq!(note.frame_number, 12);
        assert!(note.reason.contains("not configured"));
    }

    #[tokio::test]
    async fn timeout_degrades_to_empty_with_note() {
        let (value, note) = run_bounded(
            STAGE_EMBEDDING,
            3,
            Duration::from_millis(20),
            0u32,
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(42u32)
            },
        )
        .await;
        assert_eq!(value, 0);
        let note = note.expect("timeout must be recorded");
        assert!(note.reason.contains("budget"));
    }
}
