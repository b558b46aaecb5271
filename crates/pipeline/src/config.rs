//! Pipeline configuration loaded from environment variables.
//!
//! All fields have defaults suitable for local development; production
//! overrides come from the environment. The two distance thresholds are
//! deliberately independent: `match_distance_threshold` ranks search
//! results, `verify_distance_threshold` gates pairwise verification.

use std::time::Duration;

use custodia_core::detection::{validate_confidence_threshold, DEFAULT_WEAPON_CLASSES};
use custodia_core::embedding::{
    DEFAULT_MATCH_DISTANCE_THRESHOLD, DEFAULT_MAX_MATCHES, DEFAULT_VERIFY_DISTANCE_THRESHOLD,
};
use custodia_core::enhance::ResolutionTier;

/// Tunable parameters for one worker's pipeline runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sampled frames per second of video (default: `1.0`).
    pub target_fps: f64,
    /// Hard cap on sampled frames per run, if any.
    pub max_frames: Option<usize>,
    /// Concurrent per-frame inference tasks (default: `4`).
    pub frame_concurrency: usize,
    /// Frames per transactional batch commit (default: `10`).
    pub batch_frames: usize,
    /// Sampled-frame prefix length for the motion summary (default: `100`).
    pub motion_window_frames: usize,
    /// Object detector confidence threshold (default: `0.5`).
    pub object_confidence: f64,
    /// Face detector confidence threshold (default: `0.7`).
    pub face_confidence: f64,
    /// Maximum cosine distance for ranked similarity search (default: `0.6`).
    pub match_distance_threshold: f64,
    /// Cosine distance gate for pairwise verification (default: `0.4`).
    pub verify_distance_threshold: f64,
    /// Maximum ranked matches returned per query (default: `10`).
    pub max_face_matches: i64,
    /// Resolution tier for enhanced face crops (default: `4k`).
    pub enhancement_tier: ResolutionTier,
    /// Hard wall-clock budget for one run (default: 3600s).
    pub run_budget: Duration,
    /// Per-call time budget for one inference stage (default: 30s).
    pub stage_budget: Duration,
    /// Bounded retries for blob/batch persistence (default: `3`).
    pub storage_retry_attempts: u32,
    /// Base backoff delay between storage retries (default: 500ms).
    pub storage_retry_base: Duration,
    /// Object classes flagged as weapons.
    pub weapon_classes: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_fps: 1.0,
            max_frames: None,
            frame_concurrency: 4,
            batch_frames: 10,
            motion_window_frames: 100,
            object_confidence: 0.5,
            face_confidence: 0.7,
            match_distance_threshold: DEFAULT_MATCH_DISTANCE_THRESHOLD,
            verify_distance_threshold: DEFAULT_VERIFY_DISTANCE_THRESHOLD,
            max_face_matches: DEFAULT_MAX_MATCHES as i64,
            enhancement_tier: ResolutionTier::UltraHd,
            run_budget: Duration::from_secs(3600),
            stage_budget: Duration::from_secs(30),
            storage_retry_attempts: 3,
            storage_retry_base: Duration::from_millis(500),
            weapon_classes: DEFAULT_WEAPON_CLASSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `FRAME_EXTRACTION_FPS`     | `1.0`   |
    /// | `MAX_FRAMES_PER_VIDEO`     | unset   |
    /// | `FRAME_CONCURRENCY`        | `4`     |
    /// | `BATCH_FRAMES`             | `10`    |
    /// | `MOTION_WINDOW_FRAMES`     | `100`   |
    /// | `OBJECT_CONFIDENCE`        | `0.5`   |
    /// | `FACE_CONFIDENCE`          | `0.7`   |
    /// | `FACE_MATCH_THRESHOLD`     | `0.6`   |
    /// | `FACE_VERIFY_THRESHOLD`    | `0.4`   |
    /// | `MAX_FACE_MATCHES`         | `10`    |
    /// | `ENHANCEMENT_TIER`         | `4k`    |
    /// | `RUN_BUDGET_SECS`          | `3600`  |
    /// | `STAGE_BUDGET_SECS`        | `30`    |
    /// | `STORAGE_RETRY_ATTEMPTS`   | `3`     |
    /// | `STORAGE_RETRY_BASE_MS`    | `500`   |
    /// | `WEAPON_CLASSES`           | `knife,gun,rifle` |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let tier = std::env::var("ENHANCEMENT_TIER")
            .ok()
            .and_then(|name| ResolutionTier::from_name(&name).ok())
            .unwrap_or(defaults.enhancement_tier);

        let weapon_classes = std::env::var("WEAPON_CLASSES")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or(defaults.weapon_classes);

        let object_confidence = env_parse("OBJECT_CONFIDENCE", defaults.object_confidence);
        let face_confidence = env_parse("FACE_CONFIDENCE", defaults.face_confidence);
        for (name, value) in [
            ("OBJECT_CONFIDENCE", object_confidence),
            ("FACE_CONFIDENCE", face_confidence),
        ] {
            if let Err(e) = validate_confidence_threshold(value) {
                panic!("{name}: {e}");
            }
        }

        Self {
            target_fps: env_parse("FRAME_EXTRACTION_FPS", defaults.target_fps),
            max_frames: std::env::var("MAX_FRAMES_PER_VIDEO")
                .ok()
                .and_then(|v| v.parse().ok()),
            frame_concurrency: env_parse("FRAME_CONCURRENCY", defaults.frame_concurrency),
            batch_frames: env_parse("BATCH_FRAMES", defaults.batch_frames).max(1),
            motion_window_frames: env_parse(
                "MOTION_WINDOW_FRAMES",
                defaults.motion_window_frames,
            ),
            object_confidence,
            face_confidence,
            match_distance_threshold: env_parse(
                "FACE_MATCH_THRESHOLD",
                defaults.match_distance_threshold,
            ),
            verify_distance_threshold: env_parse(
                "FACE_VERIFY_THRESHOLD",
                defaults.verify_distance_threshold,
            ),
            max_face_matches: env_parse("MAX_FACE_MATCHES", defaults.max_face_matches),
            enhancement_tier: tier,
            run_budget: Duration::from_secs(env_parse("RUN_BUDGET_SECS", 3600u64)),
            stage_budget: Duration::from_secs(env_parse("STAGE_BUDGET_SECS", 30u64)),
            storage_retry_attempts: env_parse(
                "STORAGE_RETRY_ATTEMPTS",
                defaults.storage_retry_attempts,
            ),
            storage_retry_base: Duration::from_millis(env_parse("STORAGE_RETRY_BASE_MS", 500u64)),
            weapon_classes,
        }
    }
}

/// Parse an env var, falling back to the default on absence or parse failure.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.target_fps, 1.0);
        assert_eq!(config.batch_frames, 10);
        assert_eq!(config.motion_window_frames, 100);
        assert_eq!(config.match_distance_threshold, 0.60);
        assert_eq!(config.verify_distance_threshold, 0.40);
        assert_eq!(config.enhancement_tier, ResolutionTier::UltraHd);
    }

    #[test]
    fn ranking_and_verification_thresholds_are_independent() {
        let config = PipelineConfig::default();
        assert_ne!(
            config.match_distance_threshold,
            config.verify_distance_threshold
        );
    }
}
