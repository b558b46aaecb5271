//! The per-evidence pipeline orchestrator.
//!
//! One [`VideoProcessor::process`] call drives a single evidence run
//! through the state machine `Uploaded -> Processing -> {Completed |
//! Failed}`: bytes are fetched and integrity-checked, frames sampled and
//! fanned out to bounded-concurrency inference, findings flushed in
//! checkpointed batch transactions, and the run finalized with custody
//! records and a completion alert. The whole run races a hard wall-clock
//! budget; exceeding it forces the `Failed` transition rather than
//! hanging.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use image::GrayImage;
use tokio::sync::mpsc;

use custodia_core::alert::{alert_types, AlertSeverity};
use custodia_core::custody::{actions, SYSTEM_ACTOR};
use custodia_core::detection::{crop_region, filter_by_class};
use custodia_core::embedding::{validate_embedding_dimension, Embedding};
use custodia_core::enhance::enhance_face;
use custodia_core::hashing;
use custodia_core::motion::analyze_motion;
use custodia_core::progress::{
    frame_progress, MonotonicProgress, PROGRESS_DOWNLOAD, PROGRESS_FINALIZE,
    PROGRESS_FRAMES_START, PROGRESS_METADATA, PROGRESS_MOTION, PROGRESS_THUMBNAIL,
};
use custodia_core::types::DbId;
use custodia_core::video::{encode_jpeg, generate_thumbnail};
use custodia_db::models::custody::CreateCustodyRecord;
use custodia_db::models::detection::CreateDetectedObject;
use custodia_db::models::face::CreateFaceObservation;
use custodia_db::models::video::{AnalysisResults, Video, VideoMetadata};
use custodia_db::repositories::{CustodyRepo, DetectionRepo, FaceRepo, MotionRepo, VideoRepo};
use custodia_db::DbPool;
use custodia_events::{EventBus, PlatformEvent};
use custodia_inference::harness::{
    run_bounded, DegradedNote, STAGE_ATTRIBUTES, STAGE_EMBEDDING, STAGE_FACE_DETECTION,
    STAGE_OBJECT_DETECTION,
};
use custodia_inference::{FrameSampler, SampledFrame, StageSet};
use custodia_storage::BlobStore;

use crate::batch::{highest_frame, BatchBuffer, FrameFindings};
use crate::config::PipelineConfig;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    pub video_id: DbId,
    pub faces_detected: i64,
    pub objects_detected: i64,
    pub frames_analyzed: i64,
    /// Stage degradations recorded during the run.
    pub degraded: Vec<DegradedNote>,
}

/// What the frame producer hands back after the sampler is drained.
struct ProducerOutput {
    motion_frames: Vec<GrayImage>,
    motion_end_secs: f64,
    skipped_committed: usize,
}

// ---------------------------------------------------------------------------
// VideoProcessor
// ---------------------------------------------------------------------------

/// Drives evidence processing runs against one database, blob store, and
/// loaded stage set.
pub struct VideoProcessor {
    pool: DbPool,
    blobs: Arc<dyn BlobStore>,
    stages: StageSet,
    bus: Arc<EventBus>,
    config: PipelineConfig,
}

impl VideoProcessor {
    pub fn new(
        pool: DbPool,
        blobs: Arc<dyn BlobStore>,
        stages: StageSet,
        bus: Arc<EventBus>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            pool,
            blobs,
            stages,
            bus,
            config,
        }
    }

    /// Run the full pipeline for one piece of evidence.
    ///
    /// Returns the run summary on success. On any unrecoverable error the
    /// evidence is transitioned to `Failed` with a `processing_failed`
    /// custody record before the error is surfaced; a run can never be
    /// left in `Processing`.
    pub async fn process(&self, video_id: DbId) -> Result<RunSummary, PipelineError> {
        let budget = self.config.run_budget;
        let outcome = match tokio::time::timeout(budget, self.execute(video_id)).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout {
                budget_secs: budget.as_secs(),
            }),
        };

        // The scratch copy is keyed by video id, so cleanup works on both
        // the success and failure paths.
        let _ = tokio::fs::remove_file(scratch_path(video_id)).await;

        match outcome {
            Ok(summary) => Ok(summary),
            Err(error) => {
                self.fail_run(video_id, &error).await;
                Err(error)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Run body
    // -----------------------------------------------------------------------

    async fn execute(&self, video_id: DbId) -> Result<RunSummary, PipelineError> {
        let video = VideoRepo::find_by_id(&self.pool, video_id)
            .await?
            .ok_or_else(|| {
                PipelineError::InvalidState(format!("video {video_id} does not exist"))
            })?;

        // Atomic entry into Processing; redelivered jobs for terminal or
        // already-running evidence become no-ops here.
        if !VideoRepo::begin_processing(&self.pool, video_id).await? {
            return Err(PipelineError::InvalidState(format!(
                "video {video_id} is not in a startable state (status {})",
                video.status_id
            )));
        }

        let checkpoint = video.last_committed_frame;
        if checkpoint >= 0 {
            tracing::info!(
                video_id,
                checkpoint,
                "Resuming after previously committed batches"
            );
        }

        let mut progress = MonotonicProgress::new();

        // Step 1: fetch the raw bytes and re-verify content integrity.
        let bytes = self.get_blob_with_retry(&video.storage_path).await?;
        let recomputed = hashing::sha256_hex(&bytes);
        if !recomputed.eq_ignore_ascii_case(&video.sha256_hash) {
            self.record_integrity_mismatch(&video, &recomputed).await;
            return Err(PipelineError::IntegrityMismatch {
                stored: video.sha256_hash.clone(),
                recomputed,
            });
        }

        let scratch = scratch_path(video_id);
        tokio::fs::write(&scratch, &bytes)
            .await
            .map_err(|e| PipelineError::UnreadableSource(e.to_string()))?;
        drop(bytes);
        self.report_progress(&mut progress, video_id, PROGRESS_DOWNLOAD).await?;

        // Step 2: probe media metadata and build the sampling plan.
        let (sampler, properties) =
            FrameSampler::open(&scratch, self.config.target_fps, self.config.max_frames).await?;
        VideoRepo::update_metadata(
            &self.pool,
            video_id,
            &VideoMetadata {
                duration_secs: properties.duration_secs,
                fps: properties.fps,
                resolution: format!("{}x{}", properties.width, properties.height),
                codec: properties.codec.clone(),
                file_size_bytes: properties.file_size_bytes,
            },
        )
        .await?;
        self.report_progress(&mut progress, video_id, PROGRESS_METADATA).await?;

        // Step 3: thumbnail.
        let thumbnail = generate_thumbnail(&scratch, properties.duration_secs)
            .await
            .map_err(|e| PipelineError::UnreadableSource(e.to_string()))?;
        let thumbnail_url = self
            .put_blob_with_retry(&thumbnail, &format!("thumbnails/{video_id}_thumb.jpg"))
            .await?;
        VideoRepo::set_thumbnail(&self.pool, video_id, &thumbnail_url).await?;
        self.report_progress(&mut progress, video_id, PROGRESS_THUMBNAIL).await?;

        // Step 4: per-frame inference with bounded parallelism.
        self.report_progress(&mut progress, video_id, PROGRESS_FRAMES_START).await?;
        let total_planned = sampler.total_planned();
        let (producer_output, degraded) = self
            .run_frame_phase(video_id, sampler, checkpoint, total_planned, &mut progress)
            .await?;

        // Step 5: motion summary over the sampled-frame prefix.
        self.persist_motion_summary(video_id, &producer_output).await?;
        self.report_progress(&mut progress, video_id, PROGRESS_MOTION).await?;

        // Step 6: finalize. Counts come from the store so a resumed run
        // includes the batches committed by the previous attempt.
        self.report_progress(&mut progress, video_id, PROGRESS_FINALIZE).await?;
        let faces_detected = FaceRepo::count_for_video(&self.pool, video_id).await?;
        let objects_detected = DetectionRepo::count_for_video(&self.pool, video_id).await?;
        let results = AnalysisResults {
            faces_detected,
            objects_detected,
            frames_analyzed: total_planned as i64,
        };
        VideoRepo::complete(&self.pool, video_id, &results).await?;

        self.append_custody(
            video_id,
            actions::PROCESSED,
            Some(&video.sha256_hash),
            serde_json::json!({
                "faces_detected": faces_detected,
                "objects_detected": objects_detected,
                "frames_analyzed": total_planned,
                "degraded_stages": &degraded,
            }),
        )
        .await?;

        self.bus.publish(
            PlatformEvent::new(format!("alert.{}", alert_types::PROCESSING_COMPLETED))
                .with_source("video", video_id)
                .with_payload(serde_json::json!({
                    "title": format!("Processing completed: {}", video.original_filename),
                    "description": format!(
                        "Detected {faces_detected} faces and {objects_detected} objects"
                    ),
                    "severity": AlertSeverity::Low.as_str(),
                    "details": {
                        "faces_detected": faces_detected,
                        "objects_detected": objects_detected,
                    },
                })),
        );

        tracing::info!(
            video_id,
            faces_detected,
            objects_detected,
            frames_analyzed = total_planned,
            "Evidence processing completed"
        );

        Ok(RunSummary {
            video_id,
            faces_detected,
            objects_detected,
            frames_analyzed: total_planned as i64,
            degraded,
        })
    }

    // -----------------------------------------------------------------------
    // Frame phase
    // -----------------------------------------------------------------------

    /// Pipelined producer/consumer fan-out over sampled frames.
    ///
    /// The producer drains the sampler into a bounded channel (back
    /// pressure keeps at most a handful of decoded frames in memory);
    /// consumers run the inference stages with `frame_concurrency` frames
    /// in flight; the single aggregator flushes findings in checkpointed
    /// batch transactions.
    async fn run_frame_phase(
        &self,
        video_id: DbId,
        mut sampler: FrameSampler,
        checkpoint: i64,
        total_planned: usize,
        progress: &mut MonotonicProgress,
    ) -> Result<(ProducerOutput, Vec<DegradedNote>), PipelineError> {
        let concurrency = self.config.frame_concurrency.max(1);
        let motion_window = self.config.motion_window_frames;
        let (tx, mut rx) = mpsc::channel::<SampledFrame>(concurrency * 2);

        let producer = tokio::spawn(async move {
            let mut output = ProducerOutput {
                motion_frames: Vec::new(),
                motion_end_secs: 0.0,
                skipped_committed: 0,
            };
            while let Some(frame) = sampler.next_frame().await? {
                if output.motion_frames.len() < motion_window {
                    output.motion_frames.push(frame.image.to_luma8());
                    output.motion_end_secs = frame.timestamp_secs;
                }
                if frame.frame_number <= checkpoint {
                    // Findings for this frame were committed by a previous
                    // attempt; re-submitting them would duplicate rows.
                    output.skipped_committed += 1;
                    continue;
                }
                if tx.send(frame).await.is_err() {
                    // Consumer side went away (run is aborting).
                    break;
                }
            }
            Ok::<ProducerOutput, custodia_inference::SamplerError>(output)
        });

        let frame_stream = futures::stream::poll_fn(move |cx| rx.poll_recv(cx));
        let mut results = frame_stream
            .map(|frame| self.analyze_frame(video_id, frame))
            .buffer_unordered(concurrency);

        let mut buffer = BatchBuffer::new(self.config.batch_frames);
        let mut degraded: Vec<DegradedNote> = Vec::new();
        let mut completed = 0usize;

        while let Some(result) = results.next().await {
            let mut findings = result?;
            degraded.append(&mut findings.notes);
            if !findings.weapon_classes.is_empty() {
                self.publish_weapon_alert(video_id, &findings);
            }

            if let Some(batch) = buffer.push(findings) {
                self.commit_batch_with_retry(video_id, &batch).await?;
            }

            completed += 1;
            self.report_progress(progress, video_id, frame_progress(completed, total_planned))
                .await?;
        }
        drop(results);

        if let Some(batch) = buffer.drain() {
            self.commit_batch_with_retry(video_id, &batch).await?;
        }

        let output = producer
            .await
            .map_err(|e| PipelineError::UnreadableSource(format!("frame producer failed: {e}")))??;

        if output.skipped_committed > 0 {
            tracing::info!(
                video_id,
                skipped = output.skipped_committed,
                processed = completed,
                "Skipped frames already committed by a previous attempt"
            );
        }

        Ok((output, degraded))
    }

    /// Run all inference stages for one frame. Stage failures degrade to
    /// empty contributions plus notes; only storage failures escalate.
    async fn analyze_frame(
        &self,
        video_id: DbId,
        frame: SampledFrame,
    ) -> Result<FrameFindings, PipelineError> {
        let mut findings = FrameFindings {
            frame_number: frame.frame_number,
            timestamp_secs: frame.timestamp_secs,
            ..Default::default()
        };

        // Object detection over the full frame.
        let (objects, note) = run_bounded(
            STAGE_OBJECT_DETECTION,
            frame.frame_number,
            self.config.stage_budget,
            Vec::new(),
            self.stages.objects.detect(&frame.image, self.config.object_confidence),
        )
        .await;
        findings.notes.extend(note);

        findings.weapon_classes = filter_by_class(&objects, &self.config.weapon_classes)
            .into_iter()
            .map(|hit| hit.class.clone())
            .collect();

        for hit in &objects {
            findings.detections.push(CreateDetectedObject {
                frame_number: frame.frame_number,
                timestamp_secs: frame.timestamp_secs,
                object_class: hit.class.clone(),
                confidence: hit.confidence,
                bbox: hit.bbox,
                snapshot_url: None,
            });
        }

        // Face detection, then the per-face chain: crop -> embed ->
        // attributes -> persist crops -> enhance -> persist enhanced.
        let (faces, note) = run_bounded(
            STAGE_FACE_DETECTION,
            frame.frame_number,
            self.config.stage_budget,
            Vec::new(),
            self.stages.faces.detect(&frame.image, self.config.face_confidence),
        )
        .await;
        findings.notes.extend(note);

        for face in &faces {
            let Some(crop) = crop_region(&frame.image, &face.bbox) else {
                continue;
            };

            let (mut embedding, note) = run_bounded(
                STAGE_EMBEDDING,
                frame.frame_number,
                self.config.stage_budget,
                Embedding::invalid(),
                self.stages.embedder.embed(&crop),
            )
            .await;
            findings.notes.extend(note);

            // A vector with the wrong dimensionality is as unusable as a
            // failed extraction; demote it to the sentinel.
            if embedding.valid {
                if let Err(e) = validate_embedding_dimension(&embedding.vector) {
                    findings.notes.push(DegradedNote {
                        stage: STAGE_EMBEDDING,
                        frame_number: frame.frame_number,
                        reason: e.to_string(),
                    });
                    embedding = Embedding::invalid();
                }
            }

            let (attributes, note) = run_bounded(
                STAGE_ATTRIBUTES,
                frame.frame_number,
                self.config.stage_budget,
                Default::default(),
                self.stages.attributes.analyze(&crop),
            )
            .await;
            findings.notes.extend(note);

            let crop_id = uuid::Uuid::new_v4();
            let crop_bytes = encode_jpeg(&crop)
                .map_err(|e| PipelineError::UnreadableSource(e.to_string()))?;
            let face_image_url = self
                .put_blob_with_retry(
                    &crop_bytes,
                    &format!("faces/{video_id}_face_{}_{crop_id}.jpg", frame.frame_number),
                )
                .await?;

            // Enhancement is CPU-bound; run it off the async executor.
            let enhancer = self.stages.enhancer.clone();
            let tier = self.config.enhancement_tier;
            let crop_for_enhance = crop.clone();
            let enhanced = tokio::task::spawn_blocking(move || {
                enhance_face(enhancer.as_ref(), &crop_for_enhance, tier)
            })
            .await
            .map_err(|e| PipelineError::UnreadableSource(format!("enhancement failed: {e}")))?;

            let enhanced_bytes = encode_jpeg(&enhanced)
                .map_err(|e| PipelineError::UnreadableSource(e.to_string()))?;
            let enhanced_face_url = self
                .put_blob_with_retry(
                    &enhanced_bytes,
                    &format!(
                        "faces_enhanced/{video_id}_face_enhanced_{}_{crop_id}.jpg",
                        frame.frame_number
                    ),
                )
                .await?;

            findings.faces.push(CreateFaceObservation {
                frame_number: frame.frame_number,
                timestamp_secs: frame.timestamp_secs,
                confidence: face.confidence,
                bbox: face.bbox,
                embedding_valid: embedding.valid,
                embedding: embedding.vector,
                age: attributes.age,
                gender: attributes.gender,
                emotion: attributes.emotion,
                ethnicity: attributes.ethnicity,
                face_image_url: Some(face_image_url),
                enhanced_face_url: Some(enhanced_face_url),
            });
        }

        Ok(findings)
    }

    // -----------------------------------------------------------------------
    // Batch commits
    // -----------------------------------------------------------------------

    /// Commit one batch transactionally, retrying with backoff. The
    /// checkpoint advances in the same transaction, so a batch either
    /// fully lands (findings + checkpoint) or not at all.
    async fn commit_batch_with_retry(
        &self,
        video_id: DbId,
        batch: &[FrameFindings],
    ) -> Result<(), PipelineError> {
        let attempts = self.config.storage_retry_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(self.config.storage_retry_base, attempt)).await;
            }
            match self.try_commit_batch(video_id, batch).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        video_id,
                        attempt = attempt + 1,
                        error = %e,
                        "Batch commit failed"
                    );
                    last_error = e.to_string();
                }
            }
        }

        Err(PipelineError::StorageUnavailable {
            attempts,
            reason: last_error,
        })
    }

    async fn try_commit_batch(
        &self,
        video_id: DbId,
        batch: &[FrameFindings],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for findings in batch {
            DetectionRepo::insert_batch(&mut *tx, video_id, &findings.detections).await?;
            FaceRepo::insert_batch(&mut *tx, video_id, &findings.faces).await?;
        }
        VideoRepo::advance_checkpoint(&mut *tx, video_id, highest_frame(batch)).await?;
        tx.commit().await
    }

    // -----------------------------------------------------------------------
    // Motion summary
    // -----------------------------------------------------------------------

    async fn persist_motion_summary(
        &self,
        video_id: DbId,
        producer_output: &ProducerOutput,
    ) -> Result<(), PipelineError> {
        let frames = producer_output.motion_frames.clone();
        let analysis = tokio::task::spawn_blocking(move || analyze_motion(&frames))
            .await
            .map_err(|e| PipelineError::UnreadableSource(format!("motion analysis failed: {e}")))?;

        let heatmap_bytes = encode_jpeg(&image::DynamicImage::ImageRgb8(analysis.heatmap))
            .map_err(|e| PipelineError::UnreadableSource(e.to_string()))?;
        let heatmap_url = self
            .put_blob_with_retry(&heatmap_bytes, &format!("heatmaps/{video_id}_heatmap.jpg"))
            .await?;

        let hotspots = serde_json::to_value(&analysis.hotspots)
            .unwrap_or_else(|_| serde_json::json!([]));
        MotionRepo::insert(
            &self.pool,
            video_id,
            &custodia_db::models::motion::CreateMotionSummary {
                start_secs: 0.0,
                end_secs: producer_output.motion_end_secs,
                movement_score: analysis.movement_score,
                hotspot_count: analysis.hotspots.len() as i32,
                hotspots,
                heatmap_url: Some(heatmap_url),
            },
        )
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Failure handling
    // -----------------------------------------------------------------------

    /// Transition the evidence to `Failed` and document the failure.
    ///
    /// Persistence errors here are logged, not propagated: the original
    /// error is what surfaces to the caller.
    async fn fail_run(&self, video_id: DbId, error: &PipelineError) {
        if error.is_noop_redelivery() {
            // The evidence was never moved out of its prior state.
            return;
        }

        if let Err(e) = VideoRepo::fail(&self.pool, video_id, &error.to_string()).await {
            tracing::error!(video_id, error = %e, "Failed to mark video as failed");
        }

        let timed_out = matches!(error, PipelineError::Timeout { .. });
        let details = serde_json::json!({
            "error": error.to_string(),
            "timed_out": timed_out,
        });
        if let Err(e) = self
            .append_custody(video_id, actions::PROCESSING_FAILED, None, details)
            .await
        {
            tracing::error!(video_id, error = %e, "Failed to append failure custody record");
        }

        self.bus.publish(
            PlatformEvent::new(format!("alert.{}", alert_types::PROCESSING_FAILED))
                .with_source("video", video_id)
                .with_payload(serde_json::json!({
                    "title": "Evidence processing failed",
                    "description": error.to_string(),
                    "severity": AlertSeverity::High.as_str(),
                })),
        );
    }

    /// An integrity mismatch is documented in the custody chain before the
    /// error surfaces; it is never silently accepted.
    async fn record_integrity_mismatch(&self, video: &Video, recomputed: &str) {
        let details = serde_json::json!({
            "stored_sha256": video.sha256_hash,
            "recomputed_sha256": recomputed,
        });
        if let Err(e) = self
            .append_custody(video.id, actions::INTEGRITY_CHECK_FAILED, None, details)
            .await
        {
            tracing::error!(
                video_id = video.id,
                error = %e,
                "Failed to append integrity-mismatch custody record"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn append_custody(
        &self,
        video_id: DbId,
        action: &str,
        content_hash: Option<&str>,
        details: serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        CustodyRepo::append(
            &self.pool,
            video_id,
            &CreateCustodyRecord {
                action: action.to_string(),
                actor: SYSTEM_ACTOR.to_string(),
                hash_before: content_hash.map(String::from),
                hash_after: content_hash.map(String::from),
                details,
            },
        )
        .await?;
        Ok(())
    }

    async fn report_progress(
        &self,
        progress: &mut MonotonicProgress,
        video_id: DbId,
        value: i16,
    ) -> Result<(), PipelineError> {
        if let Some(value) = progress.advance(value) {
            VideoRepo::update_progress(&self.pool, video_id, value).await?;
            self.bus.publish(
                PlatformEvent::new("evidence.progress")
                    .with_source("video", video_id)
                    .with_payload(serde_json::json!({ "percent": value })),
            );
        }
        Ok(())
    }

    fn publish_weapon_alert(&self, video_id: DbId, findings: &FrameFindings) {
        self.bus.publish(
            PlatformEvent::new(format!("alert.{}", alert_types::WEAPON_DETECTED))
                .with_source("video", video_id)
                .with_payload(serde_json::json!({
                    "title": "Weapon detected in evidence",
                    "description": format!(
                        "Classes {:?} at frame {} ({:.2}s)",
                        findings.weapon_classes,
                        findings.frame_number,
                        findings.timestamp_secs
                    ),
                    "severity": AlertSeverity::High.as_str(),
                    "details": {
                        "frame_number": findings.frame_number,
                        "classes": findings.weapon_classes,
                    },
                })),
        );
    }

    async fn get_blob_with_retry(&self, logical_path: &str) -> Result<Vec<u8>, PipelineError> {
        let attempts = self.config.storage_retry_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(self.config.storage_retry_base, attempt)).await;
            }
            match self.blobs.get(logical_path).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    tracing::warn!(logical_path, attempt = attempt + 1, error = %e, "Blob get failed");
                    last_error = e.to_string();
                }
            }
        }
        Err(PipelineError::StorageUnavailable {
            attempts,
            reason: last_error,
        })
    }

    async fn put_blob_with_retry(
        &self,
        bytes: &[u8],
        logical_path: &str,
    ) -> Result<String, PipelineError> {
        let attempts = self.config.storage_retry_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(self.config.storage_retry_base, attempt)).await;
            }
            match self.blobs.put(bytes, logical_path).await {
                Ok(url) => return Ok(url),
                Err(e) => {
                    tracing::warn!(logical_path, attempt = attempt + 1, error = %e, "Blob put failed");
                    last_error = e.to_string();
                }
            }
        }
        Err(PipelineError::StorageUnavailable {
            attempts,
            reason: last_error,
        })
    }
}

/// Scratch copy of the evidence bytes for ffmpeg, keyed by video id.
fn scratch_path(video_id: DbId) -> PathBuf {
    std::env::temp_dir().join(format!("custodia-evidence-{video_id}.mp4"))
}

/// Exponential backoff: `base * 2^(attempt - 1)`.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt.saturating_sub(1))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
