//! Evidence registration: the entry point ahead of the pipeline.
//!
//! Uploading is owned by an external collaborator; this module provides
//! the dedup check, the initial custody record, and job submission it
//! calls into. Identical bytes are rejected by content hash before any
//! processing work begins.

use custodia_core::custody::actions;
use custodia_core::hashing;
use custodia_db::models::custody::CreateCustodyRecord;
use custodia_db::models::job::JOB_TYPE_PROCESS_VIDEO;
use custodia_db::models::video::{CreateVideo, Video};
use custodia_db::repositories::{CustodyRepo, JobRepo, VideoRepo};
use custodia_db::DbPool;
use custodia_storage::BlobStore;

use crate::error::PipelineError;

/// Register uploaded evidence bytes and enqueue its processing job.
///
/// Computes both content hashes, rejects duplicates, stores the bytes,
/// creates the `Uploaded` video row, appends the `uploaded` custody
/// record, and submits a `process_video` job.
pub async fn register_evidence(
    pool: &DbPool,
    blobs: &dyn BlobStore,
    original_filename: &str,
    actor: &str,
    bytes: &[u8],
) -> Result<Video, PipelineError> {
    let sha256 = hashing::sha256_hex(bytes);
    let sha512 = hashing::sha512_hex(bytes);

    if VideoRepo::find_by_hash(pool, &sha256).await?.is_some() {
        return Err(PipelineError::DuplicateEvidence(sha256));
    }

    let storage_path = format!("videos/{sha256}.mp4");
    blobs
        .put(bytes, &storage_path)
        .await
        .map_err(|e| PipelineError::StorageUnavailable {
            attempts: 1,
            reason: e.to_string(),
        })?;

    let video = VideoRepo::create(
        pool,
        &CreateVideo {
            filename: format!("{sha256}.mp4"),
            original_filename: original_filename.to_string(),
            storage_path,
            sha256_hash: sha256.clone(),
            sha512_hash: Some(sha512),
        },
    )
    .await?;

    CustodyRepo::append(
        pool,
        video.id,
        &CreateCustodyRecord {
            action: actions::UPLOADED.to_string(),
            actor: actor.to_string(),
            hash_before: None,
            hash_after: Some(sha256),
            details: serde_json::json!({
                "original_filename": original_filename,
                "size_bytes": bytes.len(),
            }),
        },
    )
    .await?;

    JobRepo::submit(pool, JOB_TYPE_PROCESS_VIDEO, video.id).await?;

    Ok(video)
}
