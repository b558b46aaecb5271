use sqlx::PgPool;

use custodia_db::models::status::VideoStatus;
use custodia_db::models::video::{AnalysisResults, CreateVideo};
use custodia_db::repositories::VideoRepo;

fn sample_video(hash: &str) -> CreateVideo {
    CreateVideo {
        filename: format!("{hash}.mp4"),
        original_filename: "incident.mp4".to_string(),
        storage_path: format!("videos/{hash}.mp4"),
        sha256_hash: hash.to_string(),
        sha512_hash: Some(format!("{hash}{hash}")),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_starts_in_uploaded_state(pool: PgPool) {
    let video = VideoRepo::create(&pool, &sample_video("aaa111")).await.unwrap();
    assert_eq!(video.status_id, VideoStatus::Uploaded.id());
    assert_eq!(video.progress_percent, 0);
    assert_eq!(video.last_committed_frame, -1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_hash_is_rejected_before_processing(pool: PgPool) {
    VideoRepo::create(&pool, &sample_video("dup123")).await.unwrap();

    let duplicate = VideoRepo::create(&pool, &sample_video("dup123")).await;
    assert!(duplicate.is_err(), "identical bytes must be rejected");

    // Dedup lookup finds the original.
    let existing = VideoRepo::find_by_hash(&pool, "dup123").await.unwrap();
    assert!(existing.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn begin_processing_only_from_uploaded_or_failed(pool: PgPool) {
    let video = VideoRepo::create(&pool, &sample_video("bbb222")).await.unwrap();

    assert!(VideoRepo::begin_processing(&pool, video.id).await.unwrap());

    // Already Processing: a redelivered job must be a no-op.
    assert!(!VideoRepo::begin_processing(&pool, video.id).await.unwrap());

    // Failed evidence can be retried.
    VideoRepo::fail(&pool, video.id, "storage outage").await.unwrap();
    assert!(VideoRepo::begin_processing(&pool, video.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completed_is_terminal(pool: PgPool) {
    let video = VideoRepo::create(&pool, &sample_video("ccc333")).await.unwrap();
    VideoRepo::begin_processing(&pool, video.id).await.unwrap();

    let results = AnalysisResults {
        faces_detected: 0,
        objects_detected: 0,
        frames_analyzed: 10,
    };
    VideoRepo::complete(&pool, video.id, &results).await.unwrap();

    let video = VideoRepo::find_by_id(&pool, video.id).await.unwrap().unwrap();
    assert_eq!(video.status_id, VideoStatus::Completed.id());
    assert_eq!(video.progress_percent, 100);
    assert!(video.processed_at.is_some());

    // No re-entry into Processing once terminal-completed.
    assert!(!VideoRepo::begin_processing(&pool, video.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn progress_never_regresses(pool: PgPool) {
    let video = VideoRepo::create(&pool, &sample_video("ddd444")).await.unwrap();

    VideoRepo::update_progress(&pool, video.id, 30).await.unwrap();
    VideoRepo::update_progress(&pool, video.id, 55).await.unwrap();
    VideoRepo::update_progress(&pool, video.id, 40).await.unwrap();

    let video = VideoRepo::find_by_id(&pool, video.id).await.unwrap().unwrap();
    assert_eq!(video.progress_percent, 55);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_run_records_error(pool: PgPool) {
    let video = VideoRepo::create(&pool, &sample_video("eee555")).await.unwrap();
    VideoRepo::begin_processing(&pool, video.id).await.unwrap();
    VideoRepo::fail(&pool, video.id, "run time budget exceeded").await.unwrap();

    let video = VideoRepo::find_by_id(&pool, video.id).await.unwrap().unwrap();
    assert_eq!(video.status_id, VideoStatus::Failed.id());
    assert_eq!(video.error_message.as_deref(), Some("run time budget exceeded"));
}
