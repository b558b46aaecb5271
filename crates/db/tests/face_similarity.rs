use sqlx::PgPool;

use custodia_core::detection::BoundingBox;
use custodia_core::embedding::EMBEDDING_DIMENSION;
use custodia_core::types::DbId;
use custodia_db::models::face::CreateFaceObservation;
use custodia_db::models::video::CreateVideo;
use custodia_db::repositories::{FaceRepo, VideoRepo};

/// A unit vector with 1.0 at `hot`, zero elsewhere.
fn basis_embedding(hot: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIMENSION];
    v[hot] = 1.0;
    v
}

fn face(frame: i64, embedding: Vec<f32>, valid: bool) -> CreateFaceObservation {
    CreateFaceObservation {
        frame_number: frame,
        timestamp_secs: frame as f64 / 30.0,
        confidence: 0.9,
        bbox: BoundingBox { x: 10, y: 10, width: 64, height: 64 },
        embedding,
        embedding_valid: valid,
        age: Some(30),
        gender: None,
        emotion: None,
        ethnicity: None,
        face_image_url: None,
        enhanced_face_url: None,
    }
}

async fn seed_video(pool: &PgPool, hash: &str) -> DbId {
    let video = VideoRepo::create(
        pool,
        &CreateVideo {
            filename: format!("{hash}.mp4"),
            original_filename: "clip.mp4".to_string(),
            storage_path: format!("videos/{hash}.mp4"),
            sha256_hash: hash.to_string(),
            sha512_hash: None,
        },
    )
    .await
    .unwrap();
    video.id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_store_returns_empty_list(pool: PgPool) {
    let neighbors = FaceRepo::find_similar(&pool, &basis_embedding(0), 0, 2.0, 10)
        .await
        .unwrap();
    assert!(neighbors.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn neighbors_exclude_query_and_order_ascending(pool: PgPool) {
    let video_id = seed_video(&pool, "faces01").await;

    let mut near = basis_embedding(0);
    near[1] = 0.3; // close to basis 0, but not identical

    let mut tx = pool.begin().await.unwrap();
    FaceRepo::insert_batch(
        &mut *tx,
        video_id,
        &[
            face(0, basis_embedding(0), true),
            face(30, near, true),
            face(60, basis_embedding(5), true),
        ],
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let all = FaceRepo::count_for_video(&pool, video_id).await.unwrap();
    assert_eq!(all, 3);

    // Without exclusion the exact match itself ranks first at distance ~0.
    let unexcluded = FaceRepo::find_similar(&pool, &basis_embedding(0), 0, 2.0, 10)
        .await
        .unwrap();
    assert_eq!(unexcluded.len(), 3);
    let query_face_id = unexcluded[0].id;
    assert!(unexcluded[0].distance < 1e-6);

    // Querying with that observation's own embedding never returns it.
    let neighbors = FaceRepo::find_similar(&pool, &basis_embedding(0), query_face_id, 2.0, 10)
        .await
        .unwrap();
    assert_eq!(neighbors.len(), 2);
    assert!(neighbors.iter().all(|n| n.id != query_face_id));
    for pair in neighbors.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
    // The near vector must rank before the orthogonal one.
    assert!(neighbors[0].distance < 0.5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn threshold_bounds_returned_distances(pool: PgPool) {
    let video_id = seed_video(&pool, "faces02").await;

    let mut tx = pool.begin().await.unwrap();
    FaceRepo::insert_batch(
        &mut *tx,
        video_id,
        &[
            face(0, basis_embedding(0), true),
            face(30, basis_embedding(1), true), // orthogonal: distance 1.0
        ],
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let neighbors = FaceRepo::find_similar(&pool, &basis_embedding(0), 0, 0.5, 10)
        .await
        .unwrap();
    assert!(neighbors.iter().all(|n| n.distance <= 0.5));
    // Only the identical-direction match survives the cutoff.
    assert_eq!(neighbors.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_sentinel_embeddings_are_filtered(pool: PgPool) {
    let video_id = seed_video(&pool, "faces03").await;

    let mut tx = pool.begin().await.unwrap();
    FaceRepo::insert_batch(
        &mut *tx,
        video_id,
        &[
            face(0, basis_embedding(0), true),
            face(30, vec![0.0; EMBEDDING_DIMENSION], false),
        ],
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let neighbors = FaceRepo::find_similar(&pool, &basis_embedding(0), 0, 2.0, 10)
        .await
        .unwrap();
    assert_eq!(neighbors.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn annotation_patch_updates_investigator_fields(pool: PgPool) {
    let video_id = seed_video(&pool, "faces04").await;

    let mut tx = pool.begin().await.unwrap();
    FaceRepo::insert_batch(&mut *tx, video_id, &[face(0, basis_embedding(0), true)])
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let neighbors = FaceRepo::find_similar(&pool, &basis_embedding(1), 0, 2.0, 10)
        .await
        .unwrap();
    let face_id = neighbors[0].id;

    let patched = FaceRepo::annotate(
        &pool,
        face_id,
        &custodia_db::models::face::AnnotateFace {
            is_person_of_interest: Some(true),
            poi_label: Some("subject-a".to_string()),
            notes: None,
        },
    )
    .await
    .unwrap();
    assert!(patched);

    let observation = FaceRepo::find_by_id(&pool, face_id).await.unwrap().unwrap();
    assert!(observation.is_person_of_interest);
    assert_eq!(observation.poi_label.as_deref(), Some("subject-a"));
    assert!(observation.notes.is_none());
}
