use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use custodia_events::{AlertPersistence, EventBus};
use custodia_inference::StageSet;
use custodia_pipeline::{PipelineConfig, VideoProcessor};
use custodia_worker::JobDispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "custodia=debug,custodia_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = custodia_db::create_pool(&database_url).await?;
    custodia_db::health_check(&pool).await?;

    let blobs = custodia_storage::from_env().await;

    // Model-backed stage implementations plug in here; without them every
    // capability is the explicit disabled variant and runs complete with
    // degraded (empty) findings.
    let stages = StageSet::disabled();

    let bus = Arc::new(EventBus::default());
    tokio::spawn(AlertPersistence::run(pool.clone(), bus.subscribe()));

    let config = PipelineConfig::from_env();
    let processor = Arc::new(VideoProcessor::new(
        pool.clone(),
        blobs,
        stages,
        bus.clone(),
        config,
    ));

    let dispatcher = JobDispatcher::new(pool, processor);
    let cancel = CancellationToken::new();

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    tracing::info!("Worker started");
    dispatcher.run(cancel).await;

    Ok(())
}
