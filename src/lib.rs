pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;

use crate::core::{config::Settings, redis::RedisHandle, state::AppState, telemetry};
use crate::services::job_queue::RedisJobQueue;
use crate::services::storage::MediaStorage;

/// Redis carries the job queue, so neither process starts without it.
async fn connect_redis(url: String) -> anyhow::Result<RedisHandle> {
    let redis = RedisHandle::new(url);
    redis.connect().await.context("Failed to connect to Redis")?;
    tracing::info!("Redis connected successfully");
    Ok(redis)
}

async fn bootstrap(component: &'static str) -> anyhow::Result<AppState> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings, component)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await.context("Failed to open database pool")?;
    db::run_migrations(&db_pool).await.context("Failed to apply migrations")?;

    let redis = connect_redis(settings.redis().redis_url()).await?;

    let storage = MediaStorage::from_settings(&settings);
    tokio::fs::create_dir_all(storage.root())
        .await
        .with_context(|| format!("Failed to create media root {}", storage.root().display()))?;

    let jobs = Arc::new(RedisJobQueue::new(redis.clone()));
    Ok(AppState::new(settings, db_pool, redis, storage, jobs))
}

pub async fn run() -> anyhow::Result<()> {
    let state = bootstrap("portal-submissions").await?;

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        media_root = %state.storage().root().display(),
        "Submission portal API listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    state.redis().disconnect().await;
    tracing::info!("Redis disconnected");

    result?;

    Ok(())
}

pub async fn run_worker() -> anyhow::Result<()> {
    let state = bootstrap("worker").await?;

    let result = tasks::scheduler::run(state.clone()).await;

    state.redis().disconnect().await;
    tracing::info!("Redis disconnected");

    result?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::connect_redis;

    #[tokio::test]
    async fn startup_fails_when_broker_is_unusable() {
        let err = connect_redis("not-a-redis-url".to_string()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to connect to Redis"), "{err:#}");
    }
}
