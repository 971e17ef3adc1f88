use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::job_queue::JobQueue;
use crate::services::storage::MediaStorage;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    storage: MediaStorage,
    jobs: Arc<dyn JobQueue>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        storage: MediaStorage,
        jobs: Arc<dyn JobQueue>,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, redis, storage, jobs }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    pub(crate) fn storage(&self) -> &MediaStorage {
        &self.inner.storage
    }

    pub(crate) fn jobs(&self) -> &dyn JobQueue {
        self.inner.jobs.as_ref()
    }
}
