mod redis_queue;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::time::{format_primitive, primitive_now_utc};

pub(crate) use redis_queue::{RedisJobConsumer, RedisJobQueue};

pub(crate) const PROCESS_SUBMISSION_QUEUE: &str = "portal:jobs:process_submission";
pub(crate) const RESULT_KEY_PREFIX: &str = "portal:results:";

/// Payload of one processing job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ProcessSubmission {
    pub(crate) submission_id: i64,
    pub(crate) student_name: String,
    /// Absolute path of the stored upload.
    pub(crate) file_path: String,
}

/// Envelope that travels through the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct QueuedJob {
    pub(crate) task_id: String,
    pub(crate) enqueued_at: String,
    pub(crate) payload: ProcessSubmission,
}

impl QueuedJob {
    pub(crate) fn new(payload: ProcessSubmission) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            enqueued_at: format_primitive(primitive_now_utc()),
            payload,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum JobState {
    Success,
    Failure,
}

/// What the result backend keeps for a finished job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct JobResult {
    pub(crate) task_id: String,
    pub(crate) state: JobState,
    pub(crate) result: String,
    pub(crate) finished_at: String,
}

impl JobResult {
    pub(crate) fn from_outcome<E: std::fmt::Display>(
        task_id: &str,
        outcome: &Result<String, E>,
    ) -> Self {
        let (state, result) = match outcome {
            Ok(message) => (JobState::Success, message.clone()),
            Err(err) => (JobState::Failure, err.to_string()),
        };

        Self {
            task_id: task_id.to_string(),
            state,
            result,
            finished_at: format_primitive(primitive_now_utc()),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum QueueError {
    #[error("job broker is not connected")]
    Disconnected,
    #[error("job broker error: {0}")]
    Broker(#[from] redis::RedisError),
    #[error("malformed job message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Submission side of the queue, handed to request handlers.
#[async_trait]
pub(crate) trait JobQueue: Send + Sync {
    /// Queues a processing job and returns its task id.
    async fn enqueue(&self, payload: ProcessSubmission) -> Result<String, QueueError>;
}

/// Consumer side of the queue, owned by one worker loop.
#[async_trait]
pub(crate) trait JobSource: Send + Sync {
    /// Waits up to `wait` for the next job.
    async fn next_job(&self, wait: Duration) -> Result<Option<QueuedJob>, QueueError>;

    async fn store_result(&self, result: &JobResult) -> Result<(), QueueError>;
}

#[async_trait]
impl<T: JobSource + ?Sized> JobSource for Arc<T> {
    async fn next_job(&self, wait: Duration) -> Result<Option<QueuedJob>, QueueError> {
        self.as_ref().next_job(wait).await
    }

    async fn store_result(&self, result: &JobResult) -> Result<(), QueueError> {
        self.as_ref().store_result(result).await
    }
}
