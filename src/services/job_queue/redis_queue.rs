use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::cmd;

use crate::core::redis::RedisHandle;

use super::{
    JobQueue, JobResult, JobSource, ProcessSubmission, QueueError, QueuedJob,
    PROCESS_SUBMISSION_QUEUE, RESULT_KEY_PREFIX,
};

/// Pushes jobs onto a Redis list through the shared managed connection.
#[derive(Clone)]
pub(crate) struct RedisJobQueue {
    redis: RedisHandle,
}

impl RedisJobQueue {
    pub(crate) fn new(redis: RedisHandle) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, payload: ProcessSubmission) -> Result<String, QueueError> {
        let mut connection = self.redis.connection().await.ok_or(QueueError::Disconnected)?;

        let job = QueuedJob::new(payload);
        let message = serde_json::to_string(&job)?;

        cmd("LPUSH")
            .arg(PROCESS_SUBMISSION_QUEUE)
            .arg(message)
            .query_async::<_, i64>(&mut connection)
            .await?;

        tracing::debug!(
            task_id = %job.task_id,
            submission_id = job.payload.submission_id,
            queue = PROCESS_SUBMISSION_QUEUE,
            "Job enqueued"
        );

        Ok(job.task_id)
    }
}

/// Pops jobs with `BRPOP` on its own connection and writes results with a TTL.
#[derive(Clone)]
pub(crate) struct RedisJobConsumer {
    connection: MultiplexedConnection,
    result_ttl_seconds: u64,
}

impl RedisJobConsumer {
    pub(crate) async fn connect(
        redis: &RedisHandle,
        result_ttl_seconds: u64,
    ) -> Result<Self, QueueError> {
        let connection = redis.dedicated_connection().await?;
        Ok(Self { connection, result_ttl_seconds })
    }
}

#[async_trait]
impl JobSource for RedisJobConsumer {
    async fn next_job(&self, wait: Duration) -> Result<Option<QueuedJob>, QueueError> {
        let mut connection = self.connection.clone();
        let popped: Option<(String, String)> = cmd("BRPOP")
            .arg(PROCESS_SUBMISSION_QUEUE)
            .arg(wait.as_secs().max(1))
            .query_async(&mut connection)
            .await?;

        match popped {
            Some((_queue, message)) => Ok(Some(serde_json::from_str(&message)?)),
            None => Ok(None),
        }
    }

    async fn store_result(&self, result: &JobResult) -> Result<(), QueueError> {
        let mut connection = self.connection.clone();
        let key = format!("{RESULT_KEY_PREFIX}{}", result.task_id);
        let value = serde_json::to_string(result)?;

        cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("EX")
            .arg(self.result_ttl_seconds.max(1))
            .query_async::<_, ()>(&mut connection)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{RedisJobConsumer, RedisJobQueue};
    use crate::core::config::Settings;
    use crate::core::redis::RedisHandle;
    use crate::services::job_queue::{
        JobQueue, JobResult, JobSource, JobState, ProcessSubmission, QueueError, RESULT_KEY_PREFIX,
    };
    use crate::test_support;

    #[tokio::test]
    async fn enqueue_without_connection_is_rejected() {
        let queue = RedisJobQueue::new(RedisHandle::new("redis://127.0.0.1:6379/1".to_string()));
        let err = queue
            .enqueue(ProcessSubmission {
                submission_id: 1,
                student_name: "Jane Doe".to_string(),
                file_path: "/tmp/essay.pdf".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, QueueError::Disconnected));
    }

    #[tokio::test]
    async fn jobs_round_trip_through_redis() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        test_support::reset_redis(settings.redis().redis_url()).await.expect("redis reset");

        let redis = RedisHandle::new(settings.redis().redis_url());
        redis.connect().await.expect("redis connect");

        let queue = RedisJobQueue::new(redis.clone());
        let consumer = RedisJobConsumer::connect(&redis, 60).await.expect("consumer");

        let payload = ProcessSubmission {
            submission_id: 42,
            student_name: "Jane Doe".to_string(),
            file_path: "/tmp/essay.pdf".to_string(),
        };
        let task_id = queue.enqueue(payload.clone()).await.expect("enqueue");

        let job = consumer.next_job(Duration::from_secs(1)).await.expect("pop").expect("job");
        assert_eq!(job.task_id, task_id);
        assert_eq!(job.payload, payload);

        let empty = consumer.next_job(Duration::from_secs(1)).await.expect("pop");
        assert!(empty.is_none());

        let outcome: Result<String, String> = Ok("Successfully processed submission 42.".into());
        consumer
            .store_result(&JobResult::from_outcome(&task_id, &outcome))
            .await
            .expect("store result");

        let mut connection = redis.connection().await.expect("connection");
        let stored: String = redis::cmd("GET")
            .arg(format!("{RESULT_KEY_PREFIX}{task_id}"))
            .query_async(&mut connection)
            .await
            .expect("get result");
        let stored: JobResult = serde_json::from_str(&stored).expect("result json");
        assert_eq!(stored.state, JobState::Success);
        assert_eq!(stored.result, "Successfully processed submission 42.");
    }
}
