use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use crate::core::state::AppState;
use crate::services::job_queue::{JobResult, JobSource, QueuedJob, RedisJobConsumer};
use crate::tasks::processing;

const POLL_WAIT: Duration = Duration::from_secs(2);
const BROKER_RETRY_DELAY: Duration = Duration::from_secs(3);

pub(crate) async fn run(state: AppState) -> Result<()> {
    let concurrency = state.settings().worker().concurrency;
    let result_ttl = state.settings().worker().result_ttl_seconds;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut handles = Vec::with_capacity(concurrency);
    for slot in 0..concurrency {
        let source = RedisJobConsumer::connect(state.redis(), result_ttl)
            .await
            .with_context(|| format!("Failed to open broker connection for worker slot {slot}"))?;
        handles.push(tokio::spawn(consume(state.clone(), source, shutdown_rx.clone(), slot)));
    }

    tracing::info!(concurrency, "Submission worker started");

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to worker loops");
    }

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "Worker loop join failed");
        }
    }

    Ok(())
}

/// Pulls jobs until shutdown is signalled. The job in hand always runs to
/// completion; shutdown is only observed between jobs.
pub(crate) async fn consume<S: JobSource>(
    state: AppState,
    source: S,
    mut shutdown: watch::Receiver<bool>,
    slot: usize,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        match source.next_job(POLL_WAIT).await {
            Ok(Some(job)) => {
                run_job(&state, &source, job).await;
                continue;
            }
            Ok(None) => continue,
            Err(err) => tracing::error!(slot, error = %err, "Failed to fetch next job"),
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            _ = sleep(BROKER_RETRY_DELAY) => {}
        }
    }

    tracing::info!(slot, "Worker loop stopped");
}

/// Processes one job and records its outcome in the result backend.
pub(crate) async fn run_job<S: JobSource + ?Sized>(
    state: &AppState,
    source: &S,
    job: QueuedJob,
) -> JobResult {
    let started = Instant::now();
    let delay = Duration::from_secs(state.settings().worker().processing_delay_seconds);

    let outcome = processing::handle_job(state.db(), &job.payload, delay).await;
    let status_label = match &outcome {
        Ok(message) => {
            tracing::info!(task_id = %job.task_id, submission_id = job.payload.submission_id, "{message}");
            "success"
        }
        Err(failure) => {
            tracing::warn!(
                task_id = %job.task_id,
                submission_id = failure.submission_id,
                kind = failure.error.kind(),
                "{failure}"
            );
            "failure"
        }
    };

    metrics::counter!("submission_jobs_total", "status" => status_label).increment(1);
    metrics::histogram!("submission_job_duration_seconds").record(started.elapsed().as_secs_f64());

    let result = JobResult::from_outcome(&job.task_id, &outcome);
    if let Err(err) = source.store_result(&result).await {
        tracing::error!(task_id = %job.task_id, error = %err, "Failed to store job result");
    }

    result
}
