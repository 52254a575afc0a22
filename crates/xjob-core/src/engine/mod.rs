//! Execution engine: runs one task body, classifies the outcome, reports it.

use std::{any::Any, sync::Arc, time::Duration};

use tokio::{
    task::{JoinError, JoinHandle},
    time::{Instant, sleep_until},
};
use tracing::{debug, error, info, instrument, warn};
use xjob_model::{ExecuteResult, HandleCallback, RunRequest};

use crate::{
    error::JobError,
    job::JobContext,
    seams::{CallbackSink, JobLogStore, MetricsBackend, NoopJobLog, NoopMetrics},
    task::Task,
};

pub struct Engine {
    sink: Arc<dyn CallbackSink>,
    metrics: Arc<dyn MetricsBackend>,
    joblog: Arc<dyn JobLogStore>,
}

impl Engine {
    pub fn new(sink: Arc<dyn CallbackSink>) -> Self {
        Self {
            sink,
            metrics: Arc::new(NoopMetrics),
            joblog: Arc::new(NoopJobLog),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsBackend>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_joblog(mut self, joblog: Arc<dyn JobLogStore>) -> Self {
        self.joblog = joblog;
        self
    }

    pub fn metrics(&self) -> &Arc<dyn MetricsBackend> {
        &self.metrics
    }

    pub fn joblog(&self) -> &Arc<dyn JobLogStore> {
        &self.joblog
    }

    /// Writes one line into the job log of `req`'s trigger.
    pub fn trace(&self, req: &RunRequest, step: &str) {
        let line = format!(
            "job[{}:{}] params[{}]: {}",
            req.job_id, req.executor_handler, req.executor_params, step
        );
        self.joblog.append(req.log_id, req.log_date_time, &line);
    }

    /// Runs `task` on its own tokio task, detached from the caller.
    ///
    /// Must be called from within a tokio runtime.
    pub fn launch(self: &Arc<Self>, task: Arc<Task>) -> JoinHandle<ExecuteResult> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.execute(task).await })
    }

    /// Reports an accepted trigger that will never run as cancelled.
    pub fn abandon(self: &Arc<Self>, task: Arc<Task>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let result = ExecuteResult::Cancelled;
            engine.trace(task.param(), "discarded from pending queue");
            debug!(job_id = task.id(), log_id = task.param().log_id, "pending trigger discarded");
            engine.metrics.record_finished(task.name(), result.outcome(), Duration::ZERO);
            engine.report(task.param(), &result).await;
        })
    }

    /// Runs the body of `task` to a single [`ExecuteResult`] and reports it once.
    ///
    /// The body runs on a separate tokio task, so a panic is caught as
    /// [`ExecuteResult::Panicked`]. Its completion races the task's cancel
    /// handle and, when set, the timeout. A body that ignores cancellation keeps
    /// running in the background while the engine completes its bookkeeping.
    #[instrument(
        level = "debug",
        skip_all,
        fields(job_id = task.id(), handler = %task.name(), log_id = task.param().log_id)
    )]
    pub async fn execute(&self, task: Arc<Task>) -> ExecuteResult {
        let token = task.scope();
        let started = Instant::now();
        task.mark_started();
        self.metrics.record_started(task.name());
        self.trace(task.param(), "started");
        info!("job started");

        let result = if token.is_cancelled() {
            ExecuteResult::Cancelled
        } else {
            let req = task.param().clone();
            let ctx = JobContext::new(token.child_token(), &req, Arc::clone(&self.joblog));
            let job = task.job();
            let mut body = tokio::spawn(async move { job.run(ctx, req).await });
            // A deadline past the clock's range is no deadline.
            let deadline = task.timeout().and_then(|t| started.checked_add(t));

            tokio::select! {
                biased;
                joined = &mut body => classify(joined),
                _ = token.cancelled() => ExecuteResult::Cancelled,
                _ = expire(deadline) => {
                    token.cancel();
                    ExecuteResult::TimedOut
                }
            }
        };
        task.finish();

        let elapsed = started.elapsed();
        self.metrics
            .record_finished(task.name(), result.outcome(), elapsed);
        self.trace(task.param(), &format!("finished: {result}"));
        match &result {
            ExecuteResult::Done(_) => info!(elapsed_ms = elapsed.as_millis() as u64, "job done"),
            ExecuteResult::Panicked(value) => error!(panic = %value, "job panicked"),
            other => warn!(outcome = other.outcome(), message = %other.message(), "job did not complete"),
        }

        self.report(task.param(), &result).await;
        result
    }

    async fn report(&self, req: &RunRequest, result: &ExecuteResult) {
        let item = HandleCallback::new(req.log_id, req.log_date_time, result);
        match self.sink.deliver(vec![item]).await {
            Ok(()) => debug!(log_id = req.log_id, "callback delivered"),
            Err(e) => warn!(log_id = req.log_id, error = %e, "callback delivery failed"),
        }
    }
}

fn classify(joined: Result<Result<String, JobError>, JoinError>) -> ExecuteResult {
    match joined {
        Ok(Ok(msg)) => ExecuteResult::Done(msg),
        Ok(Err(JobError::Canceled)) => ExecuteResult::Cancelled,
        Ok(Err(e)) => ExecuteResult::Failed(e.to_string()),
        Err(e) if e.is_panic() => ExecuteResult::Panicked(panic_message(e.into_panic())),
        Err(_) => ExecuteResult::Cancelled,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic payload".to_string()
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
