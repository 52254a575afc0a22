//! Job definitions and the context handed to a running body.

use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use xjob_model::{JobId, RunRequest};

use crate::{error::JobError, seams::JobLogStore};

pub type JobRef = Arc<dyn Job>;

/// A named, user-supplied job body.
///
/// Bodies are expected to observe [`JobContext::cancelled`]; the engine stops
/// waiting on cancel or timeout either way.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Registry key (`executorHandler` on the wire).
    fn name(&self) -> &str;

    /// Runs one trigger. `Ok` carries the message reported to the scheduler.
    async fn run(&self, ctx: JobContext, req: RunRequest) -> Result<String, JobError>;
}

/// Closure-backed [`Job`].
///
/// ```rust
/// use xjob_core::{Job, JobFn, JobRef};
///
/// let job: JobRef = JobFn::arc("hello", |ctx, req| async move {
///     ctx.log(format!("params: {}", req.executor_params));
///     Ok("hello done".to_string())
/// });
/// assert_eq!(job.name(), "hello");
/// ```
pub struct JobFn<F> {
    name: String,
    f: F,
}

impl<F, Fut> JobFn<F>
where
    F: Fn(JobContext, RunRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, JobError>> + Send + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    pub fn arc(name: impl Into<String>, f: F) -> JobRef {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Job for JobFn<F>
where
    F: Fn(JobContext, RunRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, JobError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: JobContext, req: RunRequest) -> Result<String, JobError> {
        (self.f)(ctx, req).await
    }
}

/// Execution scope of one trigger.
#[derive(Clone)]
pub struct JobContext {
    token: CancellationToken,
    job_id: JobId,
    log_id: i64,
    log_date_time: i64,
    joblog: Arc<dyn JobLogStore>,
}

impl JobContext {
    pub fn new(token: CancellationToken, req: &RunRequest, joblog: Arc<dyn JobLogStore>) -> Self {
        Self {
            token,
            job_id: req.job_id,
            log_id: req.log_id,
            log_date_time: req.log_date_time,
            joblog,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the execution is killed, replaced or timed out.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn log_id(&self) -> i64 {
        self.log_id
    }

    pub fn log_date_time(&self) -> i64 {
        self.log_date_time
    }

    /// Appends a line to this trigger's job log.
    pub fn log(&self, line: impl AsRef<str>) {
        self.joblog
            .append(self.log_id, self.log_date_time, line.as_ref());
    }
}

impl fmt::Debug for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobContext")
            .field("job_id", &self.job_id)
            .field("log_id", &self.log_id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
