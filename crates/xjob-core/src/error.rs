use thiserror::Error;
use xjob_model::JobId;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("job already registered: {0}")]
    DuplicateJob(String),

    #[error("invalid executor config: {0}")]
    InvalidConfig(String),

    #[error("callback delivery failed: {0}")]
    Callback(String),
}

/// Reasons a trigger or a kill request is refused synchronously.
///
/// The `Display` text is what the scheduling center sees in the reply `msg`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Task not registered")]
    NotRegistered(String),

    #[error("There are {limit} tasks running")]
    OverLimit { job_id: JobId, limit: usize },

    #[error("There are tasks running")]
    Busy(JobId),

    #[error("Task not running")]
    NotRunning(JobId),
}

impl DispatchError {
    /// Short label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            DispatchError::NotRegistered(_) => "not_registered",
            DispatchError::OverLimit { .. } => "over_limit",
            DispatchError::Busy(_) => "busy",
            DispatchError::NotRunning(_) => "not_running",
        }
    }
}

/// Error returned by a job body.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("{reason}")]
    Fail { reason: String },

    /// The body observed its cancellation token and stopped early.
    #[error("cancelled")]
    Canceled,
}

impl JobError {
    pub fn fail(reason: impl Into<String>) -> Self {
        JobError::Fail {
            reason: reason.into(),
        }
    }
}
