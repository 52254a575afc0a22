use std::time::Duration;

use async_trait::async_trait;
use xjob_model::{HandleCallback, LogResult};

use crate::error::CoreError;

/// Destination of execution results (the scheduler's `/api/callback`).
#[async_trait]
pub trait CallbackSink: Send + Sync + 'static {
    async fn deliver(&self, items: Vec<HandleCallback>) -> Result<(), CoreError>;
}

/// Execution metrics. Labels are job handler names and short outcome/reason strings.
pub trait MetricsBackend: Send + Sync + 'static {
    fn record_started(&self, job: &str);
    fn record_finished(&self, job: &str, outcome: &str, duration: Duration);
    fn record_rejected(&self, job: &str, reason: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsBackend for NoopMetrics {
    fn record_started(&self, _job: &str) {}
    fn record_finished(&self, _job: &str, _outcome: &str, _duration: Duration) {}
    fn record_rejected(&self, _job: &str, _reason: &str) {}
}

/// Per-trigger log, keyed by `log_id` and the trigger's `log_date_time` (epoch ms).
///
/// Implementations must not fail the caller; write errors are theirs to report.
pub trait JobLogStore: Send + Sync + 'static {
    fn append(&self, log_id: i64, log_date_time: i64, line: &str);
    fn read(&self, log_date_time: i64, log_id: i64, from_line: i32) -> LogResult;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopJobLog;

impl JobLogStore for NoopJobLog {
    fn append(&self, _log_id: i64, _log_date_time: i64, _line: &str) {}

    fn read(&self, _log_date_time: i64, _log_id: i64, from_line: i32) -> LogResult {
        LogResult {
            from_line_num: from_line,
            to_line_num: 0,
            log_content: String::new(),
            is_end: true,
        }
    }
}
