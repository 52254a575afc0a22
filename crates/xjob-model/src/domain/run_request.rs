use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::BlockStrategy;

/// Scheduler-assigned identifier correlating all triggers of one logical job.
pub type JobId = i64;

/// One trigger sent by the scheduling center to `POST /run`.
///
/// Every field is optional on the wire. Glue and broadcast fields are not
/// interpreted by the executor; they are carried through to the job body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunRequest {
    pub job_id: JobId,
    /// Registry key of the job definition to run.
    pub executor_handler: String,
    pub executor_params: String,
    pub executor_block_strategy: BlockStrategy,
    /// Timeout in seconds. Zero or negative disables the timeout.
    pub executor_timeout: i64,
    pub log_id: i64,
    /// Trigger time in epoch milliseconds.
    pub log_date_time: i64,
    pub glue_type: String,
    pub glue_source: String,
    #[serde(rename = "glueUpdatetime")]
    pub glue_update_time: i64,
    pub broadcast_index: i64,
    pub broadcast_total: i64,
}

impl RunRequest {
    /// Execution timeout, `None` when unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        (self.executor_timeout > 0).then(|| Duration::from_secs(self.executor_timeout as u64))
    }
}
