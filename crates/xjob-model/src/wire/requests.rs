use serde::{Deserialize, Serialize};

use crate::JobId;

/// Body of `POST /kill`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KillRequest {
    pub job_id: JobId,
}

/// Body of `POST /idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdleRequest {
    pub job_id: JobId,
}

/// Body of `POST /log`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogRequest {
    /// Trigger time in epoch milliseconds; selects the log directory.
    pub log_date_time: i64,
    pub log_id: i64,
    /// First line to return, 1-based.
    pub from_line_num: i32,
}

/// One page of a job log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogResult {
    pub from_line_num: i32,
    pub to_line_num: i32,
    pub log_content: String,
    pub is_end: bool,
}
