use std::fmt;

use crate::{FAIL_CODE, SUCCESS_CODE};

/// Outcome of exactly one execution attempt.
///
/// It is the only input to the callback protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteResult {
    /// Body returned successfully with this message.
    Done(String),
    /// Body returned an error.
    Failed(String),
    /// Execution was cancelled explicitly (kill, cover-early, discarded from the queue).
    Cancelled,
    /// Execution exceeded its timeout.
    TimedOut,
    /// Body panicked; the payload is rendered as text.
    Panicked(String),
}

impl ExecuteResult {
    /// Body code reported to the scheduler.
    pub fn code(&self) -> i64 {
        match self {
            ExecuteResult::Done(_) => SUCCESS_CODE,
            _ => FAIL_CODE,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecuteResult::Done(_))
    }

    /// Message reported to the scheduler.
    pub fn message(&self) -> String {
        match self {
            ExecuteResult::Done(msg) if msg.is_empty() => "success".to_string(),
            ExecuteResult::Done(msg) => msg.clone(),
            ExecuteResult::Failed(err) => err.clone(),
            ExecuteResult::Cancelled => "task cancelled".to_string(),
            ExecuteResult::TimedOut => "task timeout".to_string(),
            ExecuteResult::Panicked(value) => format!("task panicked: {value}"),
        }
    }

    /// Short label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            ExecuteResult::Done(_) => "done",
            ExecuteResult::Failed(_) => "failed",
            ExecuteResult::Cancelled => "cancelled",
            ExecuteResult::TimedOut => "timeout",
            ExecuteResult::Panicked(_) => "panic",
        }
    }
}

impl fmt::Display for ExecuteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.outcome(), self.message())
    }
}
