//! One schedulable execution of a job.

use std::{
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio_util::sync::CancellationToken;
use xjob_model::{JobId, RunRequest};

use crate::{job::JobRef, unix_now};

/// A trigger bound to its job body.
///
/// Identity, parameters and timeout are fixed at construction. The running
/// flag is atomic; timing and the cancel handle sit behind a per-task mutex
/// because the HTTP path, the pending loop and the engine all touch them.
pub struct Task {
    job: JobRef,
    param: RunRequest,
    timeout: Option<Duration>,
    running: AtomicBool,
    state: Mutex<TaskState>,
}

#[derive(Default)]
struct TaskState {
    start_time: i64,
    end_time: i64,
    /// Present only while `running` is set.
    cancel: Option<CancellationToken>,
}

impl Task {
    pub fn new(job: JobRef, param: RunRequest) -> Self {
        Self {
            timeout: param.timeout(),
            job,
            param,
            running: AtomicBool::new(false),
            state: Mutex::new(TaskState::default()),
        }
    }

    pub fn arc(job: JobRef, param: RunRequest) -> Arc<Self> {
        Arc::new(Self::new(job, param))
    }

    pub fn id(&self) -> JobId {
        self.param.job_id
    }

    pub fn name(&self) -> &str {
        &self.param.executor_handler
    }

    pub fn param(&self) -> &RunRequest {
        &self.param
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn job(&self) -> JobRef {
        Arc::clone(&self.job)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn start_time(&self) -> i64 {
        self.state().start_time
    }

    pub fn end_time(&self) -> i64 {
        self.state().end_time
    }

    /// Marks the task running and installs a fresh cancel handle.
    ///
    /// Returns `None` if it was already running. Callers claim under the task
    /// table lock so the slot is occupied before the execution unit starts.
    pub(crate) fn claim(&self) -> Option<CancellationToken> {
        let mut state = self.state();
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        let token = CancellationToken::new();
        state.cancel = Some(token.clone());
        Some(token)
    }

    /// Cancel handle of the current run, if running.
    #[cfg(test)]
    pub(crate) fn token(&self) -> Option<CancellationToken> {
        self.state().cancel.clone()
    }

    /// Cancel handle of the current run, claiming the task first if it is idle.
    pub(crate) fn scope(&self) -> CancellationToken {
        let mut state = self.state();
        self.running.store(true, Ordering::Release);
        state.cancel.get_or_insert_with(CancellationToken::new).clone()
    }

    pub(crate) fn mark_started(&self) {
        self.state().start_time = unix_now();
    }

    /// Clears the cancel handle, then the running flag.
    pub(crate) fn finish(&self) {
        let mut state = self.state();
        state.end_time = unix_now();
        state.cancel = None;
        self.running.store(false, Ordering::Release);
    }

    /// Signals cancellation to the current run. No-op when idle.
    pub fn cancel(&self) -> bool {
        match &self.state().cancel {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn state(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("log_id", &self.param.log_id)
            .field("running", &self.is_running())
            .finish()
    }
}
