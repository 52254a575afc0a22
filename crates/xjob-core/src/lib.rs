//! Job executor core: registry, running-task table, admission control,
//! execution engine and the pending-queue loop.
//!
//! The crate owns no transport. Outbound effects go through three seams:
//! [`CallbackSink`] (execution results), [`MetricsBackend`] and [`JobLogStore`].

pub mod error;
pub use error::{CoreError, DispatchError, JobError};

mod config;
pub use config::ExecutorConfig;

mod seams;
pub use seams::{CallbackSink, JobLogStore, MetricsBackend, NoopJobLog, NoopMetrics};

pub mod job;
pub use job::{Job, JobContext, JobFn, JobRef};

pub mod registry;
pub use registry::JobRegistry;

pub mod queue;
pub use queue::PendingQueue;

pub mod task;
pub use task::Task;

pub mod table;
pub use table::TaskTable;

pub mod engine;
pub use engine::Engine;

pub mod dispatcher;
pub use dispatcher::{Admission, Dispatcher};

pub mod pending;
pub use pending::PendingLoop;

#[cfg(test)]
pub(crate) mod testing;

pub(crate) fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
