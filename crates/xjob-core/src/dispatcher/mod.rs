//! Trigger admission control, kill and idle queries.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use xjob_model::{BlockStrategy, JobId, RunRequest};

use crate::{
    engine::Engine,
    error::DispatchError,
    registry::JobRegistry,
    table::{RunningEntry, TaskTable},
    task::Task,
};

/// How an accepted trigger was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Slot was free; execution launched.
    Started,
    /// Parked in the pending queue; the pending loop will run it.
    Queued,
    /// Previous execution cancelled and replaced; execution launched.
    Replaced,
    /// Slot busy and the strategy drops the trigger without an alarm.
    Discarded,
}

impl Admission {
    /// Reply message for the scheduling center.
    pub fn message(&self) -> &'static str {
        match self {
            Admission::Discarded => "There are tasks running",
            _ => "",
        }
    }
}

/// Applies blocking strategies against the running-task table.
///
/// Occupancy is observed and acted on under one write lock on the table; the
/// body is spawned after the lock is released, so `/run` never waits on it.
pub struct Dispatcher {
    registry: Arc<JobRegistry>,
    table: Arc<TaskTable>,
    engine: Arc<Engine>,
}

impl Dispatcher {
    pub fn new(registry: Arc<JobRegistry>, engine: Arc<Engine>, max_queue_size: usize) -> Self {
        Self {
            registry,
            table: Arc::new(TaskTable::new(max_queue_size)),
            engine,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn table(&self) -> &Arc<TaskTable> {
        &self.table
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Admits one trigger. Must be called from within a tokio runtime.
    #[instrument(
        level = "debug",
        skip(self, req),
        fields(
            job_id = req.job_id,
            handler = %req.executor_handler,
            log_id = req.log_id,
            strategy = %req.executor_block_strategy,
        )
    )]
    pub fn trigger(&self, req: RunRequest) -> Result<Admission, DispatchError> {
        self.engine.trace(&req, "trigger received");

        let Some(job) = self.registry.get(&req.executor_handler) else {
            self.engine.trace(&req, "handler not registered");
            let e = DispatchError::NotRegistered(req.executor_handler.clone());
            return Err(self.reject(&req.executor_handler, e));
        };

        let job_id = req.job_id;
        let strategy = req.executor_block_strategy;
        let task = Task::arc(job, req);
        let mut evicted = Vec::new();

        let admitted = {
            let mut table = self.table.write();
            let entry = table
                .entry(job_id)
                .or_insert_with(|| RunningEntry::new(self.table.capacity()));
            let occupied = entry.is_occupied();

            match strategy {
                BlockStrategy::SerialExecution => {
                    let limit = entry.pending.capacity();
                    entry
                        .pending
                        .try_enqueue(Arc::clone(&task))
                        .map(|()| Admission::Queued)
                        .map_err(|_| DispatchError::OverLimit { job_id, limit })
                }
                BlockStrategy::CoverEarly => {
                    if let Some(previous) = entry.task.replace(Arc::clone(&task))
                        && previous.cancel()
                    {
                        debug!(log_id = previous.param().log_id, "running trigger cancelled by cover-early");
                    }
                    evicted = entry.pending.drain();
                    let _ = task.claim();
                    Ok(if occupied {
                        Admission::Replaced
                    } else {
                        Admission::Started
                    })
                }
                BlockStrategy::DiscardLater if occupied => Err(DispatchError::Busy(job_id)),
                BlockStrategy::DiscardLaterNoAlarm if occupied => Ok(Admission::Discarded),
                BlockStrategy::DiscardLater | BlockStrategy::DiscardLaterNoAlarm => {
                    entry.task = Some(Arc::clone(&task));
                    let _ = task.claim();
                    Ok(Admission::Started)
                }
            }
        };

        for stale in evicted {
            self.engine.abandon(stale);
        }

        match admitted {
            Ok(admission @ (Admission::Started | Admission::Replaced)) => {
                info!(?admission, "trigger admitted, launching");
                self.engine.launch(task);
                Ok(admission)
            }
            Ok(admission) => {
                debug!(?admission, "trigger admitted");
                if admission == Admission::Discarded {
                    self.engine.trace(task.param(), "discarded: job already running");
                }
                Ok(admission)
            }
            Err(e) => {
                self.engine.trace(task.param(), &format!("rejected: {e}"));
                Err(self.reject(task.name(), e))
            }
        }
    }

    /// Cancels the tracked execution of `job_id` and drops its slot.
    ///
    /// Queued triggers of that slot are reported as cancelled.
    #[instrument(level = "debug", skip(self))]
    pub fn kill(&self, job_id: JobId) -> Result<(), DispatchError> {
        let entry = {
            let mut table = self.table.write();
            if !table.get(&job_id).is_some_and(RunningEntry::is_occupied) {
                return Err(DispatchError::NotRunning(job_id));
            }
            table.remove(&job_id)
        };
        let Some(mut entry) = entry else {
            return Err(DispatchError::NotRunning(job_id));
        };

        if let Some(task) = entry.task.take()
            && task.cancel()
        {
            self.engine.trace(task.param(), "killed");
        }
        for stale in entry.pending.drain() {
            self.engine.abandon(stale);
        }
        info!("job killed");
        Ok(())
    }

    /// `true` iff nothing runs and nothing waits for `job_id`.
    pub fn is_idle(&self, job_id: JobId) -> bool {
        self.table.is_idle(job_id)
    }

    fn reject(&self, job: &str, e: DispatchError) -> DispatchError {
        warn!(reason = e.reason(), "trigger rejected: {e}");
        self.engine.metrics().record_rejected(job, e.reason());
        e
    }
}
