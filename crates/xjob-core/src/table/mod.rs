//! Running-task table: one slot per job id.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use xjob_model::JobId;

use crate::{queue::PendingQueue, task::Task};

/// Current task plus bounded pending triggers of one job id.
///
/// Created lazily on the first trigger, removed by the idle reaper or a kill.
#[derive(Debug)]
pub struct RunningEntry {
    pub(crate) task: Option<Arc<Task>>,
    pub(crate) pending: PendingQueue<Arc<Task>>,
}

impl RunningEntry {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            task: None,
            pending: PendingQueue::new(capacity),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| t.is_running())
    }

    /// A running task or queued triggers keep the slot occupied.
    pub fn is_occupied(&self) -> bool {
        self.is_running() || !self.pending.is_empty()
    }

    pub fn is_idle(&self) -> bool {
        !self.is_occupied()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Job id to [`RunningEntry`], behind a reader/writer lock.
///
/// The lock is never held across an await point.
pub struct TaskTable {
    inner: RwLock<HashMap<JobId, RunningEntry>>,
    capacity: usize,
}

impl TaskTable {
    /// `capacity` bounds every entry's pending queue.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.read().contains_key(&id)
    }

    /// Idle iff nothing runs and nothing waits; unknown ids are idle.
    pub fn is_idle(&self, id: JobId) -> bool {
        self.read().get(&id).is_none_or(RunningEntry::is_idle)
    }

    /// Task currently tracked for `id`, running or most recently run.
    pub fn current(&self, id: JobId) -> Option<Arc<Task>> {
        self.read().get(&id).and_then(|e| e.task.clone())
    }

    pub fn pending_len(&self, id: JobId) -> usize {
        self.read().get(&id).map_or(0, RunningEntry::pending_len)
    }

    /// Drops entries with nothing running and nothing queued. Returns how many.
    pub fn reap_idle(&self) -> usize {
        let mut table = self.write();
        let before = table.len();
        table.retain(|_, entry| entry.is_occupied());
        before - table.len()
    }

    /// Promotes one queued trigger of every non-running entry to current task.
    ///
    /// Each returned task is already claimed, so the next tick cannot promote
    /// a second trigger for the same job id while this one is starting.
    pub fn take_ready(&self) -> Vec<Arc<Task>> {
        let mut table = self.write();
        let mut ready = Vec::new();
        for entry in table.values_mut() {
            if entry.is_running() {
                continue;
            }
            let Some(task) = entry.pending.try_dequeue() else {
                continue;
            };
            if task.claim().is_some() {
                entry.task = Some(Arc::clone(&task));
                ready.push(task);
            }
        }
        ready
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, RunningEntry>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, RunningEntry>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
