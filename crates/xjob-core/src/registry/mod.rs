use std::collections::HashMap;

use tracing::{instrument, trace};

use crate::{error::CoreError, job::JobRef};

/// Handler name to job definition.
///
/// Filled once at startup, then shared read-only (typically behind an `Arc`);
/// no runtime mutation, so no lock.
#[derive(Default)]
pub struct JobRegistry {
    jobs: HashMap<String, JobRef>,
}

impl JobRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job under its own name. Names are unique per process.
    #[instrument(level = "trace", skip(self, job), fields(job = job.name()))]
    pub fn register(&mut self, job: JobRef) -> Result<(), CoreError> {
        let name = job.name().to_string();
        if self.jobs.contains_key(&name) {
            return Err(CoreError::DuplicateJob(name));
        }
        self.jobs.insert(name, job);
        trace!("job registered");
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, job: JobRef) -> Result<Self, CoreError> {
        self.register(job)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<JobRef> {
        self.jobs.get(name).cloned()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }
}
