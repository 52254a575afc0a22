use std::time::Duration;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, proto::MetricFamily,
};
use xjob_core::MetricsBackend;

/// Job execution metrics on a private registry. Cheap to clone.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    started: IntCounterVec,
    completed: IntCounterVec,
    duration: HistogramVec,
    rejected: IntCounterVec,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let started = IntCounterVec::new(
            Opts::new("xjob_jobs_started_total", "Job executions started"),
            &["job"],
        )?;
        let completed = IntCounterVec::new(
            Opts::new("xjob_jobs_completed_total", "Job executions finished, by outcome"),
            &["job", "outcome"],
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new("xjob_job_duration_seconds", "Job execution wall time")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 1800.0]),
            &["job"],
        )?;
        let rejected = IntCounterVec::new(
            Opts::new("xjob_triggers_rejected_total", "Triggers refused at admission"),
            &["job", "reason"],
        )?;

        registry.register(Box::new(started.clone()))?;
        registry.register(Box::new(completed.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(rejected.clone()))?;

        Ok(Self {
            registry,
            started,
            completed,
            duration,
            rejected,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_started(&self, job: &str) {
        self.started.with_label_values(&[job]).inc();
    }

    fn record_finished(&self, job: &str, outcome: &str, duration: Duration) {
        self.completed.with_label_values(&[job, outcome]).inc();
        self.duration
            .with_label_values(&[job])
            .observe(duration.as_secs_f64());
    }

    fn record_rejected(&self, job: &str, reason: &str) {
        self.rejected.with_label_values(&[job, reason]).inc();
    }
}
