//! Prometheus metrics backend for the xjob executor.
//!
//! [`PrometheusMetrics`] implements [`xjob_core::MetricsBackend`] on a
//! dedicated [`Registry`], so it never collides with other collectors in the
//! process.
//!
//! ## Example
//! ```rust
//! use xjob_core::MetricsBackend;
//! use xjob_prometheus::{PrometheusMetrics, TextEncoder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! metrics.record_started("demo");
//!
//! let mut body = String::new();
//! TextEncoder::new().encode_utf8(&metrics.gather(), &mut body)?;
//! assert!(body.contains("xjob_jobs_started_total"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `xjob_jobs_started_total{job}` - Counter
//! - `xjob_jobs_completed_total{job, outcome}` - Counter
//! - `xjob_job_duration_seconds{job}` - Histogram
//! - `xjob_triggers_rejected_total{job, reason}` - Counter
//!
//! This crate does not serve `/metrics`; mount [`PrometheusMetrics::gather`]
//! in the application's HTTP router.

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
