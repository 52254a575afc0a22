//! Shared test doubles.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::mpsc;
use xjob_model::{BlockStrategy, HandleCallback, JobId, RunRequest};

use crate::{
    error::{CoreError, JobError},
    job::{JobFn, JobRef},
    seams::CallbackSink,
};

pub(crate) struct ChannelSink(mpsc::UnboundedSender<HandleCallback>);

#[async_trait]
impl CallbackSink for ChannelSink {
    async fn deliver(&self, items: Vec<HandleCallback>) -> Result<(), CoreError> {
        for item in items {
            self.0
                .send(item)
                .map_err(|e| CoreError::Callback(e.to_string()))?;
        }
        Ok(())
    }
}

pub(crate) fn channel_sink() -> (Arc<ChannelSink>, mpsc::UnboundedReceiver<HandleCallback>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(ChannelSink(tx)), rx)
}

pub(crate) async fn next_callback(rx: &mut mpsc::UnboundedReceiver<HandleCallback>) -> HandleCallback {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("callback within 5s")
        .expect("sink open")
}

pub(crate) fn request(job_id: JobId, handler: &str) -> RunRequest {
    RunRequest {
        job_id,
        executor_handler: handler.to_string(),
        log_id: job_id,
        log_date_time: 1_700_000_000_000,
        ..Default::default()
    }
}

pub(crate) fn with_strategy(mut req: RunRequest, strategy: BlockStrategy) -> RunRequest {
    req.executor_block_strategy = strategy;
    req
}

/// Replies with its params.
pub(crate) fn echo_job(name: &str) -> JobRef {
    JobFn::arc(name, |_ctx, req| async move { Ok(req.executor_params) })
}

pub(crate) fn failing_job(name: &str) -> JobRef {
    JobFn::arc(name, |_ctx, _req| async move { Err(JobError::fail("boom")) })
}

pub(crate) fn panicking_job(name: &str) -> JobRef {
    JobFn::arc(name, |_ctx, _req| async move {
        if true {
            panic!("boom");
        }
        Ok(String::new())
    })
}

/// Sleeps for `executorParams` milliseconds (default 10ms), honouring cancellation.
pub(crate) fn sleepy_job(name: &str) -> JobRef {
    JobFn::arc(name, |ctx, req| async move {
        let ms = req.executor_params.parse().unwrap_or(10);
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(ms)) => Ok(format!("slept {ms}ms")),
            _ = ctx.cancelled() => Err(JobError::Canceled),
        }
    })
}

/// Ignores cancellation and sleeps for a long time.
pub(crate) fn stubborn_job(name: &str) -> JobRef {
    JobFn::arc(name, |_ctx, _req| async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(String::new())
    })
}
