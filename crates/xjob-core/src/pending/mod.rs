//! Pending-queue consumer and idle reaper.

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::{dispatcher::Dispatcher, engine::Engine, table::TaskTable};

/// Periodically promotes queued triggers and drops idle table entries.
#[derive(Clone)]
pub struct PendingLoop {
    table: Arc<TaskTable>,
    engine: Arc<Engine>,
    tick: Duration,
}

impl PendingLoop {
    pub fn new(dispatcher: &Dispatcher, tick: Duration) -> Self {
        Self {
            table: Arc::clone(dispatcher.table()),
            engine: Arc::clone(dispatcher.engine()),
            tick,
        }
    }

    /// One pass: reap idle entries, then launch one queued trigger per free job id.
    ///
    /// Returns how many triggers were launched.
    pub fn tick_once(&self) -> usize {
        let reaped = self.table.reap_idle();
        if reaped > 0 {
            trace!(reaped, "idle entries removed");
        }

        let ready = self.table.take_ready();
        let launched = ready.len();
        for task in ready {
            debug!(job_id = task.id(), log_id = task.param().log_id, "pending trigger promoted");
            self.engine.launch(task);
        }
        launched
    }

    /// Ticks until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(tick_ms = self.tick.as_millis() as u64, "pending loop started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick_once();
                }
            }
        }
        info!("pending loop stopped");
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        registry::JobRegistry,
        testing::{channel_sink, echo_job, next_callback, request},
    };

    fn setup() -> (
        Dispatcher,
        tokio::sync::mpsc::UnboundedReceiver<xjob_model::HandleCallback>,
    ) {
        let (sink, rx) = channel_sink();
        let registry = JobRegistry::new().with(echo_job("echo")).unwrap();
        let engine = Arc::new(Engine::new(sink));
        (Dispatcher::new(Arc::new(registry), engine, 2), rx)
    }

    #[tokio::test]
    async fn tick_launches_queued_trigger() {
        let (d, mut rx) = setup();
        let pending = PendingLoop::new(&d, Duration::from_millis(10));

        d.trigger(request(1, "echo")).unwrap();
        assert_eq!(pending.tick_once(), 1);
        // Same job id is now running; nothing else to promote.
        assert_eq!(pending.tick_once(), 0);

        let cb = next_callback(&mut rx).await;
        assert_eq!(cb.log_id, 1);
    }

    #[tokio::test]
    async fn tick_reaps_finished_entries() {
        let (d, mut rx) = setup();
        let pending = PendingLoop::new(&d, Duration::from_millis(10));

        d.trigger(request(1, "echo")).unwrap();
        pending.tick_once();
        next_callback(&mut rx).await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        pending.tick_once();
        assert!(!d.table().contains(1));
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let (d, _rx) = setup();
        let shutdown = CancellationToken::new();
        let handle = PendingLoop::new(&d, Duration::from_millis(5)).spawn(shutdown.clone());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop exits")
            .unwrap();
    }
}
