use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use xjob_model::RegistryParam;

use crate::{client::AdminClient, config::DiscoverConfig, errors::DiscoverError};

/// Keeps the executor registered with the scheduling center.
///
/// Registers once immediately, then on every tick; deregisters exactly once
/// with the same triple when the shutdown token fires. Failures are logged
/// and retried on the next tick.
pub struct Registrar {
    client: AdminClient,
    param: RegistryParam,
    delay: Duration,
}

impl Registrar {
    pub fn new(cfg: &DiscoverConfig) -> Result<Self, DiscoverError> {
        Ok(Self::with_client(AdminClient::new(cfg)?, cfg))
    }

    pub fn with_client(client: AdminClient, cfg: &DiscoverConfig) -> Self {
        Self {
            client,
            param: cfg.registry_param(),
            delay: cfg.delay,
        }
    }

    pub fn param(&self) -> &RegistryParam {
        &self.param
    }

    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval(self.delay);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            key = %self.param.registry_key,
            value = %self.param.registry_value,
            delay_ms = self.delay.as_millis() as u64,
            "registration loop started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => match self.client.registry(&self.param).await {
                    Ok(()) => debug!("registry heartbeat accepted"),
                    Err(e) => warn!(error = %e, "registry heartbeat failed"),
                },
            }
        }

        match self.client.registry_remove(&self.param).await {
            Ok(()) => info!("executor deregistered"),
            Err(e) => warn!(error = %e, "deregistration failed"),
        }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
