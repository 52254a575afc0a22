use std::time::Duration;

use xjob_core::ExecutorConfig;
use xjob_model::RegistryParam;

/// Everything needed to talk to the scheduling center.
#[derive(Debug, Clone)]
pub struct DiscoverConfig {
    /// Base URL of the scheduling center, without the `/api/...` suffix.
    pub endpoint: String,
    pub access_token: String,
    pub timeout: Duration,
    pub registry_group: String,
    pub registry_key: String,
    pub registry_value: String,
    pub delay: Duration,
}

impl DiscoverConfig {
    /// The triple sent by both registration and deregistration.
    pub fn registry_param(&self) -> RegistryParam {
        RegistryParam {
            registry_group: self.registry_group.clone(),
            registry_key: self.registry_key.clone(),
            registry_value: self.registry_value.clone(),
        }
    }
}

impl From<&ExecutorConfig> for DiscoverConfig {
    fn from(cfg: &ExecutorConfig) -> Self {
        Self {
            endpoint: cfg.server_addr.trim_end_matches('/').to_string(),
            access_token: cfg.access_token.clone(),
            timeout: cfg.timeout(),
            registry_group: cfg.registry_group.clone(),
            registry_key: cfg.registry_key.clone(),
            registry_value: cfg.registry_value(),
            delay: cfg.heartbeat_interval(),
        }
    }
}
