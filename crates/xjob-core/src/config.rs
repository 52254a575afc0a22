use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::error::CoreError;

/// Static executor configuration.
///
/// Field aliases accept the key names used by existing scheduler deployments
/// (`address`, `appname`, `switch`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Base URL of the scheduling center, e.g. `http://127.0.0.1:8080/xxl-job-admin`.
    #[serde(alias = "address")]
    pub server_addr: String,
    pub access_token: String,
    /// Timeout for every outbound call to the scheduling center.
    pub timeout_ms: u64,
    /// Host advertised to the scheduling center.
    pub executor_ip: String,
    pub port: u16,
    #[serde(alias = "appname")]
    pub registry_key: String,
    pub registry_group: String,
    /// Job log directory; derived from `registry_key` when empty.
    pub log_dir: String,
    /// Master switch; a disabled executor neither serves nor registers.
    #[serde(alias = "switch")]
    pub enabled: bool,
    /// Capacity of each job id's pending queue.
    pub max_queue_size: usize,
    pub pending_tick_ms: u64,
    pub heartbeat_interval_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            server_addr: String::new(),
            access_token: "default_token".to_string(),
            timeout_ms: 3_000,
            executor_ip: default_host(),
            port: 59_000,
            registry_key: "xjob-executor".to_string(),
            registry_group: "EXECUTOR".to_string(),
            log_dir: String::new(),
            enabled: true,
            max_queue_size: 1,
            pending_tick_ms: 10,
            heartbeat_interval_ms: 20_000,
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.server_addr.trim().is_empty() {
            return Err(CoreError::InvalidConfig("server_addr is empty".into()));
        }
        if self.max_queue_size == 0 {
            return Err(CoreError::InvalidConfig(
                "max_queue_size must be at least 1".into(),
            ));
        }
        if self.pending_tick_ms == 0 || self.heartbeat_interval_ms == 0 {
            return Err(CoreError::InvalidConfig("intervals must be positive".into()));
        }
        Ok(())
    }

    /// `host:port` the HTTP surface is reachable at.
    pub fn address(&self) -> String {
        format!("{}:{}", self.executor_ip, self.port)
    }

    /// URL advertised to the scheduling center.
    pub fn registry_value(&self) -> String {
        format!("http://{}", self.address())
    }

    pub fn resolved_log_dir(&self) -> PathBuf {
        if self.log_dir.trim().is_empty() {
            PathBuf::from(format!("/var/log/xjob/{}/jobhandler", self.registry_key))
        } else {
            PathBuf::from(&self.log_dir)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn pending_tick(&self) -> Duration {
        Duration::from_millis(self.pending_tick_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

fn default_host() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}
