use async_trait::async_trait;
use xjob_model::{ApiReply, IdleRequest, KillRequest, LogRequest, LogResult, RunRequest};

use crate::error::ApiError;

/// Backend of the executor HTTP surface.
///
/// [`ExecutorAdapter`](crate::ExecutorAdapter) serves a local dispatcher;
/// custom implementations can wrap it with extra policy.
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Admits a trigger. Returns before the job body runs.
    async fn run(&self, req: RunRequest) -> Result<ApiReply, ApiError>;

    async fn kill(&self, req: KillRequest) -> Result<ApiReply, ApiError>;

    async fn log(&self, req: LogRequest) -> Result<ApiReply<LogResult>, ApiError>;

    async fn idle(&self, req: IdleRequest) -> Result<ApiReply, ApiError>;

    async fn heartbeat(&self) -> Result<ApiReply, ApiError>;
}
