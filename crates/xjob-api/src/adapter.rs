use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use xjob_core::Dispatcher;
use xjob_model::{
    ApiReply, IdleRequest, KillRequest, LogRequest, LogResult, RunRequest, SUCCESS_CODE,
};

use crate::{error::ApiError, handler::ApiHandler};

/// [`ApiHandler`] backed by a local [`Dispatcher`].
pub struct ExecutorAdapter {
    dispatcher: Arc<Dispatcher>,
    address: String,
}

impl ExecutorAdapter {
    /// `address` is the `host:port` reported by `/heartbeat` and `/idle`.
    pub fn new(dispatcher: Arc<Dispatcher>, address: impl Into<String>) -> Self {
        Self {
            dispatcher,
            address: address.into(),
        }
    }
}

#[async_trait]
impl ApiHandler for ExecutorAdapter {
    async fn run(&self, req: RunRequest) -> Result<ApiReply, ApiError> {
        let admission = self.dispatcher.trigger(req)?;
        Ok(ApiReply::message(SUCCESS_CODE, admission.message()))
    }

    async fn kill(&self, req: KillRequest) -> Result<ApiReply, ApiError> {
        self.dispatcher.kill(req.job_id).map_err(ApiError::Kill)?;
        info!(job_id = req.job_id, "kill accepted");
        Ok(ApiReply::success())
    }

    async fn log(&self, req: LogRequest) -> Result<ApiReply<LogResult>, ApiError> {
        let page = self.dispatcher.engine().joblog().read(
            req.log_date_time,
            req.log_id,
            req.from_line_num,
        );
        debug!(log_id = req.log_id, to_line = page.to_line_num, "job log served");
        Ok(ApiReply::with_data(SUCCESS_CODE, "success", page))
    }

    async fn idle(&self, req: IdleRequest) -> Result<ApiReply, ApiError> {
        let idle = self.dispatcher.is_idle(req.job_id);
        Ok(ApiReply::idle(&self.address, idle))
    }

    async fn heartbeat(&self) -> Result<ApiReply, ApiError> {
        Ok(ApiReply::beat(&self.address))
    }
}
