use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::de::DeserializeOwned;
use tracing::{instrument, warn};
use xjob_model::{ACCESS_TOKEN_HEADER, IdleRequest, KillRequest, LogRequest, RunRequest};

use crate::{error::ApiError, handler::ApiHandler};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
    access_token: String,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self {
            handler,
            access_token: String::new(),
        }
    }

    /// Token every request must present in `XXL-JOB-ACCESS-TOKEN`.
    ///
    /// An empty token disables the check.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes (all POST, all answered with HTTP 200):
    /// - /run - Admit a trigger
    /// - /kill - Cancel a job id
    /// - /log - Page through a trigger's job log
    /// - /idle - Whether a job id has nothing running or queued
    /// - /heartbeat - Liveness
    pub fn router(self) -> Router {
        let token: Arc<str> = Arc::from(self.access_token);
        Router::new()
            .route("/run", post(run::<H>))
            .route("/kill", post(kill::<H>))
            .route("/log", post(log::<H>))
            .route("/idle", post(idle::<H>))
            .route("/heartbeat", post(heartbeat::<H>))
            .with_state(self.handler)
            .layer(middleware::from_fn_with_state(token, check_token))
    }
}

async fn check_token(State(token): State<Arc<str>>, req: Request, next: Next) -> Response {
    let presented = req
        .headers()
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !token.is_empty() && presented != &*token {
        warn!(path = %req.uri().path(), "request with bad access token");
        return ApiError::Unauthorized.into_response();
    }
    next.run(req).await
}

fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "undecodable request body");
        ApiError::InvalidRequest(e.to_string())
    })
}

/// POST /run
#[instrument(level = "debug", skip_all)]
async fn run<H: ApiHandler>(
    State(handler): State<Arc<H>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: RunRequest = decode(&body)?;
    Ok(Json(handler.run(req).await?))
}

/// POST /kill
#[instrument(level = "debug", skip_all)]
async fn kill<H: ApiHandler>(
    State(handler): State<Arc<H>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: KillRequest = decode(&body)?;
    Ok(Json(handler.kill(req).await?))
}

/// POST /log
#[instrument(level = "debug", skip_all)]
async fn log<H: ApiHandler>(
    State(handler): State<Arc<H>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: LogRequest = decode(&body)?;
    Ok(Json(handler.log(req).await?))
}

/// POST /idle
#[instrument(level = "debug", skip_all)]
async fn idle<H: ApiHandler>(
    State(handler): State<Arc<H>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: IdleRequest = decode(&body)?;
    Ok(Json(handler.idle(req).await?))
}

/// POST /heartbeat
async fn heartbeat<H: ApiHandler>(
    State(handler): State<Arc<H>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(handler.heartbeat().await?))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tokio::sync::mpsc;
    use tower::ServiceExt;
    use xjob_core::{
        CallbackSink, CoreError, Dispatcher, Engine, JobError, JobFn, JobLogStore, JobRegistry,
    };
    use xjob_model::{HandleCallback, LogResult};

    use super::*;
    use crate::adapter::ExecutorAdapter;

    struct ChannelSink(mpsc::UnboundedSender<HandleCallback>);

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

    struct FixedLog;

    impl JobLogStore for FixedLog {
        fn append(&self, _log_id: i64, _log_date_time: i64, _line: &str) {}

        fn read(&self, _log_date_time: i64, log_id: i64, from_line: i32) -> LogResult {
            LogResult {
                from_line_num: from_line,
                to_line_num: 2,
                log_content: format!("log {log_id}\ndone"),
                is_end: true,
            }
        }
    }

    struct Harness {
        router: Router,
        dispatcher: Arc<Dispatcher>,
        callbacks: mpsc::UnboundedReceiver<HandleCallback>,
    }

    fn harness(token: &str) -> Harness {
        let (tx, callbacks) = mpsc::unbounded_channel();
        let engine = Engine::new(Arc::new(ChannelSink(tx))).with_joblog(Arc::new(FixedLog));
        let registry = JobRegistry::new()
            .with(JobFn::arc("sleepy", |ctx, req| async move {
                let ms = req.executor_params.parse().unwrap_or(10);
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(ms)) => Ok(String::new()),
                    _ = ctx.cancelled() => Err(JobError::Canceled),
                }
            }))
            .unwrap();
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry), Arc::new(engine), 1));
        let adapter = Arc::new(ExecutorAdapter::new(Arc::clone(&dispatcher), "10.0.0.1:59000"));
        Harness {
            router: HttpApi::new(adapter).with_access_token(token).router(),
            dispatcher,
            callbacks,
        }
    }

    async fn call(router: &Router, path: &str, token: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = HttpRequest::builder().method("POST").uri(path);
        if let Some(token) = token {
            builder = builder.header(ACCESS_TOKEN_HEADER, token);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn wrong_token_is_rejected() {
        let h = harness("secret");
        let (status, body) = call(&h.router, "/heartbeat", Some("nope"), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": 500, "msg": "auth token error"}));

        let (_, body) = call(&h.router, "/heartbeat", None, "").await;
        assert_eq!(body["error"], 500);
    }

    #[tokio::test]
    async fn empty_token_accepts_missing_header() {
        let h = harness("");
        let (_, body) = call(&h.router, "/heartbeat", None, "").await;
        assert_eq!(body["error"], 200);
    }

    #[tokio::test]
    async fn heartbeat_reports_address() {
        let h = harness("secret");
        let (_, body) = call(&h.router, "/heartbeat", Some("secret"), "").await;
        assert_eq!(body["error"], 200);
        let data: Value = serde_json::from_str(body["data"].as_str().unwrap()).unwrap();
        assert_eq!(data, json!({"ip": "10.0.0.1:59000"}));
    }

    #[tokio::test]
    async fn malformed_body_is_params_err() {
        let h = harness("secret");
        let (_, body) = call(&h.router, "/run", Some("secret"), "{not json").await;
        assert_eq!(body, json!({"error": 500, "msg": "params err"}));
    }

    #[tokio::test]
    async fn unknown_handler_is_reported() {
        let h = harness("secret");
        let (_, body) = call(
            &h.router,
            "/run",
            Some("secret"),
            r#"{"jobId":1,"executorHandler":"missing","logId":1}"#,
        )
        .await;
        assert_eq!(body, json!({"error": 500, "msg": "Task not registered"}));
    }

    #[tokio::test]
    async fn run_idle_kill_cycle() {
        let mut h = harness("secret");
        let idle = |id: i64| format!(r#"{{"jobId":{id}}}"#);

        let (_, body) = call(&h.router, "/idle", Some("secret"), &idle(3)).await;
        assert_eq!(body["error"], 200);
        let data: Value = serde_json::from_str(body["data"].as_str().unwrap()).unwrap();
        assert_eq!(data["idle"], true);

        let trigger = r#"{"jobId":3,"executorHandler":"sleepy","executorParams":"10000",
            "executorBlockStrategy":"SERIAL_EXECUTION","logId":31,"logDateTime":1700000000000}"#;
        let (_, body) = call(&h.router, "/run", Some("secret"), trigger).await;
        assert_eq!(body, json!({"error": 200, "msg": ""}));
        assert!(!h.dispatcher.is_idle(3));

        let (_, body) = call(&h.router, "/run", Some("secret"), trigger).await;
        assert_eq!(body, json!({"error": 500, "msg": "There are 1 tasks running"}));

        let (_, body) = call(&h.router, "/idle", Some("secret"), &idle(3)).await;
        assert_eq!(body, json!({"error": 500, "msg": ""}));

        let (_, body) = call(&h.router, "/kill", Some("secret"), &idle(3)).await;
        assert_eq!(body, json!({"error": 200, "msg": ""}));
        let cb = tokio::time::timeout(Duration::from_secs(5), h.callbacks.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cb.log_id, 31);
        assert_eq!(cb.log_date_time, 1_700_000_000_000);

        let (_, body) = call(&h.router, "/kill", Some("secret"), &idle(3)).await;
        assert_eq!(body, json!({"error": 500, "msg": "Task kill err"}));
    }

    #[tokio::test]
    async fn no_alarm_discard_answers_success() {
        let h = harness("");
        let first = r#"{"jobId":4,"executorHandler":"sleepy","executorParams":"10000",
            "executorBlockStrategy":"DISCARD_LATER_NO_ALARM","logId":41}"#;
        let (_, body) = call(&h.router, "/run", None, first).await;
        assert_eq!(body["error"], 200);

        let (_, body) = call(&h.router, "/run", None, first).await;
        assert_eq!(body, json!({"error": 200, "msg": "There are tasks running"}));

        let loud = first.replace("DISCARD_LATER_NO_ALARM", "DISCARD_LATER");
        let (_, body) = call(&h.router, "/run", None, &loud).await;
        assert_eq!(body, json!({"error": 500, "msg": "There are tasks running"}));

        h.dispatcher.kill(4).unwrap();
    }

    #[tokio::test]
    async fn log_pages_through_store() {
        let h = harness("secret");
        let (_, body) = call(
            &h.router,
            "/log",
            Some("secret"),
            r#"{"logDateTime":1700000000000,"logId":9,"fromLineNum":1}"#,
        )
        .await;
        assert_eq!(
            body,
            json!({
                "error": 200,
                "msg": "success",
                "data": {"fromLineNum": 1, "toLineNum": 2, "logContent": "log 9\ndone", "isEnd": true}
            })
        );
    }
}
