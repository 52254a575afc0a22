use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use xjob_api::{ExecutorAdapter, HttpApi};
use xjob_core::{
    Dispatcher, Engine, ExecutorConfig, JobError, JobFn, JobRegistry, PendingLoop,
};
use xjob_discover::{AdminClient, DiscoverConfig, Registrar};
use xjob_observe::{FileJobLog, LoggerConfig, logger_init};
use xjob_prometheus::{PrometheusMetrics, TextEncoder};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DemoConfig {
    executor: ExecutorConfig,
    logger: LoggerConfig,
}

fn load_config() -> anyhow::Result<DemoConfig> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/executor/executor.toml"));
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn jobs() -> anyhow::Result<JobRegistry> {
    let registry = JobRegistry::new()
        .with(JobFn::arc("echo", |ctx, req| async move {
            ctx.log(format!("echo params: {}", req.executor_params));
            Ok(req.executor_params)
        }))?
        .with(JobFn::arc("sleep", |ctx, req| async move {
            let ms: u64 = req.executor_params.trim().parse().unwrap_or(1_000);
            ctx.log(format!("sleeping {ms}ms"));
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(ms)) => Ok(format!("slept {ms}ms")),
                _ = ctx.cancelled() => Err(JobError::Canceled),
            }
        }))?
        .with(JobFn::arc("fail", |_ctx, req| async move {
            Err(JobError::fail(format!("asked to fail: {}", req.executor_params)))
        }))?;
    Ok(registry)
}

async fn serve_metrics(State(metrics): State<Arc<PrometheusMetrics>>) -> impl IntoResponse {
    let mut body = String::new();
    match TextEncoder::new().encode_utf8(&metrics.gather(), &mut body) {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            e.to_string(),
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Config + logger
    let cfg = load_config()?;
    logger_init(&cfg.logger).context("initializing logger")?;
    let exec = cfg.executor;
    if !exec.enabled {
        info!("executor disabled by config, exiting");
        return Ok(());
    }
    exec.validate()?;
    info!(addr = %exec.address(), admin = %exec.server_addr, "config loaded");

    // 2) Outbound client, metrics, job log
    let discover = DiscoverConfig::from(&exec);
    let admin = Arc::new(AdminClient::new(&discover)?);
    let metrics = Arc::new(PrometheusMetrics::new()?);
    let joblog = Arc::new(
        FileJobLog::new(exec.resolved_log_dir()).context("starting job log writer")?,
    );
    info!(dir = %joblog.root().display(), "job log directory");

    // 3) Engine + dispatcher
    let engine = Engine::new(admin.clone())
        .with_metrics(metrics.clone())
        .with_joblog(joblog.clone());
    let registry = jobs()?;
    let names: Vec<&str> = registry.names().collect();
    info!(jobs = ?names, "jobs registered");
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(registry),
        Arc::new(engine),
        exec.max_queue_size,
    ));

    // 4) Background loops
    let shutdown = CancellationToken::new();
    let pending = PendingLoop::new(&dispatcher, exec.pending_tick()).spawn(shutdown.clone());
    let registrar =
        Registrar::with_client(admin.as_ref().clone(), &discover).spawn(shutdown.clone());

    // 5) HTTP surface
    let adapter = Arc::new(ExecutorAdapter::new(dispatcher, exec.address()));
    let app = HttpApi::new(adapter)
        .with_access_token(exec.access_token.clone())
        .router()
        .merge(Router::new().route("/metrics", get(serve_metrics)).with_state(metrics));

    let bind = format!("0.0.0.0:{}", exec.port);
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!(%bind, "executor listening, press Ctrl+C to stop");

    let stop = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl-c handler failed");
        }
        info!("shutting down...");
        stop.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await
        .context("http server")?;

    let _ = pending.await;
    let _ = registrar.await;
    joblog.flush().await;
    info!("executor stopped");
    Ok(())
}
