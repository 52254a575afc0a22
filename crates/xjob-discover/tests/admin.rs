use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use xjob_core::CallbackSink;
use xjob_discover::{AdminClient, DiscoverConfig, DiscoverError, Registrar};
use xjob_model::{ACCESS_TOKEN_HEADER, ExecuteResult, HandleCallback};

#[derive(Debug, Clone)]
struct Hit {
    op: String,
    token: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Stub {
    hits: Arc<Mutex<Vec<Hit>>>,
    reply: Arc<Mutex<Option<Value>>>,
}

impl Stub {
    fn hits(&self, op: &str) -> Vec<Hit> {
        self.hits
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.op == op)
            .cloned()
            .collect()
    }
}

async fn record(
    State(stub): State<Stub>,
    Path(op): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let token = headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    stub.hits.lock().unwrap().push(Hit { op, token, body });
    let reply = stub.reply.lock().unwrap().clone();
    Json(reply.unwrap_or_else(|| json!({"code": 200, "msg": null})))
}

async fn start_admin() -> (Stub, String) {
    let stub = Stub::default();
    let app = Router::new()
        .route("/xxl-job-admin/api/{op}", post(record))
        .with_state(stub.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (stub, format!("http://{addr}/xxl-job-admin"))
}

fn config(endpoint: String) -> DiscoverConfig {
    DiscoverConfig {
        endpoint,
        access_token: "secret".into(),
        timeout: Duration::from_secs(3),
        registry_group: "EXECUTOR".into(),
        registry_key: "orders".into(),
        registry_value: "http://10.0.0.5:59000".into(),
        delay: Duration::from_millis(40),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn registrar_registers_then_deregisters_once() {
    let (stub, endpoint) = start_admin().await;
    let shutdown = CancellationToken::new();
    let handle = Registrar::new(&config(endpoint))
        .unwrap()
        .spawn(shutdown.clone());

    tokio::time::timeout(Duration::from_secs(5), async {
        while stub.hits("registry").len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("two heartbeats");

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop exits")
        .unwrap();

    let registry = stub.hits("registry");
    let removed = stub.hits("registryRemove");
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].body, registry[0].body);
    assert_eq!(
        registry[0].body,
        json!({
            "registryGroup": "EXECUTOR",
            "registryKey": "orders",
            "registryValue": "http://10.0.0.5:59000",
        })
    );
    assert!(
        stub.hits
            .lock()
            .unwrap()
            .iter()
            .all(|h| h.token.as_deref() == Some("secret"))
    );
}

#[tokio::test]
async fn callback_posts_scheduler_shape() {
    let (stub, endpoint) = start_admin().await;
    let client = AdminClient::new(&config(endpoint)).unwrap();

    let items = vec![
        HandleCallback::new(7, 1_700_000_000_000, &ExecuteResult::Done(String::new())),
        HandleCallback::new(8, 1_700_000_000_001, &ExecuteResult::Cancelled),
    ];
    client.deliver(items).await.unwrap();

    let hits = stub.hits("callback");
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0].body,
        json!([
            {"logId": 7, "logDateTim": 1_700_000_000_000i64, "executeResult": {"error": 200, "msg": "success"}},
            {"logId": 8, "logDateTim": 1_700_000_000_001i64, "executeResult": {"error": 500, "msg": "task cancelled"}},
        ])
    );
}

#[tokio::test]
async fn rejected_reply_is_an_error() {
    let (stub, endpoint) = start_admin().await;
    *stub.reply.lock().unwrap() = Some(json!({"code": 500, "msg": "The access token is wrong."}));
    let client = AdminClient::new(&config(endpoint)).unwrap();

    let err = client
        .registry(&config(String::new()).registry_param())
        .await
        .unwrap_err();
    assert!(matches!(err, DiscoverError::Rejected(ref m) if m == "The access token is wrong."));
}

#[tokio::test]
async fn unreachable_center_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = AdminClient::new(&config(format!("http://{addr}"))).unwrap();
    let err = client.callback(&[]).await.unwrap_err();
    assert!(matches!(err, DiscoverError::HttpRequest(_)));
}
