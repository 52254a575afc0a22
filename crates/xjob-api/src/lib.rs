//! Inbound HTTP surface of the executor: `/run`, `/kill`, `/log`, `/idle`
//! and `/heartbeat`, guarded by the access token header.

mod error;
pub use error::ApiError;

mod handler;
pub use handler::ApiHandler;

mod adapter;
pub use adapter::ExecutorAdapter;

mod http;
pub use http::HttpApi;

pub use axum;
