//! Data types shared by the xjob executor crates.
//!
//! `domain` holds the executor's own vocabulary (trigger requests, blocking
//! strategies, execution outcomes). `wire` holds the JSON shapes exchanged
//! with the scheduling center, both inbound and outbound.

mod domain;
pub use domain::*;

mod wire;
pub use wire::*;

/// Access token header checked on every inbound call and sent on every outbound call.
pub const ACCESS_TOKEN_HEADER: &str = "XXL-JOB-ACCESS-TOKEN";

/// Body code for a successful call.
pub const SUCCESS_CODE: i64 = 200;

/// Body code for a failed or rejected call.
pub const FAIL_CODE: i64 = 500;
