use serde::{Deserialize, Serialize};

use crate::{FAIL_CODE, SUCCESS_CODE};

/// Envelope of every executor reply: `{"error":<code>,"msg":<text>,"data":<payload>}`.
///
/// `data` is omitted when empty. Heartbeat and idle replies carry their payload
/// as a JSON-encoded string, which is what the scheduling center expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiReply<T = String> {
    pub error: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiReply<T> {
    pub fn with_data(error: i64, msg: impl Into<String>, data: T) -> Self {
        Self {
            error,
            msg: msg.into(),
            data: Some(data),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error == SUCCESS_CODE
    }
}

impl ApiReply<String> {
    pub fn success() -> Self {
        Self::message(SUCCESS_CODE, "")
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self::message(FAIL_CODE, msg)
    }

    pub fn message(error: i64, msg: impl Into<String>) -> Self {
        Self {
            error,
            msg: msg.into(),
            data: None,
        }
    }

    /// Heartbeat reply; `data` is `{"ip":...}` encoded as a string.
    pub fn beat(ip: &str) -> Self {
        let data = encode(&BeatData { ip: ip.to_string() });
        Self::with_data(SUCCESS_CODE, "", data)
    }

    /// Idle reply. A busy job id answers with a bare failure code.
    pub fn idle(ip: &str, idle: bool) -> Self {
        if !idle {
            return Self::failure("");
        }
        let data = encode(&IdleData {
            ip: ip.to_string(),
            idle,
        });
        Self::with_data(SUCCESS_CODE, "", data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleData {
    pub ip: String,
    pub idle: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatData {
    pub ip: String,
}

fn encode<T: Serialize>(value: &T) -> String {
    // Plain structs of strings and bools always serialize.
    serde_json::to_string(value).unwrap_or_default()
}
