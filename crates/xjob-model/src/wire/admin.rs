use serde::{Deserialize, Serialize};

use crate::{ExecuteResult, SUCCESS_CODE};

/// Body of `POST /api/registry` and `POST /api/registryRemove`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryParam {
    pub registry_group: String,
    pub registry_key: String,
    /// Executor URL the scheduling center calls back, e.g. `http://10.0.0.1:59000`.
    pub registry_value: String,
}

/// One element of the `POST /api/callback` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleCallback {
    pub log_id: i64,
    /// The scheduling center spells this field `logDateTim`.
    #[serde(rename = "logDateTim")]
    pub log_date_time: i64,
    pub execute_result: CallbackResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackResult {
    pub error: i64,
    pub msg: String,
}

impl HandleCallback {
    pub fn new(log_id: i64, log_date_time: i64, result: &ExecuteResult) -> Self {
        Self {
            log_id,
            log_date_time,
            execute_result: CallbackResult {
                error: result.code(),
                msg: result.message(),
            },
        }
    }
}

/// Reply of the scheduling center to any `/api/*` call.
///
/// Different center versions report the status as `code` or `error`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdminReply {
    #[serde(default, alias = "error")]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<serde_json::Value>,
}

impl AdminReply {
    pub fn is_success(&self) -> bool {
        self.code.is_none_or(|code| code == SUCCESS_CODE)
    }

    pub fn message(&self) -> String {
        match &self.msg {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(v) => v.to_string(),
            None => String::new(),
        }
    }
}
