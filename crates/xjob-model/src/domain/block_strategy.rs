use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Policy applied when a trigger arrives for a job id whose slot is already occupied.
///
/// On the wire the variants travel as `SERIAL_EXECUTION`, `DISCARD_LATER`,
/// `DISCARD_LATER_NO_ALARM` and `COVER_EARLY`. Decoding is lenient: a missing or
/// unknown value becomes [`BlockStrategy::SerialExecution`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockStrategy {
    /// Queue the trigger and run it after the current one (bounded FIFO).
    #[default]
    SerialExecution,
    /// Drop the trigger and report failure upstream.
    DiscardLater,
    /// Drop the trigger and report success upstream.
    DiscardLaterNoAlarm,
    /// Cancel the current execution and run the new trigger immediately.
    CoverEarly,
}

impl BlockStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockStrategy::SerialExecution => "SERIAL_EXECUTION",
            BlockStrategy::DiscardLater => "DISCARD_LATER",
            BlockStrategy::DiscardLaterNoAlarm => "DISCARD_LATER_NO_ALARM",
            BlockStrategy::CoverEarly => "COVER_EARLY",
        }
    }
}

impl fmt::Display for BlockStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown block strategy: {0}")]
pub struct UnknownStrategy(pub String);

impl FromStr for BlockStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SERIAL_EXECUTION" => Ok(BlockStrategy::SerialExecution),
            "DISCARD_LATER" => Ok(BlockStrategy::DiscardLater),
            "DISCARD_LATER_NO_ALARM" => Ok(BlockStrategy::DiscardLaterNoAlarm),
            "COVER_EARLY" => Ok(BlockStrategy::CoverEarly),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

impl From<String> for BlockStrategy {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl From<BlockStrategy> for String {
    fn from(s: BlockStrategy) -> Self {
        s.as_str().to_string()
    }
}
