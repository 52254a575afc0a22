//! Process logging and per-trigger job log files.

mod logger;
pub use logger::*;

mod joblog;
pub use joblog::FileJobLog;
