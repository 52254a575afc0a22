use thiserror::Error;

/// Failures while setting up process logging.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown logger format `{0}` (expected text|json|journald)")]
    InvalidFormat(String),
    #[error("journald output needs Linux and the `journald` feature")]
    JournaldNotSupported,
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
    #[error("logger setup failed: {0}")]
    InitializationFailed(String),
    #[error("bad log filter `{0}`")]
    InvalidLogLevel(String),
}
