use thiserror::Error;
use xjob_core::CoreError;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("http request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("scheduling center answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("scheduling center rejected call: {0}")]
    Rejected(String),

    #[error("invalid response from scheduling center: {0}")]
    InvalidResponse(String),
}

impl From<DiscoverError> for CoreError {
    fn from(e: DiscoverError) -> Self {
        CoreError::Callback(e.to_string())
    }
}
