use reqwest::StatusCode;
use thiserror::Error;

/// Normalized failure of an access-layer call.
///
/// Every variant renders as a single human-readable message via
/// [`ApiError::message`]. Cancellation is not represented here; it is
/// reported as [`Outcome::Cancelled`](super::Outcome::Cancelled).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The payload carried an `error` field. The message is shown verbatim.
    #[error("{message}")]
    Service { status: u16, message: String },

    #[error("{0}")]
    Transport(String),

    #[error("Failed to parse response body: {0}")]
    Decode(String),

    #[error("Failed to encode request body: {0}")]
    Encode(String),

    #[error("Response contained no data")]
    MissingData,

    #[error("Observation has no id; it must be created before it can be updated")]
    MissingId,
}

impl ApiError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::Service { status, .. } if *status == StatusCode::NOT_FOUND.as_u16()
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
