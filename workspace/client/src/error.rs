use common::ScenarioId;
use thiserror::Error;

/// Error types for the scenario client
#[derive(Error, Debug)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout)
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote collection answered with a non-success status
    #[error("HTTP error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The remote handed out an identifier from the placeholder namespace
    #[error("Remote returned reserved identifier '{0}'")]
    ReservedId(ScenarioId),

    /// The scenario is still being created and cannot be changed yet
    #[error("Scenario '{0}' has not been created yet")]
    PendingRecord(ScenarioId),

    /// Client construction failed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the error came back from a round trip to the remote
    /// collection, as opposed to being raised locally.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::Status { .. } | Self::Decode(_) | Self::ReservedId(_)
        )
    }

    /// HTTP status of a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Type alias for Result with ClientError
pub type Result<T> = std::result::Result<T, ClientError>;
