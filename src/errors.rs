use std::time::Duration;
use thiserror::Error;

/// Result type alias for silence operations
pub type Result<T> = std::result::Result<T, SilenceError>;

/// Errors that can occur when managing silences
#[derive(Debug, Error)]
pub enum SilenceError {
    /// Invalid input detected before any request was made
    #[error("{0}")]
    Validation(String),

    /// Mode is not one of create, delete or show
    #[error("Unrecognized mode parameter: {0}")]
    UnrecognizedMode(String),

    /// Base or endpoint URL could not be parsed
    #[error("Cannot parse URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Failed to build HTTP client
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest_middleware::Error),

    /// Alertmanager API returned a non-200 response
    #[error("Alertmanager API error: HTTP {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body returned by Alertmanager
        message: String,
    },

    /// The local wait for a single call exceeded its budget
    #[error("Alertmanager connection timeout after {0:?}")]
    Timeout(Duration),

    /// Failed to serialize a silence
    #[error("Failed to serialize silence: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Alertmanager returned a body that is not the expected JSON
    #[error("Failed to parse Alertmanager response: {0}")]
    Parse(#[source] serde_json::Error),

    /// A dispatched request task panicked or was aborted
    #[error("Request task failed: {0}")]
    Task(#[source] tokio::task::JoinError),

    /// One or more concurrent calls failed
    #[error("{}", join_messages(.0))]
    Aggregate(Vec<SilenceError>),

    /// Writing operator output failed
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

fn join_messages(errors: &[SilenceError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl SilenceError {
    /// Check if the error is a local timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if the error came from the network or the remote service
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Api { .. })
    }

    /// Check if the error was raised before any network activity
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::UnrecognizedMode(_) | Self::InvalidUrl { .. }
        )
    }
}
