use ersha_client::ClientError;
use ersha_core::DraftError;
use thiserror::Error;

/// Failures as the console reports them.
///
/// Client errors are flattened into text at this boundary so they can be kept
/// in view state and cloned into frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// No response could be obtained.
    #[error("network failure: {0}")]
    Network(String),
    /// The server answered with a failure.
    #[error("{message}")]
    Server {
        status: Option<u16>,
        message: String,
    },
    /// The session was rejected. Always escalated, never shown as a form error.
    #[error("session expired, sign in again")]
    Auth,
    /// A client-side check failed before anything was sent.
    #[error("{0}")]
    Validation(String),
    /// The trigger is disabled while a request is in flight.
    #[error("another request is still in progress")]
    Busy,
}

impl ConsoleError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ConsoleError::Auth)
    }
}

impl From<ClientError> for ConsoleError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Network(e) => ConsoleError::Network(e.to_string()),
            ClientError::InvalidBaseUrl(url) => {
                ConsoleError::Network(format!("invalid base url {url}"))
            }
            ClientError::Unauthorized => ConsoleError::Auth,
            ClientError::Server { status, message } => ConsoleError::Server {
                status: Some(status),
                message,
            },
            ClientError::Decode(message) => ConsoleError::Server {
                status: None,
                message: format!("unexpected response from server: {message}"),
            },
        }
    }
}

impl From<DraftError> for ConsoleError {
    fn from(err: DraftError) -> Self {
        ConsoleError::Validation(err.to_string())
    }
}
