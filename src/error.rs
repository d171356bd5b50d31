use serde::Deserialize;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("invalid input: {0}")]
    Validation(String),
}

impl Error {
    pub fn code_str(&self) -> &'static str {
        match self {
            Error::Auth(_) => "auth_failed",
            Error::Api(_) => "upstream_error",
            Error::Validation(_) => "invalid_input",
        }
    }

    /// HTTP status of the failed upstream call, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(err) => err.status,
            _ => None,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

/// A Graph call that failed either in transport or with a non-success status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
    pub body: Option<String>,
}

impl ApiError {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            body: None,
        }
    }

    /// Builds the error from a non-success response, preferring the message
    /// inside Graph's `{"error": {...}}` envelope over the raw body.
    pub(crate) fn from_response(status: u16, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body).trim().to_string();
        let message = serde_json::from_slice::<GraphErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error.into_message())
            .unwrap_or_else(|| {
                if text.is_empty() {
                    "no response body".to_string()
                } else {
                    text.clone()
                }
            });
        Self {
            status: Some(status),
            message,
            body: (!text.is_empty()).then_some(text),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "graph api returned HTTP {status}: {}", self.message),
            None => write!(f, "graph api request failed: {}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorBody,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl GraphErrorBody {
    fn into_message(self) -> Option<String> {
        match (self.code, self.message) {
            (_, Some(message)) if !message.trim().is_empty() => Some(message),
            (Some(code), _) => Some(code),
            _ => None,
        }
    }
}
