use thiserror::Error;

use crate::types::UserId;

/// Errors surfaced by the directory client and the sync engine.
///
/// Payloads are plain strings so the error is `Clone`: a single bulk load
/// may be awaited by several callers and each of them receives the failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserdeckError {
    /// The server reported the caller as unauthenticated. Terminal for the session.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Transport failure, timeout, or an undecodable response body.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status other than 401/404.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("user '{0}' not found")]
    NotFound(String),

    #[error("a mutation for user {0} is already in progress")]
    MutationInProgress(UserId),

    /// A result arrived for a session that has since ended; it was discarded.
    #[error("session ended before {0} completed")]
    SessionEnded(String),

    #[error("no user is open for editing")]
    NoEditSession,

    #[error("invalid user ID '{0}'")]
    InvalidId(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("YAML parse error: {0}")]
    YamlParse(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl UserdeckError {
    /// True when the failure must end the session (logout + redirect).
    pub fn is_auth(&self) -> bool {
        matches!(self, UserdeckError::Auth(_))
    }

    /// True for failures an operator may retry by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            UserdeckError::Network(_) => true,
            UserdeckError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for UserdeckError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().is_some_and(|s| s == reqwest::StatusCode::UNAUTHORIZED) {
            return UserdeckError::Auth(err.to_string());
        }
        UserdeckError::Network(err.to_string())
    }
}

impl From<std::io::Error> for UserdeckError {
    fn from(err: std::io::Error) -> Self {
        UserdeckError::Io(err.to_string())
    }
}

impl From<serde_yaml_ng::Error> for UserdeckError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        UserdeckError::YamlParse(err.to_string())
    }
}

impl From<serde_json::Error> for UserdeckError {
    fn from(err: serde_json::Error) -> Self {
        UserdeckError::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, UserdeckError>;
