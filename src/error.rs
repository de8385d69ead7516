use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdaptError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Quota exceeded: {0}")]
    Quota(String),
    #[error("Permission denied: {0}")]
    Permission(String),
    #[error("Malformed response: {detail}")]
    MalformedResponse { detail: String, raw: String },
    #[error("No image produced: {reason}")]
    NoImageProduced {
        reason: String,
        envelope: serde_json::Value,
    },
    #[error("Model error: {0}")]
    UnknownModel(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure taxonomy surfaced to callers alongside the human readable summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Auth,
    Quota,
    Permission,
    MalformedResponse,
    NoImageProduced,
    UnknownModel,
    InvalidInput,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "TransportError",
            ErrorKind::Auth => "AuthError",
            ErrorKind::Quota => "QuotaError",
            ErrorKind::Permission => "PermissionError",
            ErrorKind::MalformedResponse => "MalformedResponse",
            ErrorKind::NoImageProduced => "NoImageProduced",
            ErrorKind::UnknownModel => "UnknownModelError",
            ErrorKind::InvalidInput => "InvalidInput",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AdaptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdaptError::Transport(_) => ErrorKind::Transport,
            AdaptError::Auth(_) => ErrorKind::Auth,
            AdaptError::Quota(_) => ErrorKind::Quota,
            AdaptError::Permission(_) => ErrorKind::Permission,
            AdaptError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            AdaptError::NoImageProduced { .. } => ErrorKind::NoImageProduced,
            AdaptError::UnknownModel(_) => ErrorKind::UnknownModel,
            AdaptError::InvalidRequest(_) | AdaptError::Config(_) => ErrorKind::InvalidInput,
        }
    }

    /// Whether the fallback loop should move on to the next candidate.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            AdaptError::MalformedResponse { .. }
                | AdaptError::NoImageProduced { .. }
                | AdaptError::InvalidRequest(_)
                | AdaptError::Config(_)
        )
    }

    /// Maps a non-success HTTP status and its body onto the failure taxonomy.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = format!("HTTP {}: {}", status, body.trim());
        match status {
            401 => AdaptError::Auth(detail),
            400 if body.contains("API_KEY_INVALID") || body.contains("API key not valid") => {
                AdaptError::Auth(detail)
            }
            429 => AdaptError::Quota(detail),
            403 | 404 => AdaptError::Permission(detail),
            _ => AdaptError::UnknownModel(detail),
        }
    }

    /// The raw payload worth showing next to the error, if any.
    pub fn raw_payload(&self) -> Option<String> {
        match self {
            AdaptError::MalformedResponse { raw, .. } => Some(raw.clone()),
            AdaptError::NoImageProduced { envelope, .. } => {
                Some(serde_json::to_string_pretty(envelope).unwrap_or_else(|_| envelope.to_string()))
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AdaptError {
    fn from(value: reqwest::Error) -> Self {
        if let Some(status) = value.status() {
            return AdaptError::from_status(status.as_u16(), &value.to_string());
        }
        AdaptError::Transport(value.to_string())
    }
}

/// Terminal failure description attached to a [`crate::models::GenerationResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub summary: String,
    pub detail: String,
    pub attempts: usize,
    pub raw_payload: Option<String>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            summary: summary.into(),
            detail: detail.into(),
            attempts: 0,
            raw_payload: None,
        }
    }

    pub fn from_error(summary: impl Into<String>, error: &AdaptError) -> Self {
        Self {
            kind: error.kind(),
            summary: summary.into(),
            detail: error.to_string(),
            attempts: 0,
            raw_payload: error.raw_payload(),
        }
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.summary, self.kind, self.detail)
    }
}

pub type Result<T> = std::result::Result<T, AdaptError>;
