//! Error types for the restaurant search pipeline

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Failure kinds reported to callers of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller supplied invalid or missing required fields
    Validation,
    /// AI output could not be parsed, even after the clarifying retry
    MalformedResponse,
    /// Network, timeout or rate-limit failure from an external collaborator
    ExternalService,
    /// Structured filter values outside the known domain
    InvalidRequest,
    /// The caller cancelled the search
    Cancelled,
}

/// Main error type returned by every search operation
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid input: {message}")]
    Validation { message: String },

    #[error("Malformed AI response: {message}")]
    MalformedResponse { message: String },

    #[error("External service error: {message}")]
    ExternalService { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Search cancelled")]
    Cancelled,
}

impl SearchError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn external<S: Into<String>>(message: S) -> Self {
        Self::ExternalService {
            message: message.into(),
        }
    }

    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Validation { .. } => ErrorKind::Validation,
            SearchError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            SearchError::ExternalService { .. } => ErrorKind::ExternalService,
            SearchError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            SearchError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Validation { message } => format!("Invalid input: {message}"),
            SearchError::MalformedResponse { .. } => {
                "The assistant could not understand that request. Try rephrasing it.".to_string()
            }
            SearchError::ExternalService { .. } => {
                "Unable to reach an external service. Please try again shortly.".to_string()
            }
            SearchError::InvalidRequest { message } => format!("Invalid search filter: {message}"),
            SearchError::Cancelled => "The search was cancelled.".to_string(),
        }
    }
}

/// Transport-level failures raised by the external collaborators
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

impl From<object_store::Error> for ServiceError {
    fn from(err: object_store::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

impl From<ServiceError> for SearchError {
    fn from(err: ServiceError) -> Self {
        SearchError::external(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
