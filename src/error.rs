use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field-level diagnostic attached to a `400 Bad Request` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationDetail {
    /// Name of the offending parameter.
    pub parameter: String,
    /// Value that was rejected, if the server echoed it back.
    #[serde(default)]
    pub value: Option<Value>,
    /// Human-readable explanation.
    pub message: String,
}

/// Coarse classification of a [`CopyFactoryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    TooManyRequests,
    Internal,
    Timeout,
    Api,
    Transport,
    Decode,
    Client,
}

#[derive(Debug, Error)]
pub enum CopyFactoryError {
    /// HTTP 400.
    #[error("validation error: {message}")]
    Validation {
        message: String,
        details: Vec<ValidationDetail>,
    },

    /// HTTP 401.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// HTTP 403.
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// HTTP 404.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// HTTP 409.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// HTTP 429. `metadata` is the `metadata` object of the response body.
    #[error("too many requests: {message}")]
    TooManyRequests {
        message: String,
        metadata: Map<String, Value>,
        retry_after: Option<Duration>,
    },

    /// HTTP 500.
    #[error("internal server error: {message}")]
    Internal { message: String },

    /// Any other non-2xx status.
    #[error("api error (status {status}): {message}")]
    Api { status: StatusCode, message: String },

    /// Connect or read timeout.
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("url error: {0}")]
    Url(#[from] url::ParseError),

    #[error("header error: {0}")]
    Header(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error(
        "You can not invoke {method} method, because you have connected with account access token. \
         Please use API access token from https://app.metaapi.cloud/token page to invoke this method."
    )]
    WrongTokenType { method: &'static str },
}

impl From<reqwest::Error> for CopyFactoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CopyFactoryError::Timeout(err)
        } else {
            CopyFactoryError::Transport(err)
        }
    }
}

impl CopyFactoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CopyFactoryError::Validation { .. } => ErrorKind::Validation,
            CopyFactoryError::Unauthorized { .. } => ErrorKind::Unauthorized,
            CopyFactoryError::Forbidden { .. } => ErrorKind::Forbidden,
            CopyFactoryError::NotFound { .. } => ErrorKind::NotFound,
            CopyFactoryError::Conflict { .. } => ErrorKind::Conflict,
            CopyFactoryError::TooManyRequests { .. } => ErrorKind::TooManyRequests,
            CopyFactoryError::Internal { .. } => ErrorKind::Internal,
            CopyFactoryError::Api { .. } => ErrorKind::Api,
            CopyFactoryError::Timeout(_) => ErrorKind::Timeout,
            CopyFactoryError::Transport(_) => ErrorKind::Transport,
            CopyFactoryError::Json(_) => ErrorKind::Decode,
            CopyFactoryError::Url(_)
            | CopyFactoryError::Header(_)
            | CopyFactoryError::InvalidParams(_)
            | CopyFactoryError::WrongTokenType { .. } => ErrorKind::Client,
        }
    }

    /// Whether the HTTP engine may transparently retry this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Conflict | ErrorKind::Internal | ErrorKind::Api | ErrorKind::Timeout
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CopyFactoryError::NotFound { .. })
    }

    /// HTTP status the error was classified from, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CopyFactoryError::Validation { .. } => Some(StatusCode::BAD_REQUEST),
            CopyFactoryError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            CopyFactoryError::Forbidden { .. } => Some(StatusCode::FORBIDDEN),
            CopyFactoryError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            CopyFactoryError::Conflict { .. } => Some(StatusCode::CONFLICT),
            CopyFactoryError::TooManyRequests { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            CopyFactoryError::Internal { .. } => Some(StatusCode::INTERNAL_SERVER_ERROR),
            CopyFactoryError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server-provided message for classified API errors, otherwise the display text.
    pub fn message(&self) -> String {
        match self {
            CopyFactoryError::Validation { message, .. }
            | CopyFactoryError::Unauthorized { message }
            | CopyFactoryError::Forbidden { message }
            | CopyFactoryError::NotFound { message }
            | CopyFactoryError::Conflict { message }
            | CopyFactoryError::TooManyRequests { message, .. }
            | CopyFactoryError::Internal { message }
            | CopyFactoryError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Validation details of a 400 response; empty for every other error.
    pub fn details(&self) -> &[ValidationDetail] {
        match self {
            CopyFactoryError::Validation { details, .. } => details,
            _ => &[],
        }
    }

    /// `metadata.recommendedRetryTime` of a 429 response.
    pub fn recommended_retry_time(&self) -> Option<DateTime<Utc>> {
        match self {
            CopyFactoryError::TooManyRequests { metadata, .. } => metadata
                .get("recommendedRetryTime")
                .and_then(crate::time::parse_wire_time),
            _ => None,
        }
    }

    /// Delay advertised by a 429 response, from `Retry-After` or the recommended retry time.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CopyFactoryError::TooManyRequests { retry_after, .. } => retry_after.or_else(|| {
                self.recommended_retry_time()
                    .and_then(|at| (at - Utc::now()).to_std().ok())
            }),
            _ => None,
        }
    }
}
