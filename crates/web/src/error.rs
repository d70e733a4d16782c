//! Error types of the request-handling core.
//!
//! The taxonomy follows the life of a request:
//! - [`RouteError`]: a route could not be registered, raised at startup
//! - [`TransportError`]: the connection failed to deliver or accept a message
//! - [`RequestError`]: the request body could not be read or decoded
//! - [`ApplicationError`]: a handler deliberately answers with a status and detail
//!
//! Handlers and pipeline stages return [`BoxError`], so any error can be propagated with `?`.
//! Only an [`ApplicationError`] reaches the client as-is, everything else becomes a 500.

use http::StatusCode;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("unterminated placeholder at byte {position} in route template '{template}'")]
    UnterminatedPlaceholder { template: String, position: usize },

    #[error("empty placeholder at byte {position} in route template '{template}'")]
    EmptyPlaceholder { template: String, position: usize },

    #[error("invalid placeholder at byte {position} in route template '{template}': {reason}")]
    InvalidPlaceholder { template: String, position: usize, reason: String },

    #[error("invalid http method '{method}'")]
    InvalidMethod { method: String },
}

impl RouteError {
    pub fn unterminated_placeholder<S: ToString>(template: S, position: usize) -> Self {
        Self::UnterminatedPlaceholder { template: template.to_string(), position }
    }

    pub fn empty_placeholder<S: ToString>(template: S, position: usize) -> Self {
        Self::EmptyPlaceholder { template: template.to_string(), position }
    }

    pub fn invalid_placeholder<S: ToString, R: ToString>(template: S, position: usize, reason: R) -> Self {
        Self::InvalidPlaceholder { template: template.to_string(), position, reason: reason.to_string() }
    }

    pub fn invalid_method<S: ToString>(method: S) -> Self {
        Self::InvalidMethod { method: method.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("failed to receive request body: {source}")]
    Receive {
        #[from]
        source: TransportError,
    },

    #[error("request body is not valid utf-8: {source}")]
    Utf8 {
        #[from]
        source: std::str::Utf8Error,
    },

    #[error("request body is not valid json: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// An error a handler raises on purpose to answer with `status` and a `{"detail": ...}` body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: {detail}", .status.as_u16())]
pub struct ApplicationError {
    status: StatusCode,
    detail: String,
}

impl ApplicationError {
    /// Creates an error whose detail is `HTTP <status code>`.
    pub fn new(status: StatusCode) -> Self {
        Self { status, detail: format!("HTTP {}", status.as_u16()) }
    }

    pub fn with_detail<S: Into<String>>(status: StatusCode, detail: S) -> Self {
        Self { status, detail: detail.into() }
    }

    pub fn bad_request<S: Into<String>>(detail: S) -> Self {
        Self::with_detail(StatusCode::BAD_REQUEST, detail)
    }

    pub fn not_found<S: Into<String>>(detail: S) -> Self {
        Self::with_detail(StatusCode::NOT_FOUND, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}
