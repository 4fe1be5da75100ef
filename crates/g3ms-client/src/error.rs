// Client error types.
//
// Maps HTTP status codes to typed error variants with structured `code`
// and `message` fields extracted from the server's JSON error body.
// Callers match on variants, never on message substrings.

use std::fmt;

/// Errors that can occur when calling the G3MS API.
///
/// Each variant maps to a specific HTTP error status. 410 and 502 get
/// dedicated variants because the signup wizard maps them to specific
/// user-facing copy (expired OTP, SMS delivery failure).
#[derive(Debug, Clone)]
pub enum ClientError {
    /// Network-level error (DNS, connection refused, timeout, TLS).
    Network(String),

    /// 400: the server rejected the request shape or input.
    BadRequest { code: String, message: String },

    /// 401: missing or invalid credentials.
    Unauthorized { code: String, message: String },

    /// 403: insufficient permissions or CSRF failure.
    Forbidden { code: String, message: String },

    /// 404: endpoint or resource doesn't exist.
    NotFound { message: String },

    /// 409: resource already exists or the step was already completed.
    Conflict { code: String, message: String },

    /// 410: the resource expired, e.g. an OTP code past its window.
    Gone { code: String, message: String },

    /// 422: validation error.
    UnprocessableEntity { code: String, message: String },

    /// 429: rate limited.
    TooManyRequests { message: String },

    /// 502: an upstream provider (such as SMS delivery) failed.
    BadGateway { message: String },

    /// Other 5xx server error.
    Server { status: u16, message: String },

    /// Failed to deserialize the response body.
    Deserialization(String),
}

impl ClientError {
    /// Create a network error from a reqwest error.
    pub fn network(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }

    /// Get the machine-readable error code, if available.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::BadRequest { code, .. } => Some(code),
            Self::Unauthorized { code, .. } => Some(code),
            Self::Forbidden { code, .. } => Some(code),
            Self::Conflict { code, .. } => Some(code),
            Self::Gone { code, .. } => Some(code),
            Self::UnprocessableEntity { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            Self::Network(msg) => msg,
            Self::BadRequest { message, .. } => message,
            Self::Unauthorized { message, .. } => message,
            Self::Forbidden { message, .. } => message,
            Self::NotFound { message } => message,
            Self::Conflict { message, .. } => message,
            Self::Gone { message, .. } => message,
            Self::UnprocessableEntity { message, .. } => message,
            Self::TooManyRequests { message } => message,
            Self::BadGateway { message } => message,
            Self::Server { message, .. } => message,
            Self::Deserialization(msg) => msg,
        }
    }

    /// Get the HTTP status code, if applicable.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { .. } => Some(400),
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Conflict { .. } => Some(409),
            Self::Gone { .. } => Some(410),
            Self::UnprocessableEntity { .. } => Some(422),
            Self::TooManyRequests { .. } => Some(429),
            Self::BadGateway { .. } => Some(502),
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is an authentication error (401).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if this is a network-level error.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Returns `true` if this is a rate-limit error (429).
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::TooManyRequests { .. })
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::BadRequest { code, message } => {
                write!(f, "Bad Request [{}]: {}", code, message)
            }
            Self::Unauthorized { code, message } => {
                write!(f, "Unauthorized [{}]: {}", code, message)
            }
            Self::Forbidden { code, message } => {
                write!(f, "Forbidden [{}]: {}", code, message)
            }
            Self::NotFound { message } => write!(f, "Not Found: {}", message),
            Self::Conflict { code, message } => {
                write!(f, "Conflict [{}]: {}", code, message)
            }
            Self::Gone { code, message } => write!(f, "Gone [{}]: {}", code, message),
            Self::UnprocessableEntity { code, message } => {
                write!(f, "Unprocessable Entity [{}]: {}", code, message)
            }
            Self::TooManyRequests { message } => {
                write!(f, "Too Many Requests: {}", message)
            }
            Self::BadGateway { message } => write!(f, "Bad Gateway: {}", message),
            Self::Server { status, message } => {
                write!(f, "Server Error ({}): {}", status, message)
            }
            Self::Deserialization(msg) => write!(f, "Deserialization error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}
