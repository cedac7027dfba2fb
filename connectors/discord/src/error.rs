//! Discord login error types.
//!
//! Two layers: [`DiscordError`] is what the HTTP client sees on the wire,
//! [`LoginError`] is what the host sees. Nothing from `reqwest` crosses the
//! host boundary.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while talking to the Discord API.
#[derive(Error, Debug)]
pub enum DiscordError {
    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Discord REST API returned an error payload
    #[error("Discord API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        /// JSON error code from the body, when Discord sent one
        code: Option<i32>,
        message: String,
    },

    /// OAuth2 endpoint returned an `error` payload
    #[error("OAuth error {error}: {description}")]
    OAuth {
        status: u16,
        error: String,
        description: String,
    },

    /// Rate limited
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: f64 },
}

impl DiscordError {
    /// HTTP status of the failed exchange, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Api { status, .. } | Self::OAuth { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Json(_) => None,
        }
    }

    /// Get the provider's suggested retry delay.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => {
                Duration::try_from_secs_f64(retry_after.clamp(0.0, 3600.0)).ok()
            }
            _ => None,
        }
    }
}

/// Result type for Discord API operations.
pub type DiscordResult<T> = Result<T, DiscordError>;

/// Error envelope handed to the host: a stable machine code plus a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the login method to its host.
#[derive(Error, Debug)]
pub enum LoginError {
    /// Module configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Discord rejected the request or could not be reached
    #[error("Discord upstream error: {message}")]
    Upstream {
        /// Provider error code (`invalid_grant`, `50013`, `timeout`, ...)
        code: Option<String>,
        message: String,
        status: Option<u16>,
    },

    /// The user granted fewer scopes than the login method needs
    #[error(
        "Insufficient OAuth scopes: granted [{}], required [{}]",
        .granted.join(" "),
        .required.join(" ")
    )]
    Scope {
        granted: Vec<String>,
        required: Vec<String>,
    },

    /// Input rejected at the boundary
    #[error("Validation error: {0}")]
    Validation(String),

    /// A module resource file could not be read or parsed
    #[error("Failed to load {path}: {message}")]
    Resource { path: String, message: String },
}

impl LoginError {
    /// Stable machine code for this error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Upstream { .. } => "upstream_error",
            Self::Scope { .. } => "scope_error",
            Self::Validation(_) => "validation_error",
            Self::Resource { .. } => "resource_error",
        }
    }

    /// Convert to the host's error envelope.
    #[must_use]
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody::new(self.code(), self.to_string())
    }
}

impl From<DiscordError> for LoginError {
    fn from(err: DiscordError) -> Self {
        let status = err.status();
        match err {
            DiscordError::Http(e) => Self::Upstream {
                code: Some(if e.is_timeout() { "timeout" } else { "http_error" }.into()),
                message: e.to_string(),
                status,
            },
            DiscordError::Json(e) => Self::Upstream {
                code: Some("invalid_response".into()),
                message: format!("Unexpected response body: {e}"),
                status,
            },
            DiscordError::Api { code, message, .. } => Self::Upstream {
                code: code.map(|c| c.to_string()),
                message,
                status,
            },
            DiscordError::OAuth {
                error, description, ..
            } => Self::Upstream {
                message: if description.is_empty() {
                    error.clone()
                } else {
                    description
                },
                code: Some(error),
                status,
            },
            err @ DiscordError::RateLimited { .. } => Self::Upstream {
                code: Some("rate_limited".into()),
                message: err.to_string(),
                status,
            },
        }
    }
}

/// Result type for host-facing operations.
pub type LoginResultOf<T> = Result<T, LoginError>;
