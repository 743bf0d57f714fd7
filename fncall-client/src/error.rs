// Copyright 2025 Fncall Contributors (https://github.com/fncall-rs/fncall)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Error types for backend dispatch and invocation

use fncall_core::TemplateError;
use std::time::Duration;
use thiserror::Error;

/// Result type for invocation operations
pub type InvokeResult<T> = Result<T, InvokeError>;

/// Classification of failures that are never retried.
///
/// This is a closed set: a backend failure is exempt from retry only if it
/// maps onto one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    /// Credentials rejected (HTTP 401)
    Auth,
    /// Credentials valid but the operation is not allowed (HTTP 403)
    Permission,
    /// The request itself is malformed or unfulfillable (HTTP 400/404/422)
    MalformedRequest,
}

impl TerminalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalKind::Auth => "auth",
            TerminalKind::Permission => "permission",
            TerminalKind::MalformedRequest => "malformed_request",
        }
    }
}

/// Errors surfaced by a chat backend
#[derive(Debug, Error)]
pub enum BackendError {
    // Terminal failures
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Backend rejected the request: {0}")]
    InvalidRequest(String),

    // Transient failures
    #[error("Rate limited, retry after {0:?}")]
    RateLimited(Option<Duration>),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed backend reply: {0}")]
    Protocol(String),
}

impl BackendError {
    /// Terminal classification, if any. Terminal failures are never retried.
    pub fn terminal_kind(&self) -> Option<TerminalKind> {
        match self {
            BackendError::Auth(_) => Some(TerminalKind::Auth),
            BackendError::Permission(_) => Some(TerminalKind::Permission),
            BackendError::InvalidRequest(_) => Some(TerminalKind::MalformedRequest),
            _ => None,
        }
    }

    /// Whether this failure is exempt from retry
    pub fn is_terminal(&self) -> bool {
        self.terminal_kind().is_some()
    }

    /// Server-suggested delay before the next attempt, when one was given
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            BackendError::RateLimited(delay) => *delay,
            _ => None,
        }
    }
}

/// Errors surfaced to [`Invoker`](crate::invoker::Invoker) callers.
///
/// Every variant names the function involved; backend failures additionally
/// carry the number of attempts made and the final underlying cause.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("No schema registered for function '{function}'")]
    NotFound { function: String },

    #[error("Failed to render prompt for function '{function}': {source}")]
    Template {
        function: String,
        #[source]
        source: TemplateError,
    },

    #[error("Function '{function}' failed after {attempts} attempt(s): {source}")]
    Backend {
        function: String,
        attempts: u32,
        #[source]
        source: BackendError,
    },

    #[error("Backend reply for function '{function}' carried no function call")]
    MissingFunctionCall { function: String },

    #[error("Arguments for function '{function}' are not valid JSON: {source}")]
    Decode {
        function: String,
        #[source]
        source: serde_json::Error,
    },
}
