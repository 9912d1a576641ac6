//! # Database Error Classification
//!
//! Decides whether a failed database operation is worth retrying.
//!
//! ## Rules
//!
//! Checked in priority order, first match wins. All message matching is
//! case-insensitive.
//!
//! 1. **Socket timeout**: the database stopped answering mid-query. Always
//!    retryable, even when the message also looks like an auth failure.
//! 2. **Permanent auth**: bad credentials or an unknown role. Retrying cannot
//!    fix these, so they fail fast.
//! 3. **Transient pooler**: `Tenant or user not found`. The connection pooler
//!    reports this under load as well as for bad credentials, so it is retried
//!    rather than treated as permanent.
//! 4. **Connection / pool timeout**: unreachable server, reset sockets, pool
//!    exhaustion, or one of the client connection-error codes.
//! 5. Everything else (constraint violations, not-found, validation) is
//!    non-retryable and must reach the caller untouched.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::database::error_codes::ClientErrorCode;

const SOCKET_TIMEOUT_PATTERNS: &[&str] = &[
    "socket timeout",
    "database failed to respond",
    "failed to respond to a query within the configured timeout",
];

const AUTH_PATTERNS: &[&str] = &["password authentication failed", "authentication failed"];

const TRANSIENT_POOLER_PATTERNS: &[&str] = &["tenant or user not found"];

const POOL_TIMEOUT_PATTERNS: &[&str] = &[
    "connection pool timeout",
    "timed out fetching a new connection",
];

const CONNECTION_PATTERNS: &[&str] = &[
    "can't reach database server",
    "connection terminated",
    "econnreset",
    "econnrefused",
    "etimedout",
    "engine is not yet connected",
    "response from the engine was empty",
];

/// Category assigned to a failed database operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Bad credentials or unknown role - never retried
    PermanentAuth,
    /// Pooler reported "tenant or user not found" - retried
    TransientPooler,
    /// Server unreachable or connection dropped - retried
    Connection,
    /// Database stopped responding within the query timeout - retried
    SocketTimeout,
    /// No pooled connection became available in time - retried
    PoolTimeout,
    /// Business or integrity error - never retried, never counted
    NonRetryable,
}

impl ErrorCategory {
    /// Whether another attempt may succeed
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorCategory::TransientPooler
                | ErrorCategory::Connection
                | ErrorCategory::SocketTimeout
                | ErrorCategory::PoolTimeout
        )
    }

    /// Whether the failure came from database connectivity rather than the
    /// request itself. Read paths may substitute a fallback for these.
    pub fn is_connection_related(self) -> bool {
        self.is_retryable()
    }

    /// Whether the failure counts against circuit breaker and tracker state
    pub fn counts_as_infrastructure_failure(self) -> bool {
        self != ErrorCategory::NonRetryable
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::PermanentAuth => "permanent_auth",
            ErrorCategory::TransientPooler => "transient_pooler",
            ErrorCategory::Connection => "connection",
            ErrorCategory::SocketTimeout => "socket_timeout",
            ErrorCategory::PoolTimeout => "pool_timeout",
            ErrorCategory::NonRetryable => "non_retryable",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error the classifier can inspect
pub trait ClassifiableError {
    /// Human-readable message used for pattern matching
    fn error_message(&self) -> Cow<'_, str>;

    /// Client error code, when the database client attached one
    fn error_code(&self) -> Option<&str> {
        None
    }
}

impl ClassifiableError for str {
    fn error_message(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl ClassifiableError for String {
    fn error_message(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl<T: ClassifiableError + ?Sized> ClassifiableError for &T {
    fn error_message(&self) -> Cow<'_, str> {
        (**self).error_message()
    }

    fn error_code(&self) -> Option<&str> {
        (**self).error_code()
    }
}

impl ClassifiableError for anyhow::Error {
    fn error_message(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{self:#}"))
    }
}

impl ClassifiableError for std::io::Error {
    fn error_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn error_code(&self) -> Option<&str> {
        ClientErrorCode::from_io_kind(self.kind()).map(ClientErrorCode::as_str)
    }
}

impl ClassifiableError for sqlx::Error {
    fn error_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn error_code(&self) -> Option<&str> {
        ClientErrorCode::from_sqlx(self).map(ClientErrorCode::as_str)
    }
}

/// Classify an error by message and optional client error code
pub fn classify(message: &str, code: Option<&str>) -> ErrorCategory {
    let lower = message.to_lowercase();
    let contains_any = |patterns: &[&str]| patterns.iter().any(|p| lower.contains(p));

    if contains_any(SOCKET_TIMEOUT_PATTERNS) {
        return ErrorCategory::SocketTimeout;
    }

    if contains_any(AUTH_PATTERNS) || is_missing_role(&lower) {
        return ErrorCategory::PermanentAuth;
    }

    if contains_any(TRANSIENT_POOLER_PATTERNS) {
        return ErrorCategory::TransientPooler;
    }

    let client_code = code.and_then(ClientErrorCode::parse);

    if contains_any(POOL_TIMEOUT_PATTERNS) || client_code == Some(ClientErrorCode::PoolTimeout) {
        return ErrorCategory::PoolTimeout;
    }

    if contains_any(CONNECTION_PATTERNS) || client_code.is_some() {
        return ErrorCategory::Connection;
    }

    ErrorCategory::NonRetryable
}

/// Classify any [`ClassifiableError`]
pub fn classify_error<E: ClassifiableError + ?Sized>(error: &E) -> ErrorCategory {
    classify(&error.error_message(), error.error_code())
}

/// `role "name" does not exist`, or a message starting with `FATAL: role`.
/// Expects an already-lowercased message.
fn is_missing_role(lower: &str) -> bool {
    if lower.trim_start().starts_with("fatal: role") {
        return true;
    }

    lower
        .find("role \"")
        .map(|start| &lower[start + "role \"".len()..])
        .and_then(|rest| rest.find('"').map(|end| &rest[end..]))
        .is_some_and(|tail| tail.starts_with("\" does not exist"))
}
