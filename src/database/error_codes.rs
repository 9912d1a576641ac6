//! Database Client Error Codes
//!
//! The database client attaches a short code to connection-level failures.
//! Three of them mark an infrastructure problem the retry layer should treat
//! as a connection error:
//!
//! | Code    | Meaning                                   |
//! |---------|-------------------------------------------|
//! | `P1001` | database server cannot be reached         |
//! | `P1008` | operation timed out                       |
//! | `P2024` | timed out fetching a connection from pool |
//!
//! Errors coming from sqlx carry no such code, so [`ClientErrorCode::from_sqlx`]
//! derives one from the sqlx error variant.

use std::io::ErrorKind;

/// Connection-error codes reported by the database client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientErrorCode {
    CannotReachServer,
    OperationTimedOut,
    PoolTimeout,
}

impl ClientErrorCode {
    pub const CANNOT_REACH_SERVER: &'static str = "P1001";
    pub const OPERATION_TIMED_OUT: &'static str = "P1008";
    pub const POOL_TIMEOUT: &'static str = "P2024";

    pub const fn as_str(self) -> &'static str {
        match self {
            ClientErrorCode::CannotReachServer => Self::CANNOT_REACH_SERVER,
            ClientErrorCode::OperationTimedOut => Self::OPERATION_TIMED_OUT,
            ClientErrorCode::PoolTimeout => Self::POOL_TIMEOUT,
        }
    }

    /// Parse one of the known codes; anything else is not a connection code
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            Self::CANNOT_REACH_SERVER => Some(ClientErrorCode::CannotReachServer),
            Self::OPERATION_TIMED_OUT => Some(ClientErrorCode::OperationTimedOut),
            Self::POOL_TIMEOUT => Some(ClientErrorCode::PoolTimeout),
            _ => None,
        }
    }

    /// Map a socket-level failure onto a connection code
    pub fn from_io_kind(kind: ErrorKind) -> Option<Self> {
        match kind {
            ErrorKind::TimedOut => Some(ClientErrorCode::OperationTimedOut),
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => Some(ClientErrorCode::CannotReachServer),
            _ => None,
        }
    }

    /// Derive a connection code from a sqlx error variant
    ///
    /// `PoolClosed` maps to nothing; a pool is only closed by shutdown.
    pub fn from_sqlx(error: &sqlx::Error) -> Option<Self> {
        match error {
            sqlx::Error::PoolTimedOut => Some(ClientErrorCode::PoolTimeout),
            sqlx::Error::Io(io) => {
                Self::from_io_kind(io.kind()).or(Some(ClientErrorCode::CannotReachServer))
            }
            sqlx::Error::Tls(_) | sqlx::Error::WorkerCrashed => {
                Some(ClientErrorCode::CannotReachServer)
            }
            _ => None,
        }
    }
}
