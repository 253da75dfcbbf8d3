use std::io;

use crate::supervisor::ServerRole;

/// Failure to hand a submission to the ingestion role.
#[derive(Debug)]
pub enum RelayError {
    Refused(io::Error),
    Io(io::Error),
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::Refused(err) => write!(f, "Relay connection refused: {err}"),
            RelayError::Io(err) => write!(f, "Relay I/O error: {err}"),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<io::Error> for RelayError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => RelayError::Refused(err),
            _ => RelayError::Io(err),
        }
    }
}

/// A relay payload that is not well-formed URL-encoded text.
#[derive(Debug, PartialEq)]
pub enum DecodeError {
    NotUtf8(std::str::Utf8Error),
    /// Record at `index` (zero-based) does not hold exactly one `=`.
    MalformedRecord { index: usize },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::NotUtf8(err) => write!(f, "Payload is not UTF-8: {err}"),
            DecodeError::MalformedRecord { index } => {
                write!(f, "Malformed record #{index}: expected exactly one '='")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Reading a relay connection to end-of-stream failed.
#[derive(Debug)]
pub enum DrainError {
    TooLarge { limit: usize },
    TimedOut,
    Io(io::Error),
}

impl std::fmt::Display for DrainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrainError::TooLarge { limit } => write!(f, "Payload exceeds {limit} bytes"),
            DrainError::TimedOut => write!(f, "Sender stalled before closing the connection"),
            DrainError::Io(err) => write!(f, "Read error: {err}"),
        }
    }
}

impl std::error::Error for DrainError {}

impl From<io::Error> for DrainError {
    fn from(err: io::Error) -> Self {
        DrainError::Io(err)
    }
}

/// Persistence failures. Every variant is fatal to the ingestion role.
#[derive(Debug)]
pub enum StoreError {
    Unreachable(String),
    Unauthorized(String),
    Rejected(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unreachable(msg) => write!(f, "Store unreachable: {msg}"),
            StoreError::Unauthorized(msg) => write!(f, "Store rejected credentials: {msg}"),
            StoreError::Rejected(msg) => write!(f, "Store rejected write: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unreachable(err.to_string()),
            // invalid_password / invalid_authorization_specification
            sqlx::Error::Database(db)
                if matches!(db.code().as_deref(), Some("28P01") | Some("28000")) =>
            {
                StoreError::Unauthorized(err.to_string())
            }
            _ => StoreError::Rejected(err.to_string()),
        }
    }
}

/// Why a server role stopped other than by a requested shutdown.
#[derive(Debug)]
pub enum RoleError {
    Store(StoreError),
    Serve(ServerRole, io::Error),
    Exited(ServerRole),
    Panicked(ServerRole),
}

impl std::fmt::Display for RoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleError::Store(err) => write!(f, "Ingestion role failed: {err}"),
            RoleError::Serve(role, err) => write!(f, "{role} role failed: {err}"),
            RoleError::Exited(role) => write!(f, "{role} role exited unexpectedly"),
            RoleError::Panicked(role) => write!(f, "{role} role panicked"),
        }
    }
}

impl std::error::Error for RoleError {}

impl From<StoreError> for RoleError {
    fn from(err: StoreError) -> Self {
        RoleError::Store(err)
    }
}
