//! Redis error types.

use thiserror::Error;

/// Result type for Redis operations.
pub type Result<T> = std::result::Result<T, RedisError>;

/// Redis errors.
#[derive(Debug, Error)]
pub enum RedisError {
    /// Dialing the server failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server rejected `AUTH`.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The server rejected `SELECT`.
    #[error("Database select error: {0}")]
    Select(String),

    /// Pool error.
    #[error("Pool error: {0}")]
    Pool(String),

    /// Timed out waiting for a pooled connection.
    #[error("Timed out waiting for a pooled connection")]
    Timeout,

    /// One or more settings had the wrong type or an unparseable value.
    #[error("Invalid settings: {}", keys.join(", "))]
    InvalidSettings {
        /// Offending setting keys, in the order they were checked.
        keys: Vec<String>,
    },

    /// A duration string could not be parsed.
    #[error("Invalid duration: {0:?}")]
    InvalidDuration(String),

    /// Underlying Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl RedisError {
    /// Check if this error happened while establishing a connection.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Auth(_) | Self::Select(_) | Self::Timeout
        )
    }
}

impl From<bb8::RunError<RedisError>> for RedisError {
    fn from(err: bb8::RunError<RedisError>) -> Self {
        match err {
            bb8::RunError::User(err) => err,
            bb8::RunError::TimedOut => Self::Timeout,
        }
    }
}
