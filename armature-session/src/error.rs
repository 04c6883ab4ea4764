//! Error types for session operations.

use armature_redis::RedisError;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session-specific errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The connection has not been opened, or was closed.
    #[error("Invalid connection")]
    InvalidConnection,

    /// No session is stored under the id.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No driver registered under the name.
    #[error("Unknown session driver: {0}")]
    UnknownDriver(String),

    /// Redis backend error
    #[error(transparent)]
    Backend(#[from] RedisError),
}

impl SessionError {
    /// Whether the error means the session does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<redis::RedisError> for SessionError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(RedisError::Redis(err))
    }
}
