//! # Armature Redis
//!
//! Pooled Redis connections backing Armature's session storage.
//!
//! ## Features
//!
//! - **Typed settings**: [`RedisSettings`] resolved from an open-ended
//!   settings map, with every malformed key reported at once
//! - **Connection Pooling**: bb8 pool bounded by `active`, capped at `idle`
//!   retained connections, with idle eviction
//! - **Dial-time setup**: `AUTH` and `SELECT` applied to every new connection
//! - **Health checks**: connections idle for a minute are pinged before reuse
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use armature_redis::{RedisPoolBuilder, RedisSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = RedisSettings::builder()
//!         .server("127.0.0.1:6379")
//!         .database("2")
//!         .build();
//!
//!     let pool = RedisPoolBuilder::new(settings).build().await?;
//!
//!     // Returned to the pool when `conn` goes out of scope
//!     let mut conn = pool.get().await?;
//!     let value: Option<String> = redis::cmd("GET")
//!         .arg("session-id")
//!         .query_async(&mut *conn)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

mod config;
pub mod duration;
mod error;
mod pool;
#[cfg(test)]
mod test_server;

pub use config::{
    DEFAULT_ACTIVE, DEFAULT_IDLE, DEFAULT_IDLE_TIMEOUT, DEFAULT_SERVER, RedisSettings,
    RedisSettingsBuilder, SETTING_KEYS,
};
pub use duration::parse_duration;
pub use error::{RedisError, Result};
pub use pool::{
    CHECKOUT_TIMEOUT, HEALTH_CHECK_IDLE, PoolStats, PooledSession, RedisPool, RedisPoolBuilder,
    SessionConnection, SessionConnectionManager,
};

// Re-export redis crate for convenience
pub use redis;

/// Prelude for common imports.
///
/// ```
/// use armature_redis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{RedisSettings, RedisSettingsBuilder};
    pub use crate::error::{RedisError, Result};
    pub use crate::pool::{PoolStats, PooledSession, RedisPool, RedisPoolBuilder};
}
