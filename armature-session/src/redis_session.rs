//! Redis session storage driver.
//!
//! Sessions are stored as JSON objects under a key equal to the session id.
//! Expiry is enforced by Redis through `SET ... EX`.

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::traits::{SessionConnect, SessionDriver, SessionMap};
use armature_redis::{PoolStats, RedisPool, RedisPoolBuilder, RedisSettings};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::time::Duration;
use tracing::{debug, info};

/// Name the Redis driver is registered under.
pub const REDIS_DRIVER: &str = "redis";

/// Get the Redis session driver.
pub fn driver() -> RedisSessionDriver {
    RedisSessionDriver
}

/// Stateless factory for [`RedisSessionConnect`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisSessionDriver;

impl SessionDriver for RedisSessionDriver {
    fn connect(&self, name: &str, config: SessionConfig) -> SessionResult<Box<dyn SessionConnect>> {
        Ok(Box::new(RedisSessionConnect::new(name, config)?))
    }
}

/// Redis-backed session connection.
///
/// # Examples
///
/// ```no_run
/// use armature_session::{RedisSessionConnect, SessionConfig, SessionConnect, SessionMap};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = SessionConfig::new(Duration::from_secs(3600))
///         .with_setting("server", "127.0.0.1:6379")
///         .with_setting("database", "1");
///
///     let conn = RedisSessionConnect::new("default", config)?;
///     conn.open().await?;
///
///     let mut value = SessionMap::new();
///     value.insert("user_id".into(), 123.into());
///     conn.write("sess:abc", &value, Duration::from_secs(600)).await?;
///
///     conn.close().await?;
///     Ok(())
/// }
/// ```
pub struct RedisSessionConnect {
    name: String,
    config: SessionConfig,
    settings: RedisSettings,
    pool: RwLock<Option<RedisPool>>,
}

impl RedisSessionConnect {
    /// Create an unopened handle. Resolves settings from `config.setting`
    /// without touching the network.
    pub fn new(name: impl Into<String>, config: SessionConfig) -> SessionResult<Self> {
        let settings = RedisSettings::from_setting(&config.setting)
            .map_err(|e| SessionError::Config(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            config,
            settings,
            pool: RwLock::new(None),
        })
    }

    /// Configuration the handle was created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolved pool settings.
    pub fn settings(&self) -> &RedisSettings {
        &self.settings
    }

    /// Whether [`open`](SessionConnect::open) has succeeded and the handle
    /// has not been closed since.
    pub fn is_open(&self) -> bool {
        self.pool.read().is_some()
    }

    /// Pool statistics, `None` when not open.
    pub fn pool_stats(&self) -> Option<PoolStats> {
        self.pool.read().as_ref().map(RedisPool::stats)
    }

    fn pool(&self) -> SessionResult<RedisPool> {
        self.pool
            .read()
            .clone()
            .ok_or(SessionError::InvalidConnection)
    }
}

/// Seconds for the `EX` modifier of a write, `None` for no expiry.
///
/// A zero `requested` expiry falls back to `default`. Non-zero expiries are
/// truncated to whole seconds but never below one.
pub fn expiry_seconds(requested: Duration, default: Duration) -> Option<u64> {
    let expiry = if requested.is_zero() { default } else { requested };
    if expiry.is_zero() {
        None
    } else {
        Some(expiry.as_secs().max(1))
    }
}

#[async_trait]
impl SessionConnect for RedisSessionConnect {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> SessionResult<()> {
        let pool = RedisPoolBuilder::new(self.settings.clone()).build().await?;
        *self.pool.write() = Some(pool);

        info!(name = %self.name, server = %self.settings.server, "Session store opened");
        Ok(())
    }

    async fn close(&self) -> SessionResult<()> {
        if self.pool.write().take().is_some() {
            info!(name = %self.name, "Session store closed");
        }
        Ok(())
    }

    async fn read(&self, id: &str) -> SessionResult<SessionMap> {
        let pool = self.pool()?;
        let mut conn = pool.get().await?;

        let data: Option<String> = redis::cmd("GET").arg(id).query_async(&mut *conn).await?;
        let json = data.ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        serde_json::from_str(&json).map_err(|e| SessionError::Deserialization(e.to_string()))
    }

    async fn write(&self, id: &str, value: &SessionMap, expiry: Duration) -> SessionResult<()> {
        let pool = self.pool()?;

        let json =
            serde_json::to_string(value).map_err(|e| SessionError::Serialization(e.to_string()))?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(id).arg(json);
        if let Some(secs) = expiry_seconds(expiry, self.config.expiry) {
            cmd.arg("EX").arg(secs);
        }

        let mut conn = pool.get().await?;
        let _: () = cmd.query_async(&mut *conn).await?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> SessionResult<()> {
        let pool = self.pool()?;
        let mut conn = pool.get().await?;

        let _: i64 = redis::cmd("DEL").arg(id).query_async(&mut *conn).await?;

        Ok(())
    }

    async fn clear(&self, prefix: &str) -> SessionResult<usize> {
        let pool = self.pool()?;
        let mut conn = pool.get().await?;

        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(format!("{prefix}*"))
            .query_async(&mut *conn)
            .await?;

        for key in &keys {
            let _: i64 = redis::cmd("DEL").arg(key).query_async(&mut *conn).await?;
        }

        debug!(name = %self.name, prefix = %prefix, cleared = keys.len(), "Cleared sessions");
        Ok(keys.len())
    }
}
