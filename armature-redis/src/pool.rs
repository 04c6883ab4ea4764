//! Redis connection pool.
//!
//! Connections are dialed by [`SessionConnectionManager`], which applies
//! `AUTH` and `SELECT` from the [`RedisSettings`] before a connection is
//! handed to the pool. Checked-out connections are wrapped in
//! [`PooledSession`], which returns them to the pool when dropped.
//!
//! bb8 reports dial failures to an error sink rather than to the waiting
//! caller. The pool installs a sink that broadcasts them, and
//! [`RedisPool::get`] returns the first one it sees instead of waiting out
//! [`CHECKOUT_TIMEOUT`].

use bb8::{ErrorSink, ManageConnection, Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use redis::{Client, RedisResult};
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{RedisError, RedisSettings, Result};

/// Connections idle for at least this long are pinged before reuse.
pub const HEALTH_CHECK_IDLE: Duration = Duration::from_secs(60);

/// How long a caller waits for a connection once `active` are checked out.
pub const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// A dialed, authenticated connection owned by the pool.
pub struct SessionConnection {
    conn: MultiplexedConnection,
    returned_at: Instant,
    retired: bool,
}

impl SessionConnection {
    fn new(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            returned_at: Instant::now(),
            retired: false,
        }
    }

    /// Time since the connection was dialed or last returned to the pool.
    pub fn idle_for(&self) -> Duration {
        self.returned_at.elapsed()
    }
}

/// bb8 connection manager for session connections.
pub struct SessionConnectionManager {
    settings: RedisSettings,
    client: Client,
}

impl SessionConnectionManager {
    /// Create a manager for the given settings. Does not touch the network.
    pub fn new(settings: RedisSettings) -> Result<Self> {
        let client = Client::open(settings.connection_url())
            .map_err(|e| RedisError::Connection(e.to_string()))?;
        Ok(Self { settings, client })
    }

    /// Settings this manager dials with.
    pub fn settings(&self) -> &RedisSettings {
        &self.settings
    }
}

impl ManageConnection for SessionConnectionManager {
    type Connection = SessionConnection;
    type Error = RedisError;

    async fn connect(&self) -> Result<SessionConnection> {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(target: "session.redis.dial", server = %self.settings.server, error = %e, "Redis dial failed");
                return Err(RedisError::Connection(e.to_string()));
            }
        };

        if !self.settings.password.is_empty() {
            let auth: RedisResult<()> = redis::cmd("AUTH")
                .arg(&self.settings.password)
                .query_async(&mut conn)
                .await;
            if let Err(e) = auth {
                warn!(target: "session.redis.auth", server = %self.settings.server, error = %e, "Redis AUTH rejected");
                return Err(RedisError::Auth(e.to_string()));
            }
        }

        if !self.settings.database.is_empty() {
            let select: RedisResult<()> = redis::cmd("SELECT")
                .arg(&self.settings.database)
                .query_async(&mut conn)
                .await;
            if let Err(e) = select {
                warn!(target: "session.redis.select", server = %self.settings.server, database = %self.settings.database, error = %e, "Redis SELECT rejected");
                return Err(RedisError::Select(e.to_string()));
            }
        }

        Ok(SessionConnection::new(conn))
    }

    async fn is_valid(&self, conn: &mut SessionConnection) -> Result<()> {
        let idle = conn.idle_for();
        if idle < HEALTH_CHECK_IDLE {
            return Ok(());
        }

        debug!(idle_secs = idle.as_secs(), "Pinging idle Redis connection");
        let _: String = redis::cmd("PING").query_async(&mut conn.conn).await?;
        Ok(())
    }

    fn has_broken(&self, conn: &mut SessionConnection) -> bool {
        conn.retired
    }
}

/// A dial, AUTH or SELECT failure reported by the manager.
#[derive(Debug, Clone)]
enum DialFailure {
    Connection(String),
    Auth(String),
    Select(String),
}

impl DialFailure {
    fn from_error(error: &RedisError) -> Option<Self> {
        match error {
            RedisError::Connection(msg) => Some(Self::Connection(msg.clone())),
            RedisError::Auth(msg) => Some(Self::Auth(msg.clone())),
            RedisError::Select(msg) => Some(Self::Select(msg.clone())),
            _ => None,
        }
    }
}

impl From<DialFailure> for RedisError {
    fn from(failure: DialFailure) -> Self {
        match failure {
            DialFailure::Connection(msg) => RedisError::Connection(msg),
            DialFailure::Auth(msg) => RedisError::Auth(msg),
            DialFailure::Select(msg) => RedisError::Select(msg),
        }
    }
}

/// Error sink that hands dial failures to callers blocked in `get`.
#[derive(Debug, Clone)]
struct DialErrorSink {
    tx: broadcast::Sender<DialFailure>,
}

impl ErrorSink<RedisError> for DialErrorSink {
    fn sink(&self, error: RedisError) {
        if let Some(failure) = DialFailure::from_error(&error) {
            // No receivers means nobody is waiting
            let _ = self.tx.send(failure);
        }
    }

    fn boxed_clone(&self) -> Box<dyn ErrorSink<RedisError>> {
        Box::new(self.clone())
    }
}

/// Connection pool statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total connections.
    pub connections: u32,
    /// Idle connections.
    pub idle_connections: u32,
}

/// A bounded pool of session connections.
///
/// Cloning is cheap and shares the same underlying pool. The pool closes
/// its connections once the last clone is dropped.
#[derive(Clone)]
pub struct RedisPool {
    inner: Pool<SessionConnectionManager>,
    max_idle: u32,
    dial_failures: broadcast::Sender<DialFailure>,
}

impl RedisPool {
    /// Borrow a connection.
    ///
    /// Waits up to [`CHECKOUT_TIMEOUT`] when every active slot is in use.
    /// A dial, AUTH or SELECT failure that happens while waiting is returned
    /// as soon as it occurs. The next borrow dials again.
    pub async fn get(&self) -> Result<PooledSession<'_>> {
        // Subscribe first so a failure of the dial this borrow starts is seen
        let mut dial_failures = self.dial_failures.subscribe();
        let conn = tokio::select! {
            conn = self.inner.get() => conn?,
            Ok(failure) = dial_failures.recv() => return Err(failure.into()),
        };
        Ok(PooledSession {
            conn,
            pool: self,
        })
    }

    /// Get pool statistics.
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state();
        PoolStats {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }

    /// Maximum idle connections retained.
    pub fn max_idle(&self) -> u32 {
        self.max_idle
    }
}

/// A borrowed connection, returned to the pool on drop.
///
/// Connections returned while the pool already holds `max_idle` idle
/// connections are closed instead of kept.
pub struct PooledSession<'a> {
    conn: PooledConnection<'a, SessionConnectionManager>,
    pool: &'a RedisPool,
}

impl Deref for PooledSession<'_> {
    type Target = MultiplexedConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn.conn
    }
}

impl DerefMut for PooledSession<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn.conn
    }
}

impl Drop for PooledSession<'_> {
    fn drop(&mut self) {
        self.conn.returned_at = Instant::now();
        if self.pool.inner.state().idle_connections >= self.pool.max_idle {
            self.conn.retired = true;
        }
    }
}

/// Builder for creating Redis connection pools.
pub struct RedisPoolBuilder {
    settings: RedisSettings,
}

impl RedisPoolBuilder {
    /// Create a new pool builder.
    pub fn new(settings: RedisSettings) -> Self {
        Self { settings }
    }

    /// Build the pool and verify one connection can be borrowed.
    pub async fn build(self) -> Result<RedisPool> {
        if self.settings.active == 0 {
            return Err(RedisError::Pool(
                "active capacity must be at least 1".to_string(),
            ));
        }

        let manager = SessionConnectionManager::new(self.settings.clone())?;
        let (dial_failures, _) = broadcast::channel(16);

        let inner = Pool::builder()
            .max_size(self.settings.active)
            .min_idle(None)
            .idle_timeout(self.settings.idle_timeout())
            .connection_timeout(CHECKOUT_TIMEOUT)
            .test_on_check_out(true)
            .retry_connection(false)
            .error_sink(Box::new(DialErrorSink {
                tx: dial_failures.clone(),
            }))
            .build_unchecked(manager);

        let pool = RedisPool {
            inner,
            max_idle: self.settings.idle,
            dial_failures,
        };

        // Borrow and return in a scope so the check does not hold a slot
        {
            let _conn = pool.get().await?;
        }

        info!(
            server = %self.settings.server,
            active = self.settings.active,
            idle = self.settings.idle,
            "Redis session pool created"
        );

        Ok(pool)
    }
}
