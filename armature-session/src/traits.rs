//! Session driver contract.

use crate::config::SessionConfig;
use crate::error::SessionResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// A session's attribute bag.
pub type SessionMap = HashMap<String, serde_json::Value>;

/// A session storage backend.
///
/// Drivers are stateless factories. They are registered by name in a
/// [`DriverRegistry`](crate::DriverRegistry) and asked for a connection
/// handle when the host sets up session storage.
pub trait SessionDriver: Send + Sync {
    /// Create a connection handle for `config`.
    ///
    /// This only resolves configuration; no network traffic happens until
    /// [`SessionConnect::open`] is called.
    fn connect(&self, name: &str, config: SessionConfig) -> SessionResult<Box<dyn SessionConnect>>;
}

/// A connection handle produced by a [`SessionDriver`].
///
/// Every data operation fails with
/// [`SessionError::InvalidConnection`](crate::SessionError::InvalidConnection)
/// until [`open`](Self::open) succeeds, and again after [`close`](Self::close).
///
/// # Examples
///
/// ```ignore
/// use armature_session::{SessionConnect, SessionMap};
/// use std::time::Duration;
///
/// async fn login(conn: &dyn SessionConnect, id: &str) -> SessionResult<()> {
///     let mut value = SessionMap::new();
///     value.insert("user_id".into(), 123.into());
///
///     // Zero falls back to the configured expiry
///     conn.write(id, &value, Duration::ZERO).await?;
///
///     let stored = conn.read(id).await?;
///     assert_eq!(stored, value);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SessionConnect: Send + Sync {
    /// Name the handle was created with.
    fn name(&self) -> &str;

    /// Establish the backing connection pool and verify reachability.
    async fn open(&self) -> SessionResult<()>;

    /// Release the backing connection pool. Closing an unopened handle is
    /// a no-op.
    async fn close(&self) -> SessionResult<()>;

    /// Read the session stored under `id`.
    ///
    /// Returns [`SessionError::NotFound`](crate::SessionError::NotFound)
    /// when nothing is stored, so "no session" and "empty session" differ.
    async fn read(&self, id: &str) -> SessionResult<SessionMap>;

    /// Store `value` under `id`, replacing any previous value.
    ///
    /// A zero `expiry` uses the configured default expiry. When that is
    /// zero too, the session is stored without expiry.
    async fn write(&self, id: &str, value: &SessionMap, expiry: Duration) -> SessionResult<()>;

    /// Delete the session stored under `id`. Deleting a missing session
    /// succeeds.
    async fn delete(&self, id: &str) -> SessionResult<()>;

    /// Delete every session whose id starts with `prefix`.
    ///
    /// Stops at the first failed deletion, leaving the rest in place.
    /// Returns the number of sessions deleted.
    async fn clear(&self, prefix: &str) -> SessionResult<usize>;
}
