//! Session storage drivers for Armature framework.
//!
//! # ⚠️ Important: Stateless Architecture is Preferred
//!
//! **Armature strongly recommends stateless architecture using JWT tokens
//! instead of server-side sessions.** This module is provided for cases
//! where sessions are absolutely necessary (e.g., legacy system integration,
//! specific compliance requirements).
//!
//! # Drivers
//!
//! A [`SessionDriver`] turns a [`SessionConfig`] into a [`SessionConnect`]
//! handle. Drivers live in a [`DriverRegistry`] that the application fills
//! in at startup; [`register_drivers`] adds the built-in ones.
//!
//! | name    | driver                 |
//! |---------|------------------------|
//! | `redis` | [`RedisSessionDriver`] |
//!
//! # Examples
//!
//! ```no_run
//! use armature_session::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SessionError> {
//!     let registry = DriverRegistry::new();
//!     register_drivers(&registry);
//!
//!     let config = SessionConfig::new(Duration::from_secs(3600))
//!         .with_setting("server", "127.0.0.1:6379")
//!         .with_setting("active", 50);
//!
//!     let conn = registry.connect("redis", "default", config)?;
//!     conn.open().await?;
//!
//!     let mut value = SessionMap::new();
//!     value.insert("username".into(), "alice".into());
//!     conn.write("sess:42", &value, Duration::ZERO).await?;
//!
//!     match conn.read("sess:42").await {
//!         Ok(session) => println!("User: {:?}", session.get("username")),
//!         Err(e) if e.is_not_found() => println!("No session"),
//!         Err(e) => return Err(e),
//!     }
//!
//!     // Logout everywhere
//!     conn.clear("sess:").await?;
//!     conn.close().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod redis_session;
pub mod registry;
pub mod traits;

pub use config::{DEFAULT_EXPIRY, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use redis_session::{REDIS_DRIVER, RedisSessionConnect, RedisSessionDriver};
pub use registry::DriverRegistry;
pub use traits::{SessionConnect, SessionDriver, SessionMap};

/// Register the built-in session drivers.
pub fn register_drivers(registry: &DriverRegistry) {
    registry.register(REDIS_DRIVER, redis_session::driver());
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::SessionConfig;
    pub use crate::error::{SessionError, SessionResult};
    pub use crate::redis_session::{RedisSessionConnect, RedisSessionDriver};
    pub use crate::registry::DriverRegistry;
    pub use crate::traits::{SessionConnect, SessionDriver, SessionMap};
    pub use crate::register_drivers;
}
