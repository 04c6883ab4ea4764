// Armature Sessions - server-side session storage for Armature applications
//
// This library wires the session driver registry to its built-in backends.
// Applications call `session_drivers()` once at startup and resolve a driver
// by the name found in their session configuration.

// Re-export the session driver contract
pub use armature_session::*;

// Re-export the pooling layer
pub use armature_redis;

/// Build a registry holding every built-in session driver.
///
/// ```
/// let drivers = armature::session_drivers();
/// assert!(drivers.contains("redis"));
/// ```
pub fn session_drivers() -> DriverRegistry {
    let registry = DriverRegistry::new();
    register_drivers(&registry);
    registry
}

// Prelude for common imports
pub mod prelude {
    pub use crate::session_drivers;
    pub use armature_redis::{RedisSettings, parse_duration};
    pub use armature_session::prelude::*;
}
