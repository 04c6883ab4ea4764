//! Session driver registry

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::traits::{SessionConnect, SessionDriver};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry mapping backend names to session drivers.
///
/// Populated explicitly by the application's composition root, see
/// [`register_drivers`](crate::register_drivers).
#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: Arc<RwLock<HashMap<String, Arc<dyn SessionDriver>>>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver, replacing any driver already under `name`
    pub fn register(&self, name: impl Into<String>, driver: impl SessionDriver + 'static) {
        self.drivers.write().insert(name.into(), Arc::new(driver));
    }

    /// Get a driver by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn SessionDriver>> {
        self.drivers.read().get(name).cloned()
    }

    /// Check whether a driver is registered
    pub fn contains(&self, name: &str) -> bool {
        self.drivers.read().contains_key(name)
    }

    /// Registered driver names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drivers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Create a connection handle using the driver registered as `driver`
    pub fn connect(
        &self,
        driver: &str,
        name: &str,
        config: SessionConfig,
    ) -> SessionResult<Box<dyn SessionConnect>> {
        let found = self
            .get(driver)
            .ok_or_else(|| SessionError::UnknownDriver(driver.to_string()))?;
        found.connect(name, config)
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.names())
            .finish()
    }
}
