//! Session configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Default session expiry.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(3600);

fn default_expiry() -> Duration {
    DEFAULT_EXPIRY
}

/// Configuration handed to a session driver at connect time.
///
/// `setting` is an open-ended map interpreted by the driver; the Redis
/// driver reads `server`, `password`, `database`, `idle`, `active` and
/// `timeout` from it.
///
/// # Examples
///
/// ```
/// use armature_session::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::default()
///     .with_expiry(Duration::from_secs(1800))
///     .with_setting("server", "10.0.0.5:6379")
///     .with_setting("idle", 10);
///
/// assert_eq!(config.setting["idle"], 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Expiry applied by writes that do not specify one.
    #[serde(
        default = "default_expiry",
        with = "armature_redis::duration::serde_secs"
    )]
    pub expiry: Duration,
    /// Driver-specific settings.
    #[serde(default)]
    pub setting: Map<String, Value>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiry: DEFAULT_EXPIRY,
            setting: Map::new(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration with the given default expiry.
    pub fn new(expiry: Duration) -> Self {
        Self {
            expiry,
            ..Default::default()
        }
    }

    /// Set the default expiry.
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Set one driver setting.
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.setting.insert(key.into(), value.into());
        self
    }
}
