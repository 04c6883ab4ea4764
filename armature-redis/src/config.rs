//! Redis session pool settings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::duration::parse_duration;
use crate::{RedisError, Result};

/// Default server address.
pub const DEFAULT_SERVER: &str = "127.0.0.1:6379";

/// Default maximum number of idle pooled connections.
pub const DEFAULT_IDLE: u32 = 30;

/// Default maximum number of active pooled connections.
pub const DEFAULT_ACTIVE: u32 = 100;

/// Default eviction timeout for idle pooled connections.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(240);

/// Setting keys recognized by [`RedisSettings::from_setting`].
pub const SETTING_KEYS: [&str; 6] = ["server", "password", "database", "idle", "active", "timeout"];

/// Resolved settings for a session connection pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    /// Server address (`host:port`).
    pub server: String,
    /// `AUTH` password. Empty means no authentication.
    pub password: String,
    /// `SELECT` target. Empty means the server's default database.
    pub database: String,
    /// Maximum idle connections kept by the pool.
    pub idle: u32,
    /// Maximum connections open at once.
    pub active: u32,
    /// Idle connections older than this are evicted. Zero disables eviction.
    #[serde(with = "crate::duration::serde_secs")]
    pub timeout: Duration,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            password: String::new(),
            database: String::new(),
            idle: DEFAULT_IDLE,
            active: DEFAULT_ACTIVE,
            timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl RedisSettings {
    /// Create a builder.
    pub fn builder() -> RedisSettingsBuilder {
        RedisSettingsBuilder::new()
    }

    /// Resolve settings from an open-ended settings map.
    ///
    /// Each recognized key is applied independently on top of the defaults:
    ///
    /// | key        | accepted values                                       |
    /// |------------|-------------------------------------------------------|
    /// | `server`   | string                                                |
    /// | `password` | string                                                |
    /// | `database` | string or non-negative integer                        |
    /// | `idle`     | non-negative integer                                  |
    /// | `active`   | non-negative integer                                  |
    /// | `timeout`  | integer seconds, or a duration string (`"4m"`, `"240"`) |
    ///
    /// Empty strings, zero capacities, a zero integer timeout and `null`
    /// keep the default. Unknown keys are ignored. Every recognized key with a
    /// value of the wrong type is collected into
    /// [`RedisError::InvalidSettings`].
    ///
    /// # Examples
    ///
    /// ```
    /// use armature_redis::RedisSettings;
    /// use serde_json::json;
    /// use std::time::Duration;
    ///
    /// let setting = json!({ "server": "10.0.0.5:6380", "timeout": "1m" });
    /// let settings = RedisSettings::from_setting(setting.as_object().unwrap()).unwrap();
    ///
    /// assert_eq!(settings.server, "10.0.0.5:6380");
    /// assert_eq!(settings.timeout, Duration::from_secs(60));
    /// assert_eq!(settings.active, 100);
    /// ```
    pub fn from_setting(setting: &Map<String, Value>) -> Result<Self> {
        let mut settings = Self::default();
        let mut invalid = Vec::new();

        for key in SETTING_KEYS {
            match setting.get(key) {
                None | Some(Value::Null) => {}
                Some(value) => {
                    if !settings.apply(key, value) {
                        invalid.push(key.to_string());
                    }
                }
            }
        }

        if invalid.is_empty() {
            Ok(settings)
        } else {
            Err(RedisError::InvalidSettings { keys: invalid })
        }
    }

    /// Apply one recognized key. Returns `false` when the value is malformed.
    fn apply(&mut self, key: &str, value: &Value) -> bool {
        match key {
            "server" => apply_string(&mut self.server, value),
            "password" => apply_string(&mut self.password, value),
            "database" => match value {
                Value::String(db) => {
                    self.database = db.clone();
                    true
                }
                Value::Number(n) => match n.as_u64() {
                    Some(db) => {
                        self.database = db.to_string();
                        true
                    }
                    None => false,
                },
                _ => false,
            },
            "idle" => apply_capacity(&mut self.idle, value),
            "active" => apply_capacity(&mut self.active, value),
            "timeout" => match value {
                Value::Number(n) => match n.as_u64() {
                    Some(0) => true,
                    Some(secs) => {
                        self.timeout = Duration::from_secs(secs);
                        true
                    }
                    None => false,
                },
                Value::String(text) if text.is_empty() => true,
                Value::String(text) => match parse_duration(text) {
                    Ok(timeout) => {
                        self.timeout = timeout;
                        true
                    }
                    Err(_) => false,
                },
                _ => false,
            },
            _ => true,
        }
    }

    /// URL handed to the Redis client. Credentials and database are applied
    /// with explicit `AUTH`/`SELECT` after dialing.
    pub fn connection_url(&self) -> String {
        format!("redis://{}/", self.server)
    }

    /// Idle eviction timeout for the pool, `None` when disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }
}

fn apply_string(target: &mut String, value: &Value) -> bool {
    match value.as_str() {
        Some(s) => {
            if !s.is_empty() {
                *target = s.to_string();
            }
            true
        }
        None => false,
    }
}

fn apply_capacity(target: &mut u32, value: &Value) -> bool {
    match value.as_u64().map(u32::try_from) {
        Some(Ok(0)) => true,
        Some(Ok(n)) => {
            *target = n;
            true
        }
        _ => false,
    }
}

/// Builder for [`RedisSettings`].
#[derive(Default)]
pub struct RedisSettingsBuilder {
    settings: RedisSettings,
}

impl RedisSettingsBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            settings: RedisSettings::default(),
        }
    }

    /// Set the server address.
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.settings.server = server.into();
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.settings.password = password.into();
        self
    }

    /// Set the database selector.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.settings.database = database.into();
        self
    }

    /// Set the idle capacity.
    pub fn idle(mut self, idle: u32) -> Self {
        self.settings.idle = idle;
        self
    }

    /// Set the active capacity.
    pub fn active(mut self, active: u32) -> Self {
        self.settings.active = active;
        self
    }

    /// Set the idle eviction timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Build the settings.
    pub fn build(self) -> RedisSettings {
        self.settings
    }
}
