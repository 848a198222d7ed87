//! Configuration for the booking core.
//!
//! Supports a YAML file and environment variable overrides.

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use super::store::Store;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub booking: BookingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory of the sled database.
    pub path: String,
    /// Discard the database when the process exits.
    pub temporary: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./data/bookings.db".to_string(),
            temporary: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Leading segment of generated booking codes.
    pub code_type: String,
    /// How many codes to draw before giving up on a collision streak.
    pub code_attempts: u32,
    /// Reject bookings that list no occupants.
    pub require_members: bool,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            code_type: "K".to_string(),
            code_attempts: 5,
            require_members: false,
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("ROOM_BOOKING_CONFIG")
            .unwrap_or_else(|_| "room-booking.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("ROOM_BOOKING_STORAGE_PATH") {
            self.storage.path = path;
        }

        if let Ok(code_type) = std::env::var("ROOM_BOOKING_CODE_TYPE") {
            self.booking.code_type = code_type;
        }

        if let Ok(attempts) = std::env::var("ROOM_BOOKING_CODE_ATTEMPTS") {
            if let Ok(n) = attempts.parse() {
                self.booking.code_attempts = n;
            }
        }
    }

    /// Open the sled database described by `storage`.
    pub fn open_db(&self) -> Result<Arc<sled::Db>, ConfigError> {
        // a temporary database gets its own scratch path from sled
        let db = if self.storage.temporary {
            sled::Config::new().temporary(true)
        } else {
            sled::Config::new().path(&self.storage.path)
        };
        let db = db
            .open()
            .map_err(|e| ConfigError::Storage(self.storage.path.clone(), e.to_string()))?;

        Ok(Arc::new(db))
    }

    pub fn open_store(&self, db: Arc<sled::Db>) -> Result<Arc<Store>, ConfigError> {
        Store::new(db)
            .map(Arc::new)
            .map_err(|e| ConfigError::Storage(self.storage.path.clone(), e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to open storage at '{0}': {1}")]
    Storage(String, String),
}
