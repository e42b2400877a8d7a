//! Configuration persistence
//!
//! Loads and saves [`NodeConfig`] in `/config`. Falls back to defaults when
//! nothing is stored.

use phonebox_hal::{FileStore, StorageError, StoragePath};

use super::types::NodeConfig;

/// Maximum serialized config size
const MAX_CONFIG_SIZE: usize = 128;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Storage operation failed
    Storage(StorageError),
    /// Serialization failed
    Encode,
    /// Deserialization failed
    Decode,
    /// Stored settings failed validation
    Invalid,
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        ConfigError::Storage(e)
    }
}

impl NodeConfig {
    /// Load configuration from `/config`
    ///
    /// Returns the defaults if no configuration is stored.
    pub fn load<S: FileStore>(store: &mut S) -> Result<Self, ConfigError> {
        if !store.exists(StoragePath::Config) {
            debug!("No stored config, using defaults");
            return Ok(Self::default());
        }

        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = store.read_file(StoragePath::Config, &mut buffer)?;
        debug!("Read {} bytes of config", len);

        let config: NodeConfig =
            postcard::from_bytes(&buffer[..len]).map_err(|_| ConfigError::Decode)?;
        if !config.validate() {
            return Err(ConfigError::Invalid);
        }
        Ok(config)
    }

    /// Load configuration, using defaults on any failure
    pub fn load_or_default<S: FileStore>(store: &mut S) -> Self {
        match Self::load(store) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config: {:?}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to `/config`
    pub fn save<S: FileStore>(&self, store: &mut S) -> Result<(), ConfigError> {
        if !self.validate() {
            return Err(ConfigError::Invalid);
        }

        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let bytes = postcard::to_slice(self, &mut buffer).map_err(|_| ConfigError::Encode)?;
        store.write_file(StoragePath::Config, bytes)?;

        info!("Saved config ({} bytes)", bytes.len());
        Ok(())
    }
}
