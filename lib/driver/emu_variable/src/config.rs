//! Sizing of the variable store.

use core::{error, fmt};

use crate::{entry::HEADER_SIZE, image::STORE_HEADER_SIZE};

/// Sizing of a [`VariableStore`][s].
///
/// [s]: crate::VariableStore
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct VariableStoreConfig {
    /// Largest encoded size of an ordinary variable.
    pub max_variable_size: usize,
    /// Largest encoded size of a hardware error record.
    pub max_hardware_error_variable_size: usize,
    /// Size of the non-volatile store, including its header.
    pub non_volatile_store_size: usize,
    /// Size of the volatile store, including its header.
    pub volatile_store_size: usize,
    /// Part of the non-volatile store reserved for hardware error records.
    pub hardware_error_storage_size: usize,
}

impl VariableStoreConfig {
    /// Checks that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for size in [self.non_volatile_store_size, self.volatile_store_size] {
            if size < STORE_HEADER_SIZE {
                return Err(ConfigError::StoreTooSmall(size));
            }
            if u32::try_from(size).is_err() {
                return Err(ConfigError::StoreTooLarge(size));
            }
        }

        if self.hardware_error_storage_size > self.non_volatile_store_size - STORE_HEADER_SIZE {
            return Err(ConfigError::HardwareErrorQuotaTooLarge(
                self.hardware_error_storage_size,
            ));
        }

        for size in [
            self.max_variable_size,
            self.max_hardware_error_variable_size,
        ] {
            if size < HEADER_SIZE {
                return Err(ConfigError::MaximumTooSmall(size));
            }
        }

        Ok(())
    }

    /// Returns the space available to ordinary non-volatile variables.
    pub const fn common_storage_size(&self) -> usize {
        self.non_volatile_store_size - STORE_HEADER_SIZE - self.hardware_error_storage_size
    }

    /// Returns the space available to volatile variables.
    pub const fn volatile_storage_size(&self) -> usize {
        self.volatile_store_size - STORE_HEADER_SIZE
    }
}

impl Default for VariableStoreConfig {
    fn default() -> Self {
        Self {
            max_variable_size: 0x400,
            max_hardware_error_variable_size: 0x8000,
            non_volatile_store_size: 0x10000,
            volatile_store_size: 0x10000,
            hardware_error_storage_size: 0x1000,
        }
    }
}

/// Various errors that can occur while validating a [`VariableStoreConfig`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ConfigError {
    /// A store cannot hold its own header.
    StoreTooSmall(usize),
    /// A store is too large for the size field of its header.
    StoreTooLarge(usize),
    /// The hardware error quota does not fit in the non-volatile store.
    HardwareErrorQuotaTooLarge(usize),
    /// A maximum variable size cannot hold a variable header.
    MaximumTooSmall(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreTooSmall(size) => write!(f, "store of {size} bytes cannot hold its header"),
            Self::StoreTooLarge(size) => write!(f, "store of {size} bytes is too large"),
            Self::HardwareErrorQuotaTooLarge(size) => write!(
                f,
                "hardware error quota of {size} bytes exceeds the non-volatile store"
            ),
            Self::MaximumTooSmall(size) => {
                write!(f, "maximum variable size {size} cannot hold a variable header")
            }
        }
    }
}

impl error::Error for ConfigError {}

#[cfg(test)]
mod test {
    use super::{ConfigError, VariableStoreConfig};

    #[test]
    fn default_is_valid() {
        let config = VariableStoreConfig::default();

        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.common_storage_size(), 0x10000 - 28 - 0x1000);
        assert_eq!(config.volatile_storage_size(), 0x10000 - 28);
    }

    #[test]
    fn inconsistencies_are_rejected() {
        let config = VariableStoreConfig {
            volatile_store_size: 16,
            ..VariableStoreConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::StoreTooSmall(16)));

        let config = VariableStoreConfig {
            non_volatile_store_size: 0x1000,
            ..VariableStoreConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::HardwareErrorQuotaTooLarge(0x1000))
        );

        let config = VariableStoreConfig {
            max_variable_size: 31,
            ..VariableStoreConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MaximumTooSmall(31)));
    }
}
