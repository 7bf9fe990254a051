//! Device configuration types

use wirelink_hal::{BusPins, I2cConfig};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Read timeout applied per segment unless configured otherwise
pub const DEFAULT_TIMEOUT_MS: u32 = 100;

/// Highest valid 7-bit bus address
pub const MAX_ADDRESS: u8 = 0x7F;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Address does not fit in 7 bits
    InvalidAddress,
    /// Read timeout of zero would fail every read
    ZeroTimeout,
    /// Clock frequency of zero
    InvalidFrequency,
}

/// Configuration for one device on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceConfig {
    /// 7-bit bus address
    pub address: u8,
    /// Pin routing, for buses that support it
    pub pins: Option<BusPins>,
    /// Per-segment read timeout applied at initialization
    pub timeout_ms: u32,
    /// Bus speed to request after initialization
    pub i2c: Option<I2cConfig>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: 0,
            pins: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            i2c: None,
        }
    }
}

impl DeviceConfig {
    /// Create a config for the given address with default settings
    pub const fn new(address: u8) -> Self {
        Self {
            address,
            pins: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            i2c: None,
        }
    }

    /// Route the bus to specific pins
    pub const fn with_pins(mut self, pins: BusPins) -> Self {
        self.pins = Some(pins);
        self
    }

    /// Override the default read timeout
    pub const fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Request a bus speed, e.g. [`I2cConfig::FAST`]
    pub const fn with_i2c(mut self, i2c: I2cConfig) -> Self {
        self.i2c = Some(i2c);
        self
    }

    /// Check the configuration for values the bus cannot use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address > MAX_ADDRESS {
            return Err(ConfigError::InvalidAddress);
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if matches!(self.i2c, Some(I2cConfig { frequency: 0 })) {
            return Err(ConfigError::InvalidFrequency);
        }
        Ok(())
    }
}
