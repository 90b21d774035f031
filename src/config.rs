use core::time::Duration;

use crate::{
    command::{DEFAULT_ADDRESS, EXECUTION_TIME_MS},
    error::ConfigurationError,
    types::FieldSet,
};

/// Driver configuration: where the sensor lives and how often it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// 7-bit I2C address.
    pub address: u8,
    /// Time between two polls.
    pub update_interval: Duration,
    /// Wait between writing the command and reading the response.
    pub command_delay: Duration,
    /// Output bindings the host expects, by binding name. When set, the
    /// driver refuses a slot table that binds a different set.
    pub fields: Option<FieldSet>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            update_interval: Duration::from_secs(60),
            command_delay: Duration::from_millis(EXECUTION_TIME_MS as u64),
            fields: None,
        }
    }
}

impl Config {
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_command_delay(mut self, delay: Duration) -> Self {
        self.command_delay = delay;
        self
    }

    pub fn with_fields(mut self, fields: FieldSet) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Command delay in whole milliseconds, saturating.
    pub fn command_delay_ms(&self) -> u32 {
        u32::try_from(self.command_delay.as_millis()).unwrap_or(u32::MAX)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.address > 0x7F {
            return Err(ConfigurationError::InvalidAddress(self.address));
        }
        if self.update_interval.is_zero() {
            return Err(ConfigurationError::ZeroUpdateInterval);
        }
        Ok(())
    }
}
