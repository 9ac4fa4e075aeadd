use crate::constants::*;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session settings. Every field has a default matching the shipping
/// firmware, so a config file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Advertised name of the supply to pair with
    pub device_name: String,
    #[serde(with = "uuid_text")]
    pub service_uuid: u128,
    #[serde(with = "uuid_text")]
    pub characteristic_uuid: u128,
    /// Coalescing window for voltage/current changes
    pub throttle_ms: u64,
    /// Rescan after a discovery sub-phase stalls this long; `None` waits forever
    pub discovery_timeout_ms: Option<u64>,
    /// Force slot 0 of the display window to zero
    pub pin_window_origin: bool,
    pub max_voltage: f32,
    pub max_current_ma: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME.to_string(),
            service_uuid: SERVICE_UUID,
            characteristic_uuid: CHARACTERISTIC_UUID,
            throttle_ms: DEFAULT_THROTTLE_MS,
            discovery_timeout_ms: Some(DEFAULT_DISCOVERY_TIMEOUT_MS),
            pin_window_origin: true,
            max_voltage: DEFAULT_MAX_VOLTAGE,
            max_current_ma: DEFAULT_MAX_CURRENT_MA,
        }
    }
}

impl SessionConfig {
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn discovery_timeout(&self) -> Option<Duration> {
        self.discovery_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.trim().is_empty() {
            return Err(ConfigError::Invalid("device_name must not be empty".to_string()));
        }
        if self.throttle_ms == 0 {
            return Err(ConfigError::Invalid("throttle_ms must be at least 1".to_string()));
        }
        if self.discovery_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "discovery_timeout_ms must be positive, omit it to disable the timeout".to_string(),
            ));
        }
        if !(self.max_voltage.is_finite() && self.max_voltage > 0.0) {
            return Err(ConfigError::Invalid(format!("max_voltage {} is not positive", self.max_voltage)));
        }
        if !(self.max_current_ma.is_finite() && self.max_current_ma > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_current_ma {} is not positive",
                self.max_current_ma
            )));
        }
        Ok(())
    }
}

/// Render a 128-bit UUID in the usual 8-4-4-4-12 form.
pub fn format_uuid(uuid: u128) -> String {
    let hex = format!("{uuid:032X}");
    format!("{}-{}-{}-{}-{}", &hex[0..8], &hex[8..12], &hex[12..16], &hex[16..20], &hex[20..32])
}

/// Parse a UUID written with or without hyphens.
pub fn parse_uuid(text: &str) -> Result<u128, ConfigError> {
    let digits: String = text.chars().filter(|c| *c != '-').collect();
    if digits.len() != 32 {
        return Err(ConfigError::Invalid(format!("UUID {text:?} must have 32 hex digits")));
    }
    u128::from_str_radix(&digits, 16).map_err(|e| ConfigError::Invalid(format!("UUID {text:?}: {e}")))
}

// TOML integers are 64-bit, so UUIDs travel as strings.
mod uuid_text {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(uuid: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_uuid(*uuid))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_uuid(&text).map_err(D::Error::custom)
    }
}
