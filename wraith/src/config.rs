//! Session configuration. Everything here has a sensible default, so an empty TOML document (or
//! `Config::default()`) describes a stock machine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The byte returned when reading the unusable region at FEA0-FEFF.
    pub unusable_fill: u8,
    /// Whether or not bytes shifted out over the serial port are recorded.
    pub capture_serial: bool,
    /// The most serial bytes that will be recorded. Anything sent after this is dropped.
    pub serial_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unusable_fill: 0xFF,
            capture_serial: true,
            serial_limit: 64 * 1024,
        }
    }
}

impl Config {
    pub fn from_toml_str(data: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(data)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn partial_config() {
        let config = Config::from_toml_str("unusable_fill = 0\ncapture_serial = false").unwrap();
        assert_eq!(config.unusable_fill, 0);
        assert!(!config.capture_serial);
        assert_eq!(config.serial_limit, Config::default().serial_limit);
    }

    #[test]
    fn bad_config() {
        assert!(Config::from_toml_str("unusable_fill = \"nope\"").is_err());
    }
}
