//! Driver configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! cmd = "rtl_433 -M utc -F json"
//! path = "/opt/rtl/bin"
//! log_unknown_sensors = true
//!
//! [sensor_map]
//! outTemp = "temperature.*.AcuriteTowerPacket"
//!
//! [deltas]
//! rain = "rain_total"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::deltas::Deltas;
use crate::pipeline::PipelineBuilder;
use crate::sensormap::SensorMap;

/// Default rtl_433 command line
pub const DEFAULT_CMD: &str = "rtl_433 -M utc -F json";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Driver configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Command which runs rtl_433
    pub cmd: String,

    /// Directory to prepend to `PATH`
    pub path: Option<PathBuf>,

    /// `LD_LIBRARY_PATH` for the rtl_433 process
    pub ld_library_path: Option<PathBuf>,

    /// Log blocks which no decoder recognizes
    pub log_unknown_sensors: bool,

    /// Log decoded records which match no sensor map target
    pub log_unmapped_sensors: bool,

    /// Output fields and the fingerprints which fill them
    pub sensor_map: SensorMap,

    /// Delta fields and the counters they derive from
    pub deltas: Deltas,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cmd: DEFAULT_CMD.to_owned(),
            path: None,
            ld_library_path: None,
            log_unknown_sensors: false,
            log_unmapped_sensors: false,
            sensor_map: SensorMap::new(),
            deltas: Deltas::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check structure
    ///
    /// Sensor map patterns are never rejected. Patterns which
    /// cannot match anything simply don't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cmd.trim().is_empty() {
            return Err(ConfigError::Invalid("cmd is empty".into()));
        }

        if self.sensor_map.iter().any(|(target, _)| target.is_empty()) {
            return Err(ConfigError::Invalid(
                "sensor_map has an empty target name".into(),
            ));
        }

        for (delta, counter) in self.deltas.iter() {
            if delta.is_empty() || counter.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "deltas: empty name in \"{}\" = \"{}\"",
                    delta, counter
                )));
            }
        }

        Ok(())
    }

    /// Pipeline builder with these settings
    pub fn pipeline_builder(&self) -> PipelineBuilder {
        let mut builder = PipelineBuilder::new();
        builder
            .with_sensor_map(self.sensor_map.clone())
            .with_deltas(self.deltas.clone())
            .with_log_unknown(self.log_unknown_sensors)
            .with_log_unmapped(self.log_unmapped_sensors);
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").expect("empty config");
        assert_eq!(config.cmd, DEFAULT_CMD);
        assert!(config.sensor_map.is_empty());
        assert_eq!(config.deltas, Deltas::default());
        assert!(!config.log_unknown_sensors);
    }

    #[test]
    fn test_full() {
        let config = Config::from_toml_str(
            r#"
            cmd = "rtl_433 -M utc -F json -R 40"
            path = "/opt/rtl/bin"
            ld_library_path = "/opt/rtl/lib"
            log_unknown_sensors = true
            log_unmapped_sensors = true

            [sensor_map]
            outTemp = "temperature.*.AcuriteTowerPacket"
            rain_total = "rain_total.*.*"

            [deltas]
            rain = "rain_total"
            "#,
        )
        .expect("config");

        assert_eq!(config.cmd, "rtl_433 -M utc -F json -R 40");
        assert_eq!(config.path, Some(PathBuf::from("/opt/rtl/bin")));
        assert_eq!(config.ld_library_path, Some(PathBuf::from("/opt/rtl/lib")));
        assert!(config.log_unmapped_sensors);
        assert_eq!(config.sensor_map.len(), 2);
        assert_eq!(
            config.deltas.iter().collect::<Vec<_>>(),
            vec![("rain", "rain_total")]
        );
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            Config::from_toml_str("cmd = \"\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[sensor_map]\n\"\" = \"temperature.*.*\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[deltas]\nrain = \"\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("cmd = 12"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            Config::from_file("/nonexistent/rtlnorm.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_malformed_pattern_accepted() {
        let config =
            Config::from_toml_str("[sensor_map]\nbad = \"temperature.[z-a].X\"").expect("config");
        assert_eq!(config.sensor_map.len(), 1);
    }
}
