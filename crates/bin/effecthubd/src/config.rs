//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `effecthub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use effecthub_adapter_simulated::{SimulatedDevice, demo_devices};
use effecthub_app::directory::DEFAULT_EVENT_CAPACITY;
use effecthub_domain::translation::TranslationTable;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device directory settings.
    pub directory: DirectoryConfig,
    /// Timeline scheduler settings.
    pub scheduler: SchedulerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Symbol table applied to effect parameters.
    pub translation: TranslationTable,
    /// Simulated devices.
    pub simulated: SimulatedConfig,
    /// Timeline to play at startup.
    pub playback: PlaybackConfig,
}

/// Device directory configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Start with protocol isolation enabled.
    pub isolation: bool,
    /// Capacity of the directory event channel.
    pub event_capacity: usize,
}

/// Timeline scheduler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Tick granularity in milliseconds.
    pub tick_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Simulated driver configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    /// Register simulated devices at startup.
    pub enabled: bool,
    /// Devices to simulate; the demo rig when empty.
    pub devices: Vec<SimulatedDevice>,
}

/// Startup playback configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Path to a JSON array of timeline entries.
    pub timeline: Option<String>,
    /// Protocol the timeline dispatches on behalf of.
    pub protocol: Option<String>,
}

impl Config {
    /// Load configuration from `effecthub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("effecthub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("EFFECTHUB_ISOLATION")
            && let Ok(isolation) = val.parse()
        {
            self.directory.isolation = isolation;
        }
        if let Some(val) = var("EFFECTHUB_TICK_MS")
            && let Ok(tick_ms) = val.parse()
        {
            self.scheduler.tick_ms = tick_ms;
        }
        if let Some(val) = var("EFFECTHUB_TIMELINE") {
            self.playback.timeline = Some(val);
        }
        if let Some(val) = var("EFFECTHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_ms == 0 {
            return Err(ConfigError::Validation(
                "scheduler tick_ms must be non-zero".to_string(),
            ));
        }
        if self.directory.event_capacity == 0 {
            return Err(ConfigError::Validation(
                "directory event_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Scheduler tick as a [`Duration`].
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.scheduler.tick_ms)
    }

    /// Devices to register with the simulated driver.
    #[must_use]
    pub fn simulated_devices(&self) -> Vec<SimulatedDevice> {
        if !self.simulated.enabled {
            Vec::new()
        } else if self.simulated.devices.is_empty() {
            demo_devices()
        } else {
            self.simulated.devices.clone()
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            isolation: false,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick_ms: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "effecthubd=info,effecthub=info".to_string(),
        }
    }
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            devices: Vec::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use effecthub_domain::effect::Location;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert!(!config.directory.isolation);
        assert_eq!(config.directory.event_capacity, 256);
        assert_eq!(config.tick(), Duration::from_millis(10));
        assert!(config.simulated.enabled);
        assert!(config.playback.timeline.is_none());
        assert_eq!(config.translation, TranslationTable::default());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.scheduler.tick_ms, 10);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = r##"
            [directory]
            isolation = true
            event_capacity = 64

            [scheduler]
            tick_ms = 5

            [logging]
            filter = 'debug'

            [translation]
            intensity_max = 255
            [translation.symbols]
            high = 200
            [translation.keys.color]
            red = "#ff0000"

            [[simulated.devices]]
            id = "fan-1"
            name = "Desk fan"
            device_type = "wind"
            capabilities = ["wind"]
            protocol = "mqtt"
            location = "left"
            isolated = true

            [playback]
            timeline = "show.json"
            protocol = "mqtt"
        "##;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.directory.isolation);
        assert_eq!(config.directory.event_capacity, 64);
        assert_eq!(config.scheduler.tick_ms, 5);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.translation.intensity_max, Some(255));
        assert_eq!(config.translation.symbols["high"], serde_json::json!(200));
        assert_eq!(
            config.translation.keys["color"]["red"],
            serde_json::json!("#ff0000")
        );
        let devices = config.simulated_devices();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].location, Location::Left);
        assert!(devices[0].isolated);
        assert_eq!(config.playback.timeline.as_deref(), Some("show.json"));
        assert_eq!(config.playback.protocol.as_deref(), Some("mqtt"));
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.scheduler.tick_ms, 10);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("EFFECTHUB_ISOLATION", "true"),
            ("EFFECTHUB_TICK_MS", "25"),
            ("EFFECTHUB_TIMELINE", "/tmp/show.json"),
            ("EFFECTHUB_LOG", "trace"),
        ]));
        assert!(config.directory.isolation);
        assert_eq!(config.scheduler.tick_ms, 25);
        assert_eq!(config.playback.timeline.as_deref(), Some("/tmp/show.json"));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_prefer_rust_log_over_effecthub_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("EFFECTHUB_LOG", "trace"), ("RUST_LOG", "warn")]));
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn should_ignore_unparsable_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("EFFECTHUB_ISOLATION", "maybe"),
            ("EFFECTHUB_TICK_MS", "fast"),
        ]));
        assert!(!config.directory.isolation);
        assert_eq!(config.scheduler.tick_ms, 10);
    }

    #[test]
    fn should_reject_zero_tick() {
        let mut config = Config::default();
        config.scheduler.tick_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_zero_event_capacity() {
        let mut config = Config::default();
        config.directory.event_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_use_demo_rig_when_no_devices_configured() {
        let config = Config::default();
        assert_eq!(config.simulated_devices().len(), demo_devices().len());
    }

    #[test]
    fn should_register_nothing_when_simulation_disabled() {
        let config: Config = toml::from_str("[simulated]\nenabled = false").unwrap();
        assert!(config.simulated_devices().is_empty());
    }
}
