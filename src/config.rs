// Loop rate, protocol limits, serial defaults and the sensor registry layout
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::sensors::SensorKind;

// Main loop frequency
pub const LOOP_HZ: u64 = 100;

// Command link watchdog: stop motion when no line arrives for this long
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_millis(2000);

// Longest command line accepted, excluding the terminator
pub const LINE_CAPACITY: usize = 255;

// Byte that ends a command or telemetry line
pub const LINE_TERMINATOR: u8 = b'\n';

// Most inbound bytes handled per loop iteration
pub const RX_BUDGET: usize = 1024;

// Serial link to the base station
pub const SERIAL_PORT: &str = "/dev/ttyACM0";
pub const SERIAL_BAUD: u32 = 115_200;

// Sensor cadence when the config file does not say otherwise
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_MESSAGE_INTERVAL_MS: u64 = 5000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Runtime configuration, loadable from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoverConfig {
    pub serial: SerialConfig,
    pub loop_hz: u64,
    pub watchdog_timeout_ms: u64,
    pub sensors: Vec<SensorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Command link (and telemetry, unless `telemetry_port` is set)
    pub port: String,
    pub baud_rate: u32,
    /// Optional second port dedicated to telemetry
    pub telemetry_port: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub name: String,
    pub kind: SensorKind,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_message_interval")]
    pub message_interval_ms: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_message_interval() -> u64 {
    DEFAULT_MESSAGE_INTERVAL_MS
}

fn default_enabled() -> bool {
    true
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: SERIAL_PORT.to_string(),
            baud_rate: SERIAL_BAUD,
            telemetry_port: None,
        }
    }
}

impl SensorConfig {
    pub fn new(name: &str, kind: SensorKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            message_interval_ms: DEFAULT_MESSAGE_INTERVAL_MS,
            enabled: true,
        }
    }
}

impl Default for RoverConfig {
    /// The rover's stock sensor set
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            loop_hz: LOOP_HZ,
            watchdog_timeout_ms: WATCHDOG_TIMEOUT.as_millis() as u64,
            sensors: vec![
                SensorConfig::new("env", SensorKind::Bme280),
                SensorConfig::new("imu", SensorKind::Bno055),
                SensorConfig::new("power", SensorKind::Ina260),
            ],
        }
    }
}

impl RoverConfig {
    /// Load and validate a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: RoverConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the scheduler and loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loop_hz == 0 {
            return Err(ConfigError::Invalid("loop_hz must be non-zero".into()));
        }
        for sensor in &self.sensors {
            if sensor.name.is_empty() || sensor.name.contains(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!(
                    "sensor name {:?} must be a single non-empty word",
                    sensor.name
                )));
            }
            if sensor.poll_interval_ms == 0 || sensor.message_interval_ms == 0 {
                return Err(ConfigError::Invalid(format!(
                    "sensor {} intervals must be non-zero",
                    sensor.name
                )));
            }
            if self.sensors.iter().filter(|s| s.name == sensor.name).count() > 1 {
                return Err(ConfigError::Invalid(format!(
                    "duplicate sensor name {}",
                    sensor.name
                )));
            }
        }
        Ok(())
    }

    pub fn loop_period(&self) -> Duration {
        Duration::from_millis((1000 / self.loop_hz).max(1))
    }
}
