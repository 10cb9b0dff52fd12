// Sensors: settings, runtime state and the last measurement of each one
//
// Provides:
// - The closed set of sensor kinds and their measurement layouts
// - The measurement source seam to the hardware drivers
// - The per-sensor scheduler (see `scheduler`)

pub mod scheduler;
pub mod sim;

pub use scheduler::{Scheduler, TickStats};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::telemetry;
use crate::transport::{self, Transport};

/// Sensor hardware fitted to the rover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Temperature / humidity / pressure
    Bme280,
    /// Absolute orientation IMU
    Bno055,
    /// Bus voltage and current monitor
    Ina260,
    /// Hall-effect current sensor on an ADC pin
    AnalogCurrent,
}

impl SensorKind {
    /// Snapshot held before the first successful poll
    pub fn zero_measurement(self) -> Measurement {
        match self {
            SensorKind::Bme280 => Measurement::Environment {
                temperature_c: 0.0,
                humidity_pct: 0.0,
                pressure_pa: 0.0,
            },
            SensorKind::Bno055 => Measurement::Orientation {
                roll: 0.0,
                pitch: 0.0,
                yaw: 0.0,
                accel: [0.0; 3],
                temperature_c: 0.0,
            },
            SensorKind::Ina260 => Measurement::Power {
                voltage_v: 0.0,
                current_a: 0.0,
            },
            SensorKind::AnalogCurrent => Measurement::Current { current_a: 0.0 },
        }
    }
}

/// One reading, laid out per sensor kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Environment {
        temperature_c: f32,
        humidity_pct: f32,
        pressure_pa: f32,
    },
    /// Euler angles in degrees, acceleration in m/s²
    Orientation {
        roll: f32,
        pitch: f32,
        yaw: f32,
        accel: [f32; 3],
        temperature_c: f32,
    },
    Power {
        voltage_v: f32,
        current_a: f32,
    },
    Current {
        current_a: f32,
    },
}

impl Measurement {
    /// Whether this measurement has the layout `kind` produces
    pub fn is_kind(&self, kind: SensorKind) -> bool {
        matches!(
            (self, kind),
            (Measurement::Environment { .. }, SensorKind::Bme280)
                | (Measurement::Orientation { .. }, SensorKind::Bno055)
                | (Measurement::Power { .. }, SensorKind::Ina260)
                | (Measurement::Current { .. }, SensorKind::AnalogCurrent)
        )
    }

    /// Whether every value is a finite number
    pub fn is_finite(&self) -> bool {
        match *self {
            Measurement::Environment {
                temperature_c,
                humidity_pct,
                pressure_pa,
            } => [temperature_c, humidity_pct, pressure_pa]
                .iter()
                .all(|v| v.is_finite()),
            Measurement::Orientation {
                roll,
                pitch,
                yaw,
                accel,
                temperature_c,
            } => [roll, pitch, yaw, temperature_c]
                .iter()
                .chain(accel.iter())
                .all(|v| v.is_finite()),
            Measurement::Power {
                voltage_v,
                current_a,
            } => voltage_v.is_finite() && current_a.is_finite(),
            Measurement::Current { current_a } => current_a.is_finite(),
        }
    }
}

/// Error types for sensor reads
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensorError {
    #[error("sensor not responding")]
    NotResponding,

    #[error("sensor returned invalid data: {0}")]
    InvalidData(String),

    #[error("expected a {expected:?} measurement, got {got:?}")]
    KindMismatch {
        expected: SensorKind,
        got: Measurement,
    },
}

/// Hardware read behind a sensor
///
/// Implemented by the chip drivers. A read must return promptly; a
/// missing or wedged device is reported as an error, never waited on.
pub trait MeasurementSource {
    fn read(&mut self) -> Result<Measurement, SensorError>;
}

/// Poll and report cadence of one sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSettings {
    pub poll_interval_ms: u64,
    pub message_interval_ms: u64,
}

impl SensorSettings {
    pub const fn new(poll_interval_ms: u64, message_interval_ms: u64) -> Self {
        Self {
            poll_interval_ms,
            message_interval_ms,
        }
    }
}

/// A named sensor with its own schedule and last snapshot
pub struct Sensor {
    name: String,
    kind: SensorKind,
    settings: SensorSettings,
    enabled: bool,
    last_poll_ms: u64,
    last_message_ms: u64,
    last_measurement: Measurement,
    source: Box<dyn MeasurementSource>,
    failed_polls: u64,
}

impl Sensor {
    /// Create an enabled sensor whose schedule starts at `now_ms`
    pub fn new(
        name: impl Into<String>,
        kind: SensorKind,
        settings: SensorSettings,
        source: Box<dyn MeasurementSource>,
        now_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            settings,
            enabled: true,
            last_poll_ms: now_ms,
            last_message_ms: now_ms,
            last_measurement: kind.zero_measurement(),
            source,
            failed_polls: 0,
        }
    }

    /// Take one measurement
    ///
    /// A reading of the wrong kind or with a NaN/infinite value is rejected.
    /// On failure the previous snapshot is kept.
    pub fn poll(&mut self) -> Result<(), SensorError> {
        let reading = self.source.read().and_then(|m| {
            if !m.is_kind(self.kind) {
                Err(SensorError::KindMismatch {
                    expected: self.kind,
                    got: m,
                })
            } else if !m.is_finite() {
                Err(SensorError::InvalidData(format!("non-finite value in {:?}", m)))
            } else {
                Ok(m)
            }
        });

        match reading {
            Ok(m) => {
                self.last_measurement = m;
                Ok(())
            }
            Err(e) => {
                self.failed_polls += 1;
                warn!("Sensor {} poll failed: {}", self.name, e);
                Err(e)
            }
        }
    }

    /// Emit the current snapshot as one telemetry line
    ///
    /// `buf` is scratch space for formatting; its contents are overwritten.
    pub fn report(&self, buf: &mut String, out: &mut dyn Transport) -> transport::Result<()> {
        telemetry::format_into(buf, &self.name, &self.last_measurement);
        out.write_all(buf.as_bytes())
    }

    /// Suspend or resume polling and reporting
    ///
    /// Resuming restarts both schedules at `now_ms`, so the first poll and
    /// report come one full interval later. The snapshot survives.
    pub fn set_enabled(&mut self, enabled: bool, now_ms: u64) {
        if enabled && !self.enabled {
            self.last_poll_ms = now_ms;
            self.last_message_ms = now_ms;
        }
        self.enabled = enabled;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn settings(&self) -> SensorSettings {
        self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_measurement(&self) -> &Measurement {
        &self.last_measurement
    }

    pub fn last_poll_ms(&self) -> u64 {
        self.last_poll_ms
    }

    pub fn last_message_ms(&self) -> u64 {
        self.last_message_ms
    }

    pub fn failed_polls(&self) -> u64 {
        self.failed_polls
    }
}

impl std::fmt::Debug for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sensor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("settings", &self.settings)
            .field("enabled", &self.enabled)
            .field("last_poll_ms", &self.last_poll_ms)
            .field("last_message_ms", &self.last_message_ms)
            .field("last_measurement", &self.last_measurement)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::sim::ScriptedSource;
    use super::*;
    use crate::transport::MockTransport;

    const POWER: Measurement = Measurement::Power {
        voltage_v: 12.5,
        current_a: 1.25,
    };

    #[test]
    fn test_poll_updates_snapshot() {
        let source = ScriptedSource::new(vec![Ok(POWER)]);
        let mut sensor = Sensor::new(
            "power",
            SensorKind::Ina260,
            SensorSettings::new(100, 100),
            Box::new(source),
            0,
        );
        assert_eq!(*sensor.last_measurement(), SensorKind::Ina260.zero_measurement());
        sensor.poll().unwrap();
        assert_eq!(*sensor.last_measurement(), POWER);
    }

    #[test]
    fn test_failed_poll_keeps_previous_snapshot() {
        let source = ScriptedSource::new(vec![Ok(POWER), Err(SensorError::NotResponding)]);
        let mut sensor = Sensor::new(
            "power",
            SensorKind::Ina260,
            SensorSettings::new(100, 100),
            Box::new(source),
            0,
        );
        sensor.poll().unwrap();
        assert_eq!(sensor.poll(), Err(SensorError::NotResponding));
        assert_eq!(*sensor.last_measurement(), POWER);
        assert_eq!(sensor.failed_polls(), 1);
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let source = ScriptedSource::new(vec![Ok(Measurement::Current { current_a: 3.0 })]);
        let mut sensor = Sensor::new(
            "power",
            SensorKind::Ina260,
            SensorSettings::new(100, 100),
            Box::new(source),
            0,
        );
        assert!(matches!(sensor.poll(), Err(SensorError::KindMismatch { .. })));
        assert_eq!(*sensor.last_measurement(), SensorKind::Ina260.zero_measurement());
    }

    #[test]
    fn test_non_finite_reading_rejected() {
        let nan = Measurement::Power {
            voltage_v: f32::NAN,
            current_a: 1.0,
        };
        let source = ScriptedSource::new(vec![Ok(POWER), Ok(nan)]);
        let mut sensor = Sensor::new(
            "power",
            SensorKind::Ina260,
            SensorSettings::new(100, 100),
            Box::new(source),
            0,
        );
        sensor.poll().unwrap();
        assert!(matches!(sensor.poll(), Err(SensorError::InvalidData(_))));
        assert_eq!(*sensor.last_measurement(), POWER);
        assert_eq!(sensor.failed_polls(), 1);
    }

    #[test]
    fn test_report_writes_stale_snapshot() {
        let source = ScriptedSource::new(vec![Ok(POWER)]);
        let mut sensor = Sensor::new(
            "power",
            SensorKind::Ina260,
            SensorSettings::new(100, 100),
            Box::new(source),
            0,
        );
        sensor.poll().unwrap();

        let mut out = MockTransport::new();
        let mut buf = String::new();
        sensor.report(&mut buf, &mut out).unwrap();
        sensor.report(&mut buf, &mut out).unwrap();
        assert_eq!(
            out.written_lines(),
            vec!["data power 12.50 1.25", "data power 12.50 1.25"]
        );
    }

    #[test]
    fn test_reenable_resets_schedule_keeps_snapshot() {
        let source = ScriptedSource::new(vec![Ok(POWER)]);
        let mut sensor = Sensor::new(
            "power",
            SensorKind::Ina260,
            SensorSettings::new(100, 100),
            Box::new(source),
            0,
        );
        sensor.poll().unwrap();
        sensor.set_enabled(false, 50);
        assert!(!sensor.is_enabled());
        assert_eq!(sensor.last_poll_ms(), 0);

        sensor.set_enabled(true, 700);
        assert_eq!(sensor.last_poll_ms(), 700);
        assert_eq!(sensor.last_message_ms(), 700);
        assert_eq!(*sensor.last_measurement(), POWER);

        // Already enabled: schedule untouched
        sensor.set_enabled(true, 900);
        assert_eq!(sensor.last_poll_ms(), 700);
    }

    #[test]
    fn test_kind_layouts() {
        for kind in [
            SensorKind::Bme280,
            SensorKind::Bno055,
            SensorKind::Ina260,
            SensorKind::AnalogCurrent,
        ] {
            assert!(kind.zero_measurement().is_kind(kind));
        }
        assert!(!POWER.is_kind(SensorKind::AnalogCurrent));
    }
}
