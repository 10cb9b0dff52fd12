// Per-sensor poll/report scheduling against a monotonic millisecond clock
//
// Each sensor keeps two independent phases. When a phase is due the action
// runs once and the phase advances by whole intervals, so timing error never
// accumulates. A late tick runs each action at most once and intervals missed
// during a stall are skipped, not replayed.

use tracing::{debug, info, warn};

use super::{MeasurementSource, Sensor, SensorSettings};
use crate::config::SensorConfig;
use crate::transport::Transport;

/// What a single tick did, summed over all sensors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub polled: usize,
    pub failed: usize,
    pub reported: usize,
    pub write_failed: usize,
}

/// New phase start after `now_ms`, keeping the phase aligned to `interval`
fn advance(last_ms: u64, now_ms: u64, interval_ms: u64) -> u64 {
    let interval_ms = interval_ms.max(1);
    let elapsed = now_ms.saturating_sub(last_ms);
    last_ms + interval_ms * (elapsed / interval_ms).max(1)
}

/// Fixed registry of sensors plus the shared telemetry format buffer
pub struct Scheduler {
    sensors: Vec<Sensor>,
    format_buf: String,
}

impl Scheduler {
    pub fn new(sensors: Vec<Sensor>) -> Self {
        Self {
            sensors,
            format_buf: String::with_capacity(128),
        }
    }

    /// Build the registry from config, asking `source_for` for each
    /// sensor's measurement source
    pub fn from_config<F>(configs: &[SensorConfig], now_ms: u64, mut source_for: F) -> Self
    where
        F: FnMut(&SensorConfig) -> Box<dyn MeasurementSource>,
    {
        let sensors = configs
            .iter()
            .map(|c| {
                let settings = SensorSettings::new(c.poll_interval_ms, c.message_interval_ms);
                let mut sensor = Sensor::new(&c.name, c.kind, settings, source_for(c), now_ms);
                sensor.set_enabled(c.enabled, now_ms);
                info!(
                    "Registered sensor {} ({:?}): poll {}ms, report {}ms{}",
                    c.name,
                    c.kind,
                    c.poll_interval_ms,
                    c.message_interval_ms,
                    if c.enabled { "" } else { ", disabled" }
                );
                sensor
            })
            .collect();

        Self::new(sensors)
    }

    /// Advance every enabled sensor to `now_ms`
    ///
    /// Poll failures and failed telemetry writes are counted and logged,
    /// never returned. The report phase advances either way.
    pub fn tick(&mut self, now_ms: u64, out: &mut dyn Transport) -> TickStats {
        let mut stats = TickStats::default();

        for sensor in self.sensors.iter_mut().filter(|s| s.enabled) {
            let settings = sensor.settings;

            if now_ms.saturating_sub(sensor.last_poll_ms) >= settings.poll_interval_ms {
                stats.polled += 1;
                if sensor.poll().is_err() {
                    stats.failed += 1;
                }
                sensor.last_poll_ms =
                    advance(sensor.last_poll_ms, now_ms, settings.poll_interval_ms);
            }

            if now_ms.saturating_sub(sensor.last_message_ms) >= settings.message_interval_ms {
                // Formatting and write finish before the buffer is lent out again
                match sensor.report(&mut self.format_buf, out) {
                    Ok(()) => stats.reported += 1,
                    Err(e) => {
                        warn!("Telemetry write for {} failed: {}", sensor.name, e);
                        stats.write_failed += 1;
                    }
                }
                sensor.last_message_ms =
                    advance(sensor.last_message_ms, now_ms, settings.message_interval_ms);
            }
        }

        if stats != TickStats::default() {
            debug!(
                "Tick at {}ms: polled {}, failed {}, reported {}, write failed {}",
                now_ms, stats.polled, stats.failed, stats.reported, stats.write_failed
            );
        }

        stats
    }

    /// Enable or disable a sensor by name. Returns false if no such sensor.
    pub fn set_enabled(&mut self, name: &str, enabled: bool, now_ms: u64) -> bool {
        match self.sensors.iter_mut().find(|s| s.name == name) {
            Some(sensor) => {
                info!(
                    "Sensor {} {}",
                    name,
                    if enabled { "enabled" } else { "disabled" }
                );
                sensor.set_enabled(enabled, now_ms);
                true
            }
            None => false,
        }
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn get(&self, name: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}
