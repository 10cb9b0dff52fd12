// Stand-in measurement sources
//
// `SimulatedSource` produces plausible, slowly varying readings so the
// runtime can be exercised on a bench without sensor hardware.
// `ScriptedSource` replays a fixed sequence of results.

use std::collections::VecDeque;

use super::{Measurement, MeasurementSource, SensorError, SensorKind};

/// Deterministic synthetic readings for one sensor kind
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    kind: SensorKind,
    step: u32,
}

impl SimulatedSource {
    pub fn new(kind: SensorKind) -> Self {
        Self { kind, step: 0 }
    }
}

impl MeasurementSource for SimulatedSource {
    fn read(&mut self) -> Result<Measurement, SensorError> {
        self.step = self.step.wrapping_add(1);
        let t = self.step as f32 * 0.1;

        Ok(match self.kind {
            SensorKind::Bme280 => Measurement::Environment {
                temperature_c: 21.0 + 2.0 * t.sin(),
                humidity_pct: 45.0 + 5.0 * (t * 0.5).cos(),
                pressure_pa: 101_325.0 + 150.0 * (t * 0.2).sin(),
            },
            SensorKind::Bno055 => Measurement::Orientation {
                roll: 3.0 * t.sin(),
                pitch: 2.0 * (t * 0.7).cos(),
                yaw: (self.step % 360) as f32,
                accel: [0.05 * t.sin(), 0.05 * t.cos(), 9.81],
                temperature_c: 30.0,
            },
            SensorKind::Ina260 => Measurement::Power {
                voltage_v: 12.4 - 0.001 * (self.step % 1000) as f32,
                current_a: 0.8 + 0.3 * t.sin().abs(),
            },
            SensorKind::AnalogCurrent => Measurement::Current {
                current_a: 1.5 + 0.5 * (t * 1.3).sin(),
            },
        })
    }
}

/// Replays scripted results in order, then repeats the last one
///
/// An empty script always reports the sensor as not responding.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    script: VecDeque<Result<Measurement, SensorError>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Measurement, SensorError>>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl MeasurementSource for ScriptedSource {
    fn read(&mut self) -> Result<Measurement, SensorError> {
        if self.script.len() > 1 {
            if let Some(next) = self.script.pop_front() {
                return next;
            }
        }
        self.script
            .front()
            .cloned()
            .unwrap_or(Err(SensorError::NotResponding))
    }
}
