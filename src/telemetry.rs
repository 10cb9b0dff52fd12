// Telemetry line formatting
//
// One report is one line: `data <name> <fields...>`. Field order and
// precision are fixed per measurement kind because the base station parses
// the fields by position.
//
//   Environment  temp(.2) humidity(.2) pressure(.0)
//   Orientation  roll(.2) pitch(.2) yaw(.2) ax(.2) ay(.2) az(.2) temp(.0)
//   Power        voltage(.2) current(.2)
//   Current      current(.2)

use std::fmt::Write;

use crate::config::LINE_TERMINATOR;
use crate::sensors::Measurement;

/// Leading tag of every telemetry line
pub const DATA_TAG: &str = "data";

/// Render `measurement` for sensor `name` into `buf`, replacing its contents.
/// The line includes its terminator.
pub fn format_into(buf: &mut String, name: &str, measurement: &Measurement) {
    buf.clear();
    buf.push_str(DATA_TAG);
    buf.push(' ');
    buf.push_str(name);

    match *measurement {
        Measurement::Environment {
            temperature_c,
            humidity_pct,
            pressure_pa,
        } => {
            field(buf, temperature_c, 2);
            field(buf, humidity_pct, 2);
            field(buf, pressure_pa, 0);
        }
        Measurement::Orientation {
            roll,
            pitch,
            yaw,
            accel,
            temperature_c,
        } => {
            field(buf, roll, 2);
            field(buf, pitch, 2);
            field(buf, yaw, 2);
            for a in accel {
                field(buf, a, 2);
            }
            field(buf, temperature_c, 0);
        }
        Measurement::Power {
            voltage_v,
            current_a,
        } => {
            field(buf, voltage_v, 2);
            field(buf, current_a, 2);
        }
        Measurement::Current { current_a } => {
            field(buf, current_a, 2);
        }
    }

    buf.push(char::from(LINE_TERMINATOR));
}

fn field(buf: &mut String, value: f32, precision: usize) {
    // Non-finite values would break positional parsing downstream
    let value = if value.is_finite() { value } else { 0.0 };
    // Writing into a String cannot fail
    let _ = write!(buf, " {:.*}", precision, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SensorKind;

    fn render(name: &str, m: &Measurement) -> String {
        let mut buf = String::new();
        format_into(&mut buf, name, m);
        buf
    }

    #[test]
    fn test_environment_line() {
        let m = Measurement::Environment {
            temperature_c: 21.456,
            humidity_pct: 40.0,
            pressure_pa: 101_325.4,
        };
        assert_eq!(render("env", &m), "data env 21.46 40.00 101325\n");
    }

    #[test]
    fn test_orientation_line() {
        let m = Measurement::Orientation {
            roll: -1.5,
            pitch: 2.25,
            yaw: 359.99,
            accel: [0.1, -0.2, 9.81],
            temperature_c: 31.0,
        };
        assert_eq!(
            render("imu", &m),
            "data imu -1.50 2.25 359.99 0.10 -0.20 9.81 31\n"
        );
    }

    #[test]
    fn test_power_and_current_lines() {
        let power = Measurement::Power {
            voltage_v: 11.1,
            current_a: 0.5,
        };
        assert_eq!(render("power", &power), "data power 11.10 0.50\n");

        let current = Measurement::Current { current_a: 2.0 };
        assert_eq!(render("motor", &current), "data motor 2.00\n");
    }

    #[test]
    fn test_non_finite_rendered_as_zero() {
        let m = Measurement::Power {
            voltage_v: f32::NAN,
            current_a: f32::INFINITY,
        };
        assert_eq!(render("power", &m), "data power 0.00 0.00\n");
    }

    #[test]
    fn test_field_count_is_stable_per_kind() {
        for (kind, values) in [
            (SensorKind::Bme280, 3),
            (SensorKind::Bno055, 7),
            (SensorKind::Ina260, 2),
            (SensorKind::AnalogCurrent, 1),
        ] {
            let line = render("s", &kind.zero_measurement());
            let fields = line.trim_end().split(' ').count();
            assert_eq!(fields, 2 + values, "{:?}", kind);
        }
    }

    #[test]
    fn test_buffer_is_reused() {
        let mut buf = String::from("stale contents");
        format_into(&mut buf, "cell", &Measurement::Current { current_a: 1.0 });
        assert_eq!(buf, "data cell 1.00\n");
    }
}
