// Rover firmware runtime
//
// Accepts line-delimited commands over a serial link and reports sensor
// telemetry on a fixed cadence, all from one cooperative loop.

pub mod actuation;
pub mod clock;
pub mod config;
pub mod error;
pub mod messages;
pub mod protocol;
pub mod runtime;
pub mod sensors;
pub mod telemetry;
pub mod transport;

pub use error::{Result, RoverError};
