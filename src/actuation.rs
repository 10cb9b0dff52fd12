// Actuation seam between the command dispatcher and the motor/servo code
//
// The motion routines live outside this crate. The dispatcher only needs a
// handful of entry points, each of which may fail without taking the
// runtime down.

use tracing::{info, warn};

/// Error types reported by actuation collaborators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActuationError {
    #[error("actuator not ready")]
    NotReady,
}

pub type Result<T> = std::result::Result<T, ActuationError>;

/// A single requested motion, as handed to an [`Actuator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    CameraPan { yaw: u16, pitch: u16 },
    MoveDistance { dist: i16, speed: u16, angle: i16 },
    MoveContinuous { speed: u16, angle: u16 },
    Stop,
}

/// Motion collaborator invoked by commands
pub trait Actuator {
    /// Point the camera gimbal (degrees)
    fn move_camera(&mut self, yaw: u16, pitch: u16) -> Result<()>;

    /// Drive `dist` mm at `speed` mm/s along heading `angle` degrees
    fn move_distance(&mut self, dist: i16, speed: u16, angle: i16) -> Result<()>;

    /// Drive until stopped at `speed` mm/s along heading `angle` degrees
    fn move_continuous(&mut self, speed: u16, angle: u16) -> Result<()>;

    /// Stop all motion immediately. Must be idempotent.
    fn stop_all(&mut self) -> Result<()>;
}

impl<A: Actuator + ?Sized> Actuator for &mut A {
    fn move_camera(&mut self, yaw: u16, pitch: u16) -> Result<()> {
        (**self).move_camera(yaw, pitch)
    }

    fn move_distance(&mut self, dist: i16, speed: u16, angle: i16) -> Result<()> {
        (**self).move_distance(dist, speed, angle)
    }

    fn move_continuous(&mut self, speed: u16, angle: u16) -> Result<()> {
        (**self).move_continuous(speed, angle)
    }

    fn stop_all(&mut self) -> Result<()> {
        (**self).stop_all()
    }
}

/// Actuator that only logs what it was asked to do
///
/// Used when the rover runs without its motor controller attached.
#[derive(Debug, Default)]
pub struct LoggingActuator {
    last: Option<Actuation>,
    // Camera pans do not change this
    moving: bool,
}

impl LoggingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last accepted actuation, if any
    pub fn last(&self) -> Option<Actuation> {
        self.last
    }

    /// Whether a motion command is active (not followed by a stop)
    pub fn is_moving(&self) -> bool {
        self.moving
    }
}

impl Actuator for LoggingActuator {
    fn move_camera(&mut self, yaw: u16, pitch: u16) -> Result<()> {
        info!("Camera pan: yaw={}° pitch={}°", yaw, pitch);
        self.last = Some(Actuation::CameraPan { yaw, pitch });
        Ok(())
    }

    fn move_distance(&mut self, dist: i16, speed: u16, angle: i16) -> Result<()> {
        if speed == 0 && dist != 0 {
            warn!("Move of {} mm requested at zero speed", dist);
        }
        info!("Move distance: {} mm at {} mm/s, heading {}°", dist, speed, angle);
        self.last = Some(Actuation::MoveDistance { dist, speed, angle });
        self.moving = true;
        Ok(())
    }

    fn move_continuous(&mut self, speed: u16, angle: u16) -> Result<()> {
        info!("Move continuous: {} mm/s, heading {}°", speed, angle);
        self.last = Some(Actuation::MoveContinuous { speed, angle });
        self.moving = true;
        Ok(())
    }

    fn stop_all(&mut self) -> Result<()> {
        if self.is_moving() {
            info!("Stopping all motion");
        }
        self.last = Some(Actuation::Stop);
        self.moving = false;
        Ok(())
    }
}

/// Test double that records every call and can be told to fail
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingActuator {
    pub calls: Vec<Actuation>,
    pub fail_with: Option<ActuationError>,
}

#[cfg(test)]
impl RecordingActuator {
    fn record(&mut self, actuation: Actuation) -> Result<()> {
        if let Some(err) = self.fail_with.clone() {
            return Err(err);
        }
        self.calls.push(actuation);
        Ok(())
    }

    pub fn stops(&self) -> usize {
        self.calls.iter().filter(|a| **a == Actuation::Stop).count()
    }
}

#[cfg(test)]
impl Actuator for RecordingActuator {
    fn move_camera(&mut self, yaw: u16, pitch: u16) -> Result<()> {
        self.record(Actuation::CameraPan { yaw, pitch })
    }

    fn move_distance(&mut self, dist: i16, speed: u16, angle: i16) -> Result<()> {
        self.record(Actuation::MoveDistance { dist, speed, angle })
    }

    fn move_continuous(&mut self, speed: u16, angle: u16) -> Result<()> {
        self.record(Actuation::MoveContinuous { speed, angle })
    }

    fn stop_all(&mut self) -> Result<()> {
        self.record(Actuation::Stop)
    }
}
