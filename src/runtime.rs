// Cooperative main loop with a command-link watchdog
// Each iteration drains the command link, advances the sensor scheduler and
// checks how long ago the base station last sent a line. If the link goes
// quiet the rover is stopped, so a crashed base station cannot leave it
// driving. Transport failures inside the loop are logged and counted; they
// never end it.

use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

// local imports
use crate::actuation::{Actuator, LoggingActuator};
use crate::clock::MonotonicClock;
use crate::config::{RoverConfig, SensorConfig};
use crate::error::Result;
use crate::messages::RuntimeHealth;
use crate::protocol::CommandLink;
use crate::sensors::sim::SimulatedSource;
use crate::sensors::{MeasurementSource, Scheduler};
use crate::transport::{SerialTransport, Transport};

pub struct Runtime<A: Actuator> {
    link: CommandLink,
    scheduler: Scheduler,
    actuator: A,
    health: RuntimeHealth,
    watchdog_timeout_ms: u64,
    started_ms: u64,
    transport_errors: u64,
    shut_down: bool,
}

impl<A: Actuator> Runtime<A> {
    pub fn new(scheduler: Scheduler, actuator: A, watchdog_timeout_ms: u64, now_ms: u64) -> Self {
        Self {
            link: CommandLink::new(),
            scheduler,
            actuator,
            health: RuntimeHealth::LinkStale, // Start stale until first line
            watchdog_timeout_ms,
            started_ms: now_ms,
            transport_errors: 0,
            shut_down: false,
        }
    }

    /// One loop iteration at `now_ms`
    ///
    /// Replies go back on `command`; telemetry goes to `telemetry` when a
    /// separate link is given, otherwise it shares `command`.
    pub fn step(
        &mut self,
        now_ms: u64,
        command: &mut dyn Transport,
        telemetry: Option<&mut dyn Transport>,
    ) {
        // 1. Drain pending input
        match self.link.poll(command, &mut self.actuator, now_ms) {
            Ok(stats) => self.transport_errors += stats.write_failed as u64,
            Err(e) => {
                warn!("Command link read failed: {}", e);
                self.transport_errors += 1;
            }
        }

        // 2. Poll / report sensors
        let out: &mut dyn Transport = match telemetry {
            Some(t) => t,
            None => command,
        };
        let stats = self.scheduler.tick(now_ms, out);
        self.transport_errors += stats.write_failed as u64;
        if let Err(e) = out.flush() {
            warn!("Telemetry flush failed: {}", e);
            self.transport_errors += 1;
        }

        // 3. Watchdog
        self.check_watchdog(now_ms);
    }

    fn check_watchdog(&mut self, now_ms: u64) {
        let last = self.link.last_message_ms().unwrap_or(self.started_ms);
        let age = now_ms.saturating_sub(last);
        let stale = self.link.last_message_ms().is_none() || age > self.watchdog_timeout_ms;

        match (stale, self.health) {
            (true, RuntimeHealth::Ok) => {
                warn!("Command link stale ({}ms since last line), stopping rover", age);
                if let Err(e) = self.actuator.stop_all() {
                    warn!("Watchdog stop failed: {}", e);
                }
                self.health = RuntimeHealth::LinkStale;
            }
            (false, RuntimeHealth::LinkStale) => {
                info!("Command link active");
                self.health = RuntimeHealth::Ok;
            }
            _ => {}
        }
    }

    /// Stop motion before exiting. Dropping the runtime does the same.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.actuator.stop_all() {
            warn!("Failed to stop motion on shutdown: {}", e);
        }
        self.shut_down = true;
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Failed reads, reply writes, telemetry writes and flushes so far
    pub fn transport_errors(&self) -> u64 {
        self.transport_errors
    }
}

impl<A: Actuator> Drop for Runtime<A> {
    fn drop(&mut self) {
        if !self.shut_down {
            self.shutdown();
        }
    }
}

fn simulated_source(sensor: &SensorConfig) -> Box<dyn MeasurementSource> {
    Box::new(SimulatedSource::new(sensor.kind))
}

pub async fn run(config: RoverConfig) -> Result<()> {
    config.validate()?;
    let clock = MonotonicClock::new();

    info!("Opening command link...");
    let mut command = SerialTransport::open(&config.serial.port, config.serial.baud_rate)?;
    let mut telemetry = match &config.serial.telemetry_port {
        Some(port) => Some(SerialTransport::open(port, config.serial.baud_rate)?),
        None => None,
    };

    // Chip drivers are not linked in; every sensor reads simulated values
    let scheduler = Scheduler::from_config(&config.sensors, clock.now_ms(), simulated_source);

    let mut runtime = Runtime::new(
        scheduler,
        LoggingActuator::new(),
        config.watchdog_timeout_ms,
        clock.now_ms(),
    );

    let mut tick = interval(config.loop_period());
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout, {} sensors",
        config.loop_hz,
        config.watchdog_timeout_ms,
        runtime.scheduler().len()
    );
    info!(
        "Commands on {}, telemetry on {}",
        config.serial.port,
        config.serial.telemetry_port.as_deref().unwrap_or(&config.serial.port)
    );

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let telemetry = telemetry.as_mut().map(|t| t as &mut dyn Transport);
                runtime.step(clock.now_ms(), &mut command, telemetry);
            }
            result = &mut shutdown => {
                match result {
                    Ok(()) => info!("Shutdown requested"),
                    Err(e) => warn!("Signal handler failed, shutting down: {}", e),
                }
                break;
            }
        }
    }

    runtime.shutdown();
    info!(
        "Runtime stopped ({} transport errors)",
        runtime.transport_errors()
    );
    Ok(())
}
