// Command link: transport bytes -> framer -> dispatcher -> replies

use tracing::{debug, warn};

use super::ProtocolError;
use super::dispatcher::Dispatcher;
use super::framer::{Frame, LineFramer};
use crate::actuation::Actuator;
use crate::config::{LINE_CAPACITY, RX_BUDGET};
use crate::messages::Reply;
use crate::transport::{self, Transport};

/// What one [`CommandLink::poll`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub dispatched: usize,
    pub write_failed: usize,
}

/// Owns the framing and dispatch state for one command transport
#[derive(Default)]
pub struct CommandLink {
    framer: LineFramer,
    dispatcher: Dispatcher,
}

impl CommandLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain available input, dispatching every completed line
    ///
    /// Reads at most [`RX_BUDGET`] bytes so a flooding peer cannot starve
    /// the rest of the loop; the remainder is picked up next iteration.
    /// A reply that cannot be written is logged and counted; the command
    /// has already been applied and draining continues. Only a failed read
    /// is returned as an error.
    pub fn poll(
        &mut self,
        transport: &mut dyn Transport,
        actuator: &mut dyn Actuator,
        now_ms: u64,
    ) -> transport::Result<PollStats> {
        let mut stats = PollStats::default();

        for _ in 0..RX_BUDGET {
            let Some(byte) = transport.read_byte()? else {
                break;
            };

            let reply = match self.framer.feed(byte) {
                Frame::Line(line) => {
                    stats.dispatched += 1;
                    self.dispatcher.dispatch(line, now_ms, actuator)
                }
                Frame::Overrun => {
                    warn!("Command line longer than {} bytes, dropping", LINE_CAPACITY);
                    Some(Reply::Error(ProtocolError::Overrun))
                }
                Frame::Discarded => {
                    debug!("Discarded overrun line");
                    None
                }
                Frame::Pending | Frame::Empty => None,
            };

            if let Some(reply) = reply {
                if let Err(e) = reply.write_to(transport) {
                    warn!("Reply write failed: {}", e);
                    stats.write_failed += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Clock value of the last dispatched line
    pub fn last_message_ms(&self) -> Option<u64> {
        self.dispatcher.last_message_ms()
    }
}
