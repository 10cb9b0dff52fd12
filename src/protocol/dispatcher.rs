// Routes parsed command lines to their handlers

use tracing::{debug, warn};

use super::ProtocolError;
use super::command::{Command, CommandError};
use crate::actuation::Actuator;
use crate::messages::Reply;

/// Command dispatcher
///
/// Echo and heartbeat are answered here; everything else goes to the
/// [`Actuator`]. Also remembers when the last line arrived so a watchdog
/// can tell whether the base station is still talking to us.
#[derive(Debug, Default)]
pub struct Dispatcher {
    last_message_ms: Option<u64>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch one complete, non-empty line received at `now_ms`
    ///
    /// Returns the reply to send back, if the command produces one. A line
    /// whose arguments fail to parse never reaches the actuator.
    pub fn dispatch<'a>(
        &mut self,
        line: &'a [u8],
        now_ms: u64,
        actuator: &mut dyn Actuator,
    ) -> Option<Reply<'a>> {
        // Any framed line counts as link activity, valid or not
        self.last_message_ms = Some(now_ms);

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(CommandError::UnknownSpecifier(c)) => {
                warn!("Unknown command specifier {}", c.escape_ascii());
                return Some(ProtocolError::UnknownSpecifier(c).into());
            }
            Err(CommandError::Args(e)) => {
                warn!(
                    "Failed to parse args for {:?}: {}",
                    String::from_utf8_lossy(line),
                    e
                );
                return Some(ProtocolError::Args(e).into());
            }
        };

        debug!("Dispatching {:?}", command);

        let result = match command {
            Command::Heartbeat => return Some(Reply::Heartbeat),
            Command::Echo(text) => return Some(Reply::Echo(text)),
            Command::CameraPan { yaw, pitch } => actuator.move_camera(yaw, pitch),
            Command::MoveDistance { dist, speed, angle } => {
                actuator.move_distance(dist, speed, angle)
            }
            Command::MoveContinuous { speed, angle } => actuator.move_continuous(speed, angle),
            // Cancel and e-stop share the same effect
            Command::Cancel | Command::EStop => actuator.stop_all(),
        };

        match result {
            Ok(()) => None,
            Err(e) => {
                warn!("Actuation failed: {}", e);
                Some(ProtocolError::Actuation(e).into())
            }
        }
    }

    /// Clock value when the last line was dispatched, `None` before the first
    pub fn last_message_ms(&self) -> Option<u64> {
        self.last_message_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuation::{Actuation, ActuationError, RecordingActuator};
    use crate::transport::MockTransport;

    fn render(reply: Option<Reply<'_>>) -> Vec<String> {
        let mut out = MockTransport::new();
        if let Some(reply) = reply {
            reply.write_to(&mut out).unwrap();
        }
        out.written_lines()
    }

    #[test]
    fn test_echo() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator::default();
        let lines = render(dispatcher.dispatch(b"e hello", 0, &mut act));
        assert_eq!(lines, vec!["echo hello"]);
        assert!(act.calls.is_empty());
    }

    #[test]
    fn test_echo_tag_always_separated() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator::default();
        let lines = render(dispatcher.dispatch(b"ehello", 0, &mut act));
        assert_eq!(lines, vec!["echo hello"]);
        let lines = render(dispatcher.dispatch(b"e", 0, &mut act));
        assert_eq!(lines, vec!["echo"]);
    }

    #[test]
    fn test_heartbeat_does_not_echo() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator::default();
        let lines = render(dispatcher.dispatch(b"h", 0, &mut act));
        assert_eq!(lines, vec!["hb"]);
    }

    #[test]
    fn test_pan_invokes_actuator() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator::default();
        assert!(dispatcher.dispatch(b"p 90 45", 0, &mut act).is_none());
        assert_eq!(act.calls, vec![Actuation::CameraPan { yaw: 90, pitch: 45 }]);
    }

    #[test]
    fn test_pan_missing_arg_aborts() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator::default();
        let lines = render(dispatcher.dispatch(b"p 90", 0, &mut act));
        assert_eq!(lines, vec!["log error Failed to parse args"]);
        assert!(act.calls.is_empty());
    }

    #[test]
    fn test_move_distance() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator::default();
        assert!(dispatcher.dispatch(b"d -100 200 30", 0, &mut act).is_none());
        assert_eq!(
            act.calls,
            vec![Actuation::MoveDistance {
                dist: -100,
                speed: 200,
                angle: 30
            }]
        );
    }

    #[test]
    fn test_move_distance_garbage_aborts() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator::default();
        let lines = render(dispatcher.dispatch(b"d -100 fast 30", 0, &mut act));
        assert_eq!(lines, vec!["log error Failed to parse args"]);
        assert!(act.calls.is_empty());
    }

    #[test]
    fn test_move_continuous() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator::default();
        assert!(dispatcher.dispatch(b"c 150 270", 0, &mut act).is_none());
        assert_eq!(
            act.calls,
            vec![Actuation::MoveContinuous {
                speed: 150,
                angle: 270
            }]
        );
    }

    #[test]
    fn test_cancel_and_estop_both_stop() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator::default();
        dispatcher.dispatch(b"x", 0, &mut act);
        dispatcher.dispatch(b"!", 0, &mut act);
        assert_eq!(act.stops(), 2);
    }

    #[test]
    fn test_unknown_specifier() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator::default();
        let lines = render(dispatcher.dispatch(b"zzz", 0, &mut act));
        assert_eq!(lines, vec!["log error Unknown command specifier z"]);
        assert!(act.calls.is_empty());
    }

    #[test]
    fn test_non_ascii_specifier_is_escaped() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator::default();
        let lines = render(dispatcher.dispatch(b"\xc3\xa9", 0, &mut act));
        assert_eq!(lines, vec!["log error Unknown command specifier \\xc3"]);
        let lines = render(dispatcher.dispatch(b"\x01", 0, &mut act));
        assert_eq!(lines, vec!["log error Unknown command specifier \\x01"]);
    }

    #[test]
    fn test_actuator_failure_reported() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator {
            fail_with: Some(ActuationError::NotReady),
            ..Default::default()
        };
        let lines = render(dispatcher.dispatch(b"p 1 2", 0, &mut act));
        assert_eq!(lines, vec!["log error Actuation failed: actuator not ready"]);
    }

    #[test]
    fn test_any_line_refreshes_last_message() {
        let mut dispatcher = Dispatcher::new();
        let mut act = RecordingActuator::default();
        assert_eq!(dispatcher.last_message_ms(), None);

        dispatcher.dispatch(b"e x", 100, &mut act);
        assert_eq!(dispatcher.last_message_ms(), Some(100));

        dispatcher.dispatch(b"zzz", 250, &mut act);
        assert_eq!(dispatcher.last_message_ms(), Some(250));

        dispatcher.dispatch(b"p bad", 300, &mut act);
        assert_eq!(dispatcher.last_message_ms(), Some(300));
    }
}
