// Outbound message types: protocol replies and runtime health

use serde::{Deserialize, Serialize};

use crate::protocol::ProtocolError;
use crate::transport::{self, Transport};

/// Tag on every diagnostic line
pub const LOG_ERROR_TAG: &str = "log error";

/// Heartbeat acknowledgement token
pub const HEARTBEAT_ACK: &str = "hb";

/// Prefix of echo replies; the echoed text follows after a space
pub const ECHO_TAG: &str = "echo";

/// A line sent back over the command link in response to input
#[derive(Debug)]
pub enum Reply<'a> {
    Heartbeat,
    /// Echoed text, written verbatim after the tag
    Echo(&'a [u8]),
    Error(ProtocolError),
}

impl Reply<'_> {
    /// Write this reply as one terminated line
    pub fn write_to(&self, out: &mut dyn Transport) -> transport::Result<()> {
        match self {
            Reply::Heartbeat => out.write_line(HEARTBEAT_ACK),
            Reply::Echo(text) => {
                out.write_all(ECHO_TAG.as_bytes())?;
                if !text.is_empty() {
                    out.write_all(b" ")?;
                    out.write_all(text)?;
                }
                out.write_all(&[crate::config::LINE_TERMINATOR])
            }
            Reply::Error(err) => out.write_line(&format!("{} {}", LOG_ERROR_TAG, err)),
        }
    }
}

impl From<ProtocolError> for Reply<'_> {
    fn from(err: ProtocolError) -> Self {
        Reply::Error(err)
    }
}

/// Health status tracked by the runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    LinkStale,
}
