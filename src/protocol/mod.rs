// Line-framed command protocol
//
// Provides:
// - Line framing with overrun protection
// - Strict typed argument parsing
// - Command dispatch to the actuation collaborator
// - The command link that drains a transport through all of the above

pub mod args;
pub mod command;
mod dispatcher;
pub mod framer;
mod link;

pub use command::Command;
pub use dispatcher::Dispatcher;
pub use framer::{Frame, LineFramer};
pub use link::{CommandLink, PollStats};

use crate::actuation::ActuationError;
use args::ArgError;

/// Protocol-level failures. The `Display` text is what goes on the wire
/// after the `log error` tag.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Command buffer overrun")]
    Overrun,

    /// Non-printable bytes are rendered escaped, e.g. `\xff`
    #[error("Unknown command specifier {}", .0.escape_ascii())]
    UnknownSpecifier(u8),

    #[error("Failed to parse args")]
    Args(#[source] ArgError),

    #[error("Actuation failed: {0}")]
    Actuation(#[from] ActuationError),
}
