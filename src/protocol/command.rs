// Commands accepted on the serial link, one per line
//
// Line format: a single specifier byte followed by an optional
// whitespace-delimited argument tail.
//
//   h                         heartbeat
//   e <text>                  echo
//   p <yaw> <pitch>           camera pan, degrees
//   d <dist> <speed> <angle>  move distance, mm / mm/s / degrees
//   c <speed> <angle>         move continuous, mm/s / degrees
//   x | !                     cancel / e-stop

use super::args::{ArgError, Args};

/// A command parsed from one completed line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Heartbeat,
    /// Remainder of the line after the specifier and one separating space
    Echo(&'a [u8]),
    CameraPan {
        yaw: u16,
        pitch: u16,
    },
    MoveDistance {
        dist: i16,
        speed: u16,
        angle: i16,
    },
    MoveContinuous {
        speed: u16,
        angle: u16,
    },
    Cancel,
    EStop,
}

/// Why a line could not become a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Raw specifier byte, which need not be ASCII
    UnknownSpecifier(u8),
    Args(ArgError),
}

impl From<ArgError> for CommandError {
    fn from(e: ArgError) -> Self {
        CommandError::Args(e)
    }
}

impl<'a> Command<'a> {
    /// Parse a non-empty line
    pub fn parse(line: &'a [u8]) -> Result<Self, CommandError> {
        let Some((&specifier, tail)) = line.split_first() else {
            return Err(CommandError::Args(ArgError::Missing { index: 0 }));
        };

        match specifier {
            b'h' => Ok(Command::Heartbeat),
            b'e' => Ok(Command::Echo(tail.strip_prefix(b" ").unwrap_or(tail))),
            b'p' => {
                let mut args = Args::from_bytes(tail)?;
                let yaw = args.parse_next()?;
                let pitch = args.parse_next()?;
                args.finish()?;
                Ok(Command::CameraPan { yaw, pitch })
            }
            b'd' => {
                let mut args = Args::from_bytes(tail)?;
                let dist = args.parse_next()?;
                let speed = args.parse_next()?;
                let angle = args.parse_next()?;
                args.finish()?;
                Ok(Command::MoveDistance { dist, speed, angle })
            }
            b'c' => {
                let mut args = Args::from_bytes(tail)?;
                let speed = args.parse_next()?;
                let angle = args.parse_next()?;
                args.finish()?;
                Ok(Command::MoveContinuous { speed, angle })
            }
            b'x' => Ok(Command::Cancel),
            b'!' => Ok(Command::EStop),
            other => Err(CommandError::UnknownSpecifier(other)),
        }
    }
}
