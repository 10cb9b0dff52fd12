//! Byte transport used by the command link and the telemetry stream
//!
//! The runtime only needs two primitives from a link: "give me the next
//! received byte if there is one" and "write these bytes". Both the serial
//! port and the in-memory test double implement them.

mod mock;
mod serial;

pub use mock::MockTransport;
pub use serial::SerialTransport;

/// Error types for transport I/O
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// A byte stream with a non-blocking read side
pub trait Transport {
    /// Return the next received byte, or `None` when nothing is waiting.
    ///
    /// Must never block waiting for data.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Write all bytes to the link
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Push buffered output to the wire
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Write `line` followed by the protocol terminator
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.write_all(line.as_bytes())?;
        self.write_all(&[crate::config::LINE_TERMINATOR])
    }
}
