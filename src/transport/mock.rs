//! In-memory transport for tests and bench runs

use std::collections::VecDeque;
use std::io;

use super::{Result, Transport};

/// Mock transport: bytes injected with [`MockTransport::inject`] are
/// returned by `read_byte`, everything written is captured for inspection.
#[derive(Debug, Default)]
pub struct MockTransport {
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
    fail_writes: bool,
}

impl MockTransport {
    /// Create an empty mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes to be read
    pub fn inject(&mut self, data: &[u8]) {
        self.read_buffer.extend(data);
    }

    /// Number of injected bytes not yet read
    pub fn pending(&self) -> usize {
        self.read_buffer.len()
    }

    /// Raw bytes written so far
    pub fn written(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Written output split into lines (terminators removed)
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.write_buffer)
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Make every following write (and flush) time out, like an unplugged radio
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "mock write timed out").into());
        }
        Ok(())
    }
}

impl Transport for MockTransport {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.read_buffer.pop_front())
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.check_writable()?;
        self.write_buffer.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.check_writable()
    }
}
