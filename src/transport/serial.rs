//! Serial port transport

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

use super::{Result, Transport};

/// Write timeout; reads never wait because they are sized by `bytes_to_read`
pub const DEFAULT_TIMEOUT_MS: u64 = 50;

/// Bytes pulled from the driver per refill
const RX_CHUNK: usize = 64;

/// Serial transport over a UART / USB CDC device
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    rx: [u8; RX_CHUNK],
    rx_len: usize,
    rx_pos: usize,
}

impl SerialTransport {
    /// Open a serial port at `baud_rate`, 8N1, no flow control
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        info!("Opened serial port {} at {} baud", path, baud_rate);
        Ok(Self::from_port(port))
    }

    fn from_port(port: Box<dyn SerialPort>) -> Self {
        Self {
            port,
            rx: [0; RX_CHUNK],
            rx_len: 0,
            rx_pos: 0,
        }
    }

    /// Refill the receive chunk with whatever the driver already holds
    fn refill(&mut self) -> Result<()> {
        self.rx_pos = 0;
        self.rx_len = 0;

        let waiting = self.port.bytes_to_read()? as usize;
        if waiting == 0 {
            return Ok(());
        }

        let want = waiting.min(RX_CHUNK);
        match self.port.read(&mut self.rx[..want]) {
            Ok(n) => {
                debug!("Read {} bytes from serial", n);
                self.rx_len = n;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Transport for SerialTransport {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.rx_pos >= self.rx_len {
            self.refill()?;
        }
        if self.rx_pos < self.rx_len {
            let byte = self.rx[self.rx_pos];
            self.rx_pos += 1;
            Ok(Some(byte))
        } else {
            Ok(None)
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.port.flush()?;
        Ok(())
    }
}
