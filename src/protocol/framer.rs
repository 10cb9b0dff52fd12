// Line framing for the command link
//
// Bytes accumulate in a fixed buffer until the terminator arrives. A line
// longer than the buffer is dropped whole: once capacity is exceeded every
// further byte is discarded and the terminator only clears the overrun.
// One extra slot holds the `\r` of a CRLF sender's full-length line.

use crate::config::{LINE_CAPACITY, LINE_TERMINATOR};

/// What a single fed byte produced
#[derive(Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Byte buffered (or dropped on an already overrun line)
    Pending,
    /// Capacity was exceeded by this byte. Reported once per line.
    Overrun,
    /// A complete, non-empty line without its terminator
    Line(&'a [u8]),
    /// Terminator ended an overrun line; nothing to dispatch
    Discarded,
    /// Terminator with nothing buffered
    Empty,
}

/// Bounded line buffer with overrun tracking
pub struct LineFramer {
    buf: [u8; LINE_CAPACITY + 1],
    len: usize,
    overrun: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            buf: [0; LINE_CAPACITY + 1],
            len: 0,
            overrun: false,
        }
    }

    /// Feed one received byte
    pub fn feed(&mut self, byte: u8) -> Frame<'_> {
        if byte == LINE_TERMINATOR {
            return self.terminate();
        }

        if self.overrun {
            return Frame::Pending;
        }

        let limit = if byte == b'\r' {
            LINE_CAPACITY + 1
        } else {
            LINE_CAPACITY
        };
        if self.len >= limit {
            self.overrun = true;
            return Frame::Overrun;
        }

        self.buf[self.len] = byte;
        self.len += 1;
        Frame::Pending
    }

    fn terminate(&mut self) -> Frame<'_> {
        let len = self.len;
        self.len = 0;

        if self.overrun {
            self.overrun = false;
            return Frame::Discarded;
        }

        // Tolerate CRLF senders
        let line = match &self.buf[..len] {
            [rest @ .., b'\r'] => rest,
            all => all,
        };

        if line.is_empty() {
            Frame::Empty
        } else {
            Frame::Line(line)
        }
    }

    /// Bytes currently buffered
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}
