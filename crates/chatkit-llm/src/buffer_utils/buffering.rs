use std::collections::VecDeque;
use std::str::Utf8Error;

/// Circular buffer for line-based parsing of a chunked body
///
/// Bytes are decoded only once a full line is available, so multi-byte
/// characters split across chunks survive.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract next line (up to \n) from buffer
    /// Returns None if no complete line is available
    pub fn next_line(&mut self) -> Option<Result<String, Utf8Error>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(decode_line(&line_bytes))
    }

    /// Drain whatever is left after the body ended without a trailing newline
    pub fn take_remaining(&mut self) -> Option<Result<String, Utf8Error>> {
        if self.buffer.is_empty() {
            return None;
        }
        let line_bytes: Vec<u8> = self.buffer.drain(..).collect();
        Some(decode_line(&line_bytes))
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn decode_line(bytes: &[u8]) -> Result<String, Utf8Error> {
    std::str::from_utf8(bytes).map(|line| line.trim_end().to_string())
}
