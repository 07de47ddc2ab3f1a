//! Brace-delimited message framing
//!
//! Recovers complete top-level JSON objects from a byte stream that carries
//! no length prefixes. Each push appends to a rolling input buffer; the
//! framer repeatedly finds the earlier of the first `{` and first `}`, moves
//! the prefix ending at that delimiter into a partial-message accumulator and
//! emits the accumulator once it holds an equal, positive count of both.
//!
//! In [`FramingMode::BraceCount`] a string payload containing an unmatched
//! brace desynchronizes the stream. [`FramingMode::StringAware`] skips braces
//! inside JSON string literals, honoring backslash escapes.

use crate::{Result, TransportError};
use bytes::{Bytes, BytesMut};
use settings::{FramingMode, FramingSettings};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

const OPEN: u8 = b'{';
const CLOSE: u8 = b'}';

/// Incremental splitter for concatenated JSON objects
#[derive(Debug)]
pub struct MessageFramer {
    mode: FramingMode,
    max_message_size: usize,
    input: BytesMut,
    partial: BytesMut,
    opens: usize,
    closes: usize,
    in_string: bool,
    escaped: bool,
    dropped: u64,
}

impl MessageFramer {
    pub fn new(settings: &FramingSettings) -> Self {
        Self {
            mode: settings.mode,
            max_message_size: settings.max_message_size,
            input: BytesMut::with_capacity(settings.read_buffer_size),
            partial: BytesMut::new(),
            opens: 0,
            closes: 0,
            in_string: false,
            escaped: false,
            dropped: 0,
        }
    }

    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    /// Bytes held in the accumulator for a message not yet closed
    pub fn partial_len(&self) -> usize {
        self.partial.len()
    }

    /// Partial messages discarded by the oversize guard
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Append `data` and return every message it completes, in stream order
    pub fn push(&mut self, data: &[u8]) -> Vec<Bytes> {
        self.input.extend_from_slice(data);
        let mut complete = Vec::new();

        while !self.input.is_empty() {
            let Some((at, delimiter)) = self.next_delimiter() else {
                let rest = self.input.split();
                if self.in_message() {
                    self.partial.extend_from_slice(&rest);
                    self.check_size();
                } else {
                    discard_stray(&rest);
                }
                break;
            };

            let prefix = self.input.split_to(at + 1);
            if !self.in_message() {
                if delimiter == CLOSE {
                    discard_stray(&prefix);
                    continue;
                }
                // Leading bytes before the opening brace belong to no message
                discard_stray(&prefix[..at]);
                self.partial.extend_from_slice(&prefix[at..]);
            } else {
                self.partial.extend_from_slice(&prefix);
            }

            match delimiter {
                OPEN => self.opens += 1,
                _ => self.closes += 1,
            }

            if self.opens > 0 && self.opens == self.closes {
                let message = self.partial.split().freeze();
                debug!(bytes = message.len(), "Framed message");
                complete.push(message);
                self.reset_message();
            } else {
                self.check_size();
            }
        }

        complete
    }

    /// Drop any partially accumulated message and unread input
    pub fn reset(&mut self) {
        self.input.clear();
        self.partial.clear();
        self.reset_message();
    }

    fn in_message(&self) -> bool {
        self.opens > self.closes
    }

    fn reset_message(&mut self) {
        self.opens = 0;
        self.closes = 0;
        self.in_string = false;
        self.escaped = false;
    }

    fn check_size(&mut self) {
        if self.partial.len() > self.max_message_size {
            warn!(
                bytes = self.partial.len(),
                limit = self.max_message_size,
                "Discarding oversized partial message"
            );
            self.dropped += 1;
            self.partial.clear();
            self.reset_message();
        }
    }

    /// Position and value of the earliest structural delimiter in the input
    fn next_delimiter(&mut self) -> Option<(usize, u8)> {
        match self.mode {
            FramingMode::BraceCount => {
                let open = self.input.iter().position(|&b| b == OPEN);
                let close = self.input.iter().position(|&b| b == CLOSE);
                match (open, close) {
                    (Some(o), Some(c)) if c < o => Some((c, CLOSE)),
                    (Some(o), _) => Some((o, OPEN)),
                    (None, Some(c)) => Some((c, CLOSE)),
                    (None, None) => None,
                }
            }
            FramingMode::StringAware => self.scan_outside_strings(),
        }
    }

    fn scan_outside_strings(&mut self) -> Option<(usize, u8)> {
        let inside = self.in_message();
        for (i, &b) in self.input.iter().enumerate() {
            if inside {
                if self.in_string {
                    if self.escaped {
                        self.escaped = false;
                    } else if b == b'\\' {
                        self.escaped = true;
                    } else if b == b'"' {
                        self.in_string = false;
                    }
                    continue;
                }
                if b == b'"' {
                    self.in_string = true;
                    continue;
                }
            }
            if b == OPEN || b == CLOSE {
                return Some((i, b));
            }
        }
        None
    }
}

fn discard_stray(bytes: &[u8]) {
    if bytes.iter().any(|b| !b.is_ascii_whitespace()) {
        warn!(
            bytes = bytes.len(),
            text = %String::from_utf8_lossy(bytes),
            "Discarding bytes outside any message"
        );
    }
}

/// Read from `reader` until `framer` yields one message
///
/// Additional messages completed by the same read are dropped with a warning;
/// this is meant for request/response exchanges with a single reply.
pub async fn read_one_message<R>(reader: &mut R, framer: &mut MessageFramer) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; 4096];
    loop {
        let n = reader
            .read(&mut chunk)
            .await
            .map_err(|e| TransportError::network_with_source("Failed to read message", e))?;
        if n == 0 {
            return Err(TransportError::closed("peer closed before a complete message"));
        }

        let mut messages = framer.push(&chunk[..n]).into_iter();
        if let Some(first) = messages.next() {
            let extra = messages.count();
            if extra > 0 {
                warn!(extra, "Ignoring messages after the expected reply");
            }
            return Ok(first);
        }
    }
}
