//! Server-Sent Events framing
//!
//! Turns a line-oriented `text/event-stream` body into message payloads.
//! Framing is deliberately forgiving: upstream servers differ on whether
//! they prefix payload lines with `data:`, so unprefixed lines are kept too.
//!
//! ## Framing Rules
//!
//! | Line (after trimming) | Effect |
//! |---|---|
//! | empty | flush buffered lines as one message (if any) |
//! | `:...` | comment / keep-alive, dropped |
//! | `data: x` | buffer `x` |
//! | anything else | buffer verbatim |
//!
//! Whatever is still buffered at end of input becomes the last message.
//!
//! ## Example
//!
//! ```rust
//! use std::io::Cursor;
//! use loeco_core::stream::SseParser;
//!
//! let body = ": keep-alive\n\ndata: {\"a\":1}\n\ndata: {\"b\":2}\n";
//! let messages: Vec<String> = SseParser::new(Cursor::new(body))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(messages, vec!["{\"a\":1}", "{\"b\":2}"]);
//! ```

use std::io::{self, BufRead};

/// Statistics for event stream parsing
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SseStats {
    /// Lines read from the transport
    pub lines_read: usize,
    /// Comment / keep-alive lines dropped
    pub comments_dropped: usize,
    /// Messages yielded
    pub messages_emitted: usize,
    /// Bytes read from the transport
    pub bytes_read: usize,
}

/// Lazy SSE message iterator over any buffered reader
pub struct SseParser<R> {
    reader: R,
    /// Lines of the message being assembled
    buffer: Vec<String>,
    /// Scratch line buffer reused across reads
    line: String,
    /// Set after EOF or a transport error
    done: bool,
    stats: SseStats,
}

impl<R: BufRead> SseParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line: String::new(),
            done: false,
            stats: SseStats::default(),
        }
    }

    /// Get statistics
    pub fn stats(&self) -> &SseStats {
        &self.stats
    }

    fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let message = self.buffer.join("\n");
        self.buffer.clear();
        self.stats.messages_emitted += 1;
        Some(message)
    }

    /// Read the next raw line into `self.line`; `false` at end of input
    fn read_line(&mut self) -> io::Result<bool> {
        self.line.clear();
        let n = self.reader.read_line(&mut self.line)?;
        if n == 0 {
            return Ok(false);
        }
        self.stats.lines_read += 1;
        self.stats.bytes_read += n;
        Ok(true)
    }
}

impl<R: BufRead> Iterator for SseParser<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.read_line() {
                Ok(true) => {}
                Ok(false) => {
                    self.done = true;
                    return self.flush().map(Ok);
                }
                Err(e) => {
                    self.done = true;
                    log::debug!("event stream read failed after {} lines: {}", self.stats.lines_read, e);
                    return Some(Err(e));
                }
            }

            let line = self.line.trim();
            if line.is_empty() {
                if let Some(message) = self.flush() {
                    return Some(Ok(message));
                }
            } else if line.starts_with(':') {
                self.stats.comments_dropped += 1;
            } else if let Some(data) = line.strip_prefix("data:") {
                self.buffer.push(data.trim_start().to_string());
            } else {
                self.buffer.push(line.to_string());
            }
        }
    }
}
