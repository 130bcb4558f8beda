//! Incremental Frame Scanner
//!
//! A connection receives a frame in pieces. Running the parser from byte 0
//! after every read would walk the same bytes again and again, so the
//! connection first asks a [`FrameScanner`] whether the buffer holds enough
//! to be worth parsing.
//!
//! The scanner only follows framing: type prefixes, line terminators, bulk
//! lengths and array counts. It keeps its position between calls, so every
//! byte is looked at once. As soon as it sees the end of a frame, or
//! anything the parser would reject, it reports the buffer as ready and the
//! parser produces the value or the exact error.

use crate::protocol::cursor::find_crlf;
use crate::protocol::parser::{
    integer_line, length_line, MAX_BULK_SIZE, MAX_LINE_LENGTH, MAX_NESTING_DEPTH,
};
use crate::protocol::types::{prefix, CRLF};

/// Outcome of scanning one token.
enum Step {
    /// A complete scalar, null or empty array
    Value,
    /// An array header announcing this many elements
    OpenArray(i64),
    NeedMore,
    /// The parser will reject what is buffered
    Invalid,
}

/// Tracks how far the front frame of a growing buffer has been scanned.
///
/// The buffer passed to [`frame_ready`](Self::frame_ready) must keep its
/// prefix between calls. The scanner resets itself each time it reports a
/// frame as ready.
#[derive(Debug, Clone)]
pub struct FrameScanner {
    /// Start of the first token not yet scanned
    offset: usize,

    /// Elements still expected by each open array, innermost last
    open_arrays: Vec<i64>,

    /// Where the search for the current token's CRLF resumes
    line_scanned: usize,

    max_depth: usize,
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScanner {
    pub fn new() -> Self {
        Self::with_max_depth(MAX_NESTING_DEPTH)
    }

    /// Creates a scanner matching a parser with a custom nesting limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            offset: 0,
            open_arrays: Vec::new(),
            line_scanned: 0,
            max_depth,
        }
    }

    /// Returns true once the front of `buf` is a complete frame or is
    /// malformed, i.e. when the parser will not answer "incomplete".
    pub fn frame_ready(&mut self, buf: &[u8]) -> bool {
        loop {
            match self.step(buf) {
                Step::NeedMore => return false,
                Step::Invalid => break,
                Step::Value => {
                    if self.close_value() {
                        break;
                    }
                }
                Step::OpenArray(count) => self.open_arrays.push(count),
            }
        }

        self.reset();
        true
    }

    /// Forgets all progress.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.open_arrays.clear();
        self.line_scanned = 0;
    }

    /// Scans the token at `offset`, advancing past it if it is complete.
    fn step(&mut self, buf: &[u8]) -> Step {
        let Some(&type_byte) = buf.get(self.offset) else {
            return Step::NeedMore;
        };

        if !matches!(
            type_byte,
            prefix::SIMPLE_STRING
                | prefix::ERROR
                | prefix::INTEGER
                | prefix::BULK_STRING
                | prefix::ARRAY
        ) {
            return Step::Invalid;
        }

        let line_start = self.offset + 1;
        let from = self.line_scanned.max(line_start);
        let line_end = match find_crlf(&buf[from..]) {
            Some(i) => from + i,
            None if buf.len() - line_start >= MAX_LINE_LENGTH + CRLF.len() => {
                return Step::Invalid
            }
            None => {
                // A trailing CR may still pair with the next byte
                self.line_scanned = buf.len().saturating_sub(1).max(line_start);
                return Step::NeedMore;
            }
        };

        if line_end - line_start > MAX_LINE_LENGTH {
            return Step::Invalid;
        }

        let line = &buf[line_start..line_end];
        let next = line_end + CRLF.len();

        match type_byte {
            prefix::SIMPLE_STRING | prefix::ERROR => {
                if std::str::from_utf8(line).is_err() {
                    return Step::Invalid;
                }
                self.advance(next);
                Step::Value
            }
            prefix::INTEGER => {
                if integer_line(line).is_err() {
                    return Step::Invalid;
                }
                self.advance(next);
                Step::Value
            }
            prefix::BULK_STRING => match length_line(line) {
                Ok(-1) => {
                    self.advance(next);
                    Step::Value
                }
                Ok(length) if length >= 0 => self.bulk_payload(buf, line_end, next, length),
                _ => Step::Invalid,
            },
            prefix::ARRAY => match length_line(line) {
                Ok(-1) => {
                    self.advance(next);
                    Step::Value
                }
                Ok(_) if self.open_arrays.len() >= self.max_depth => Step::Invalid,
                Ok(0) => {
                    self.advance(next);
                    Step::Value
                }
                Ok(count) if count > 0 => {
                    self.advance(next);
                    Step::OpenArray(count)
                }
                _ => Step::Invalid,
            },
            _ => Step::Invalid,
        }
    }

    /// Checks the payload and terminator of a bulk string whose length line
    /// ends at `line_end`.
    fn bulk_payload(&mut self, buf: &[u8], line_end: usize, start: usize, length: i64) -> Step {
        let length = usize::try_from(length).unwrap_or(usize::MAX);
        if length > MAX_BULK_SIZE {
            return Step::Invalid;
        }

        let end = start + length;
        let Some(terminator) = buf.get(end..end + CRLF.len()) else {
            // The length line is known; resume at its CRLF
            self.line_scanned = line_end;
            return Step::NeedMore;
        };

        if terminator != CRLF {
            return Step::Invalid;
        }

        self.advance(end + CRLF.len());
        Step::Value
    }

    /// Counts a finished value against the enclosing arrays.
    ///
    /// Returns true when it completes the top-level frame.
    fn close_value(&mut self) -> bool {
        while let Some(remaining) = self.open_arrays.last_mut() {
            *remaining -= 1;
            if *remaining > 0 {
                return false;
            }
            self.open_arrays.pop();
        }
        true
    }

    fn advance(&mut self, offset: usize) {
        self.offset = offset;
        self.line_scanned = 0;
    }
}
