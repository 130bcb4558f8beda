//! Byte Cursor for RESP Parsing
//!
//! A position-tracking reader over a borrowed buffer. Every frame type is
//! read through the same small set of operations, so CRLF handling lives in
//! exactly one place and the parser never rescans bytes it already consumed.
//!
//! Running out of input is always reported as [`ParseError::Incomplete`].
//! Callers decide whether that means "wait for more bytes" or "malformed".

use crate::protocol::parser::{ParseError, ParseResult, MAX_LINE_LENGTH};
use crate::protocol::types::CRLF;

/// A forward-only reader over a byte slice.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The unconsumed tail of the buffer.
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Returns true if every byte has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Looks at the next byte without consuming it.
    pub fn peek_byte(&self) -> ParseResult<u8> {
        self.buf.get(self.pos).copied().ok_or(ParseError::Incomplete)
    }

    /// Consumes one byte.
    pub fn read_byte(&mut self) -> ParseResult<u8> {
        let byte = self.peek_byte()?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads up to the next CRLF and consumes the terminator.
    ///
    /// The returned slice does not include the CRLF. A line longer than
    /// [`MAX_LINE_LENGTH`] is `LineTooLong`; only that many bytes are
    /// searched.
    pub fn read_line(&mut self) -> ParseResult<&'a [u8]> {
        let rest = self.remaining();
        let window = &rest[..rest.len().min(MAX_LINE_LENGTH + CRLF.len())];

        match find_crlf(window) {
            Some(end) => {
                self.pos += end + CRLF.len();
                Ok(&rest[..end])
            }
            None if window.len() == MAX_LINE_LENGTH + CRLF.len() => Err(ParseError::LineTooLong {
                max: MAX_LINE_LENGTH,
            }),
            None => Err(ParseError::Incomplete),
        }
    }

    /// Reads exactly `n` bytes.
    pub fn read_exact(&mut self, n: usize) -> ParseResult<&'a [u8]> {
        let rest = self.remaining();
        if rest.len() < n {
            return Err(ParseError::Incomplete);
        }
        self.pos += n;
        Ok(&rest[..n])
    }

    /// Consumes a CRLF terminator.
    ///
    /// Fewer than two bytes left is `Incomplete`; two bytes that are not CRLF
    /// is reported through `mismatch`.
    pub fn expect_crlf(&mut self, mismatch: impl FnOnce() -> ParseError) -> ParseResult<()> {
        let bytes = self.read_exact(CRLF.len())?;
        if bytes != CRLF {
            return Err(mismatch());
        }
        Ok(())
    }
}

/// Finds the offset of the first `\r\n` in `buf`.
#[inline]
pub(crate) fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_line() {
        let mut cursor = Cursor::new(b"hello\r\nworld\r\n");
        assert_eq!(cursor.read_line().unwrap(), b"hello");
        assert_eq!(cursor.position(), 7);
        assert_eq!(cursor.read_line().unwrap(), b"world");
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_read_line_without_terminator() {
        let mut cursor = Cursor::new(b"hello\r");
        assert_eq!(cursor.read_line(), Err(ParseError::Incomplete));
        // A failed read does not move the cursor
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_read_line_length_limit() {
        let mut longest = vec![b'a'; MAX_LINE_LENGTH];
        longest.extend_from_slice(b"\r\n");
        assert_eq!(Cursor::new(&longest).read_line().unwrap().len(), MAX_LINE_LENGTH);

        let mut too_long = vec![b'a'; MAX_LINE_LENGTH + 1];
        too_long.extend_from_slice(b"\r\n");
        assert_eq!(
            Cursor::new(&too_long).read_line(),
            Err(ParseError::LineTooLong {
                max: MAX_LINE_LENGTH
            })
        );

        // Short of the limit, a missing terminator may still arrive
        let partial = vec![b'a'; MAX_LINE_LENGTH + 1];
        assert_eq!(Cursor::new(&partial).read_line(), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_read_exact_and_remaining() {
        let mut cursor = Cursor::new(b"abcdef");
        assert_eq!(cursor.read_exact(4).unwrap(), b"abcd");
        assert_eq!(cursor.remaining(), b"ef");
        assert_eq!(cursor.read_exact(3), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_expect_crlf() {
        let mut cursor = Cursor::new(b"\r\nxy");
        assert!(cursor.expect_crlf(|| ParseError::Incomplete).is_ok());

        let mismatch = cursor.expect_crlf(|| ParseError::LengthMismatch { expected: 0 });
        assert_eq!(mismatch, Err(ParseError::LengthMismatch { expected: 0 }));
    }

    #[test]
    fn test_peek_and_read_byte() {
        let mut cursor = Cursor::new(b"+");
        assert_eq!(cursor.peek_byte().unwrap(), b'+');
        assert_eq!(cursor.read_byte().unwrap(), b'+');
        assert_eq!(cursor.peek_byte(), Err(ParseError::Incomplete));
    }
}
