//! RESP Protocol Parser
//!
//! This module turns bytes into [`RespValue`]s. It offers two entry points
//! over the same recursive decoder:
//!
//! - [`parse`] consumes exactly one frame from the front of a buffer and
//!   returns the value together with the trailing bytes. Any failure,
//!   including a frame that is cut short, is an error.
//! - [`RespParser::parse_frame`] is the streaming form used by connections.
//!   It reports a frame that is cut short as `Ok(None)` so the caller can
//!   read more bytes, and only real protocol violations as `Err`.
//!
//! ## Strictness
//!
//! Length and count lines accept only `-1` or ASCII digits. Integer payloads
//! accept an optional single leading sign. A bulk string must be followed by
//! CRLF exactly `length` bytes after its length line. One malformed frame
//! anywhere aborts the whole parse; nothing is partially returned.

use crate::protocol::cursor::Cursor;
use crate::protocol::types::{prefix, RespValue};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur during RESP parsing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// The buffer ends before the frame does
    #[error("incomplete frame")]
    Incomplete,

    /// Unknown type prefix byte
    #[error("unknown type prefix: {0:#04x}")]
    UnknownPrefix(u8),

    /// Malformed integer, length or count
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in a simple string or error message
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative (but not -1 for null)
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array length is negative (but not -1 for null)
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// The bulk string payload is not followed by CRLF at the declared length
    #[error("bulk string length mismatch: no CRLF after {expected} bytes")]
    LengthMismatch { expected: usize },

    /// The message exceeds maximum allowed size
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Arrays nested deeper than the parser allows
    #[error("maximum nesting depth exceeded: {0}")]
    NestingTooDeep(usize),

    /// A simple string, error, integer or length line without CRLF in reach
    #[error("line too long (max {max} bytes)")]
    LineTooLong { max: usize },

    /// An array element failed to parse
    #[error("array element {index}: {source}")]
    Element {
        index: usize,
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Returns true if more input could complete the frame.
    ///
    /// Every other error is a protocol violation that no amount of extra
    /// input can fix.
    pub fn is_incomplete(&self) -> bool {
        match self {
            ParseError::Incomplete => true,
            ParseError::Element { source, .. } => source.is_incomplete(),
            _ => false,
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum array nesting depth (prevent stack overflow)
pub const MAX_NESTING_DEPTH: usize = 32;

/// Maximum length of a simple string, error, integer or length line,
/// excluding the CRLF
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Upper bound on the capacity reserved up front for an array.
const MAX_PREALLOCATED_ELEMENTS: usize = 1024;

/// Parses exactly one frame from the front of `buf`.
///
/// Returns the decoded value and the bytes that follow the frame, so that
/// pipelined frames can be parsed one after another.
///
/// # Example
///
/// ```
/// use resplite::protocol::{parse, RespValue};
///
/// let (value, rest) = parse(b"+OK\r\n:1\r\n").unwrap();
/// assert_eq!(value, RespValue::ok());
/// assert_eq!(rest, b":1\r\n");
/// ```
pub fn parse(buf: &[u8]) -> ParseResult<(RespValue, &[u8])> {
    let mut cursor = Cursor::new(buf);
    let value = parse_value(&mut cursor, 0, MAX_NESTING_DEPTH)?;
    Ok((value, cursor.remaining()))
}

/// A streaming RESP parser.
///
/// # Example
///
/// ```
/// use resplite::protocol::RespParser;
///
/// let parser = RespParser::new();
///
/// // Half a frame: wait for more input
/// assert_eq!(parser.parse_frame(b"*1\r\n$4\r\nPI").unwrap(), None);
///
/// let (_, consumed) = parser.parse_frame(b"*1\r\n$4\r\nPING\r\n").unwrap().unwrap();
/// assert_eq!(consumed, 14);
/// ```
#[derive(Debug, Clone)]
pub struct RespParser {
    max_depth: usize,
}

impl Default for RespParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RespParser {
    /// Creates a new parser instance.
    pub fn new() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
        }
    }

    /// Creates a parser with a custom array nesting limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Attempts to parse one frame from the front of the buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some((value, consumed)))` - a complete frame of `consumed` bytes
    /// - `Ok(None)` - the frame is not complete yet
    /// - `Err(e)` - the bytes can never form a valid frame
    pub fn parse_frame(&self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let mut cursor = Cursor::new(buf);
        match parse_value(&mut cursor, 0, self.max_depth) {
            Ok(value) => Ok(Some((value, cursor.position()))),
            Err(e) if e.is_incomplete() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Dispatches on the prefix byte.
fn parse_value(cursor: &mut Cursor<'_>, depth: usize, max_depth: usize) -> ParseResult<RespValue> {
    match cursor.read_byte()? {
        prefix::SIMPLE_STRING => Ok(RespValue::SimpleString(read_text(cursor)?)),
        prefix::ERROR => Ok(RespValue::Error(read_text(cursor)?)),
        prefix::INTEGER => parse_integer(cursor),
        prefix::BULK_STRING => parse_bulk_string(cursor),
        prefix::ARRAY => parse_array(cursor, depth, max_depth),
        other => Err(ParseError::UnknownPrefix(other)),
    }
}

/// Reads a CRLF-terminated UTF-8 line.
fn read_text(cursor: &mut Cursor<'_>) -> ParseResult<String> {
    let line = cursor.read_line()?;
    std::str::from_utf8(line)
        .map(str::to_string)
        .map_err(|e| ParseError::InvalidUtf8(e.to_string()))
}

/// Parses an integer: `:<integer>\r\n`
fn parse_integer(cursor: &mut Cursor<'_>) -> ParseResult<RespValue> {
    integer_line(cursor.read_line()?).map(RespValue::Integer)
}

/// Parses the payload of an integer line.
pub(crate) fn integer_line(line: &[u8]) -> ParseResult<i64> {
    let text = std::str::from_utf8(line).map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
    text.parse::<i64>()
        .map_err(|e| ParseError::InvalidInteger(format!("{:?}: {}", text, e)))
}

/// Parses a bulk string: `$<length>\r\n<data>\r\n`
fn parse_bulk_string(cursor: &mut Cursor<'_>) -> ParseResult<RespValue> {
    let length = read_length(cursor)?;

    if length == -1 {
        return Ok(RespValue::BulkString(None));
    }
    if length < 0 {
        return Err(ParseError::InvalidBulkLength(length));
    }

    let length = usize::try_from(length).unwrap_or(usize::MAX);
    if length > MAX_BULK_SIZE {
        return Err(ParseError::MessageTooLarge {
            size: length,
            max: MAX_BULK_SIZE,
        });
    }

    let data = cursor.read_exact(length)?;
    cursor.expect_crlf(|| ParseError::LengthMismatch { expected: length })?;

    Ok(RespValue::BulkString(Some(Bytes::copy_from_slice(data))))
}

/// Parses an array: `*<count>\r\n<elements...>`
fn parse_array(cursor: &mut Cursor<'_>, depth: usize, max_depth: usize) -> ParseResult<RespValue> {
    let count = read_length(cursor)?;

    if count == -1 {
        return Ok(RespValue::Array(None));
    }
    if count < 0 {
        return Err(ParseError::InvalidArrayLength(count));
    }
    if depth >= max_depth {
        return Err(ParseError::NestingTooDeep(max_depth));
    }

    let count = count as usize;
    let mut elements = Vec::with_capacity(count.min(MAX_PREALLOCATED_ELEMENTS));

    for index in 0..count {
        let element = parse_value(cursor, depth + 1, max_depth).map_err(|e| ParseError::Element {
            index,
            source: Box::new(e),
        })?;
        elements.push(element);
    }

    Ok(RespValue::Array(Some(elements)))
}

/// Reads a length or count line: `-1` or ASCII digits only.
fn read_length(cursor: &mut Cursor<'_>) -> ParseResult<i64> {
    length_line(cursor.read_line()?)
}

/// Parses the payload of a length or count line.
pub(crate) fn length_line(line: &[u8]) -> ParseResult<i64> {
    let digits = line.strip_prefix(b"-").unwrap_or(line);

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(ParseError::InvalidInteger(
            String::from_utf8_lossy(line).into_owned(),
        ));
    }

    // Only ASCII remains, so the conversion cannot fail; overflow still can.
    let text = String::from_utf8_lossy(line);
    text.parse::<i64>()
        .map_err(|e| ParseError::InvalidInteger(format!("{:?}: {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_complete(input: &[u8]) -> RespValue {
        let (value, rest) = parse(input).unwrap();
        assert!(rest.is_empty(), "unexpected trailing bytes: {:?}", rest);
        value
    }

    #[test]
    fn test_parse_simple_string() {
        assert_eq!(parse_complete(b"+OK\r\n"), RespValue::simple_string("OK"));
    }

    #[test]
    fn test_parse_empty_simple_string() {
        assert_eq!(parse_complete(b"+\r\n"), RespValue::simple_string(""));
    }

    #[test]
    fn test_parse_simple_string_without_crlf() {
        assert_eq!(parse(b"+hello"), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_parse_error() {
        assert_eq!(
            parse_complete(b"-ERR unknown command\r\n"),
            RespValue::error("ERR unknown command")
        );
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_complete(b":1000\r\n"), RespValue::Integer(1000));
        assert_eq!(parse_complete(b":-42\r\n"), RespValue::Integer(-42));
        assert_eq!(parse_complete(b":+7\r\n"), RespValue::Integer(7));
    }

    #[test]
    fn test_parse_invalid_integer() {
        for input in [
            &b":abc\r\n"[..],
            b":\r\n",
            b":--5\r\n",
            b":+-5\r\n",
            b":-\r\n",
            b":1 2\r\n",
        ] {
            assert!(
                matches!(parse(input), Err(ParseError::InvalidInteger(_))),
                "accepted {:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_parse_bulk_string() {
        assert_eq!(
            parse_complete(b"$5\r\nhello\r\n"),
            RespValue::bulk_string(Bytes::from("hello"))
        );
    }

    #[test]
    fn test_parse_null_bulk_string() {
        let (value, rest) = parse(b"$-1\r\n+OK\r\n").unwrap();
        assert_eq!(value, RespValue::null());
        assert_eq!(rest, b"+OK\r\n");
    }

    #[test]
    fn test_parse_empty_bulk_string() {
        assert_eq!(
            parse_complete(b"$0\r\n\r\n"),
            RespValue::bulk_string(Bytes::new())
        );
    }

    #[test]
    fn test_parse_bulk_string_shorter_than_declared() {
        let err = parse(b"$5\r\nhi\r\n").unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn test_parse_bulk_string_longer_than_declared() {
        assert_eq!(
            parse(b"$1\r\nhi\r\n"),
            Err(ParseError::LengthMismatch { expected: 1 })
        );
    }

    #[test]
    fn test_parse_bulk_string_strict_length() {
        assert!(matches!(
            parse(b"$+5\r\nhello\r\n"),
            Err(ParseError::InvalidInteger(_))
        ));
        assert!(matches!(
            parse(b"$ 5\r\nhello\r\n"),
            Err(ParseError::InvalidInteger(_))
        ));
        assert_eq!(
            parse(b"$-2\r\n"),
            Err(ParseError::InvalidBulkLength(-2))
        );
    }

    #[test]
    fn test_parse_bulk_string_too_large() {
        assert!(matches!(
            parse(b"$999999999999\r\n"),
            Err(ParseError::MessageTooLarge { .. })
        ));
    }

    #[test]
    fn test_binary_safe_bulk_string() {
        assert_eq!(
            parse_complete(b"$7\r\nhe\r\n\x00lo\r\n"),
            RespValue::bulk_string(Bytes::from(&b"he\r\n\x00lo"[..]))
        );
    }

    #[test]
    fn test_parse_array() {
        assert_eq!(
            parse_complete(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n"),
            RespValue::array(vec![
                RespValue::bulk_string(Bytes::from("GET")),
                RespValue::bulk_string(Bytes::from("name")),
            ])
        );
    }

    #[test]
    fn test_parse_null_and_empty_array() {
        assert_eq!(parse_complete(b"*-1\r\n"), RespValue::null_array());
        assert_eq!(parse_complete(b"*0\r\n"), RespValue::array(vec![]));
        assert_eq!(parse(b"*-3\r\n"), Err(ParseError::InvalidArrayLength(-3)));
    }

    #[test]
    fn test_parse_nested_array() {
        assert_eq!(
            parse_complete(b"*2\r\n:1\r\n*2\r\n:2\r\n*-1\r\n"),
            RespValue::array(vec![
                RespValue::Integer(1),
                RespValue::array(vec![RespValue::Integer(2), RespValue::null_array()]),
            ])
        );
    }

    #[test]
    fn test_parse_mixed_array() {
        assert_eq!(
            parse_complete(b"*4\r\n+OK\r\n:100\r\n$5\r\nhello\r\n$-1\r\n"),
            RespValue::array(vec![
                RespValue::simple_string("OK"),
                RespValue::Integer(100),
                RespValue::bulk_string(Bytes::from("hello")),
                RespValue::null(),
            ])
        );
    }

    #[test]
    fn test_parse_truncated_array_names_element() {
        let err = parse(b"*2\r\n$1\r\na\r\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::Element {
                index: 1,
                source: Box::new(ParseError::Incomplete),
            }
        );
        assert_eq!(err.to_string(), "array element 1: incomplete frame");
    }

    #[test]
    fn test_parse_malformed_element_is_not_incomplete() {
        let err = parse(b"*2\r\n:1\r\n:x\r\n").unwrap_err();
        assert!(matches!(err, ParseError::Element { index: 1, .. }));
        assert!(!err.is_incomplete());
    }

    #[test]
    fn test_parse_unknown_prefix() {
        assert_eq!(parse(b"@oops\r\n"), Err(ParseError::UnknownPrefix(b'@')));
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(parse(b""), Err(ParseError::Incomplete));
    }

    #[test]
    fn test_parse_pipelined_frames() {
        let input = b"*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n";
        let (first, rest) = parse(input).unwrap();
        assert_eq!(
            first,
            RespValue::array(vec![RespValue::bulk_string(Bytes::from("PING"))])
        );
        let (second, rest) = parse(rest).unwrap();
        assert_eq!(second.as_array().map(|a| a.len()), Some(2));
        assert!(rest.is_empty());
    }

    #[test]
    fn test_nesting_limit() {
        let parser = RespParser::with_max_depth(2);
        assert!(parser.parse_frame(b"*1\r\n*1\r\n:1\r\n").unwrap().is_some());

        let err = parser.parse_frame(b"*1\r\n*1\r\n*1\r\n:1\r\n").unwrap_err();
        assert!(!err.is_incomplete());
    }

    #[test]
    fn test_streaming_incomplete() {
        let parser = RespParser::new();
        let full = b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n";

        // Every strict prefix is incomplete, never an error
        for end in 0..full.len() {
            assert_eq!(parser.parse_frame(&full[..end]).unwrap(), None, "prefix {}", end);
        }

        let (_, consumed) = parser.parse_frame(full).unwrap().unwrap();
        assert_eq!(consumed, full.len());
    }

    #[test]
    fn test_unterminated_line_is_bounded() {
        let parser = RespParser::new();

        let mut input = vec![b'+'];
        input.resize(1 + MAX_LINE_LENGTH + 1, b'a');
        assert_eq!(parser.parse_frame(&input).unwrap(), None);

        input.push(b'a');
        assert_eq!(
            parser.parse_frame(&input),
            Err(ParseError::LineTooLong {
                max: MAX_LINE_LENGTH
            })
        );

        // Length lines inside arrays are capped the same way
        let mut nested = b"*1\r\n$".to_vec();
        nested.resize(nested.len() + MAX_LINE_LENGTH + 2, b'0');
        let err = parser.parse_frame(&nested).unwrap_err();
        assert!(!err.is_incomplete());
    }

    #[test]
    fn test_streaming_reports_violations() {
        let parser = RespParser::new();
        assert!(parser.parse_frame(b"?\r\n").is_err());
        assert!(parser.parse_frame(b"$2\r\nabcd\r\n").is_err());
    }

    #[test]
    fn test_roundtrip() {
        let values = vec![
            RespValue::simple_string("OK"),
            RespValue::error("ERR boom"),
            RespValue::integer(i64::MIN),
            RespValue::integer(i64::MAX),
            RespValue::bulk_string(Bytes::from("value")),
            RespValue::bulk_string(Bytes::new()),
            RespValue::null(),
            RespValue::array(vec![]),
            RespValue::null_array(),
            RespValue::array(vec![
                RespValue::bulk_string(Bytes::from("SET")),
                RespValue::array(vec![RespValue::null(), RespValue::array(vec![])]),
                RespValue::null_array(),
            ]),
        ];

        for original in values {
            let serialized = original.serialize();
            let (parsed, rest) = parse(&serialized).unwrap();
            assert_eq!(parsed, original);
            assert!(rest.is_empty());
        }
    }
}
