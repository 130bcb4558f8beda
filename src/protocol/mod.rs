//! RESP Protocol Implementation
//!
//! This module implements the subset of the Redis Serialization Protocol
//! (RESP) spoken by the server: simple strings, errors, integers, bulk
//! strings and arrays.
//!
//! ## Modules
//!
//! - `types`: the `RespValue` enum and its serializer
//! - `cursor`: position-tracking reader shared by every frame type
//! - `parser`: one-shot and streaming parsers
//! - `scanner`: incremental frame boundary detection for connections
//!
//! ## Example
//!
//! ```
//! use resplite::protocol::{parse, RespValue};
//! use bytes::Bytes;
//!
//! let (value, rest) = parse(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n").unwrap();
//! assert!(rest.is_empty());
//! assert_eq!(value.as_array().map(|a| a.len()), Some(2));
//!
//! let response = RespValue::bulk_string(Bytes::from("Ariz"));
//! assert_eq!(response.serialize(), b"$4\r\nAriz\r\n");
//! ```

pub mod cursor;
pub mod parser;
pub mod scanner;
pub mod types;

pub use cursor::Cursor;
pub use parser::{parse, ParseError, ParseResult, RespParser};
pub use scanner::FrameScanner;
pub use types::RespValue;
