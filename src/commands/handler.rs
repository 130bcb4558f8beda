//! Command Dispatcher
//!
//! Validates a decoded request and routes it to its command.
//!
//! A request must be a present array whose elements are all present bulk
//! strings. Element 0 names the command (matched case-insensitively) and the
//! whole array, name included, is handed to the command.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │   parse()   │───>│ dispatch()  │───>│ serialize() │     │
//! │  └─────────────┘    └──────┬──────┘    └─────────────┘     │
//! │                            │                                │
//! │                            ▼                                │
//! │               CommandRegistry ──> StorageEngine             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use super::error::{CommandError, CommandResult, ExecuteError};
use super::registry::CommandRegistry;
use crate::protocol::{parse, RespValue};
use crate::storage::StorageEngine;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, trace};

/// Executes commands against a shared storage engine.
#[derive(Clone)]
pub struct CommandHandler {
    storage: Arc<StorageEngine>,
    registry: &'static CommandRegistry,
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("storage", &self.storage)
            .finish()
    }
}

impl CommandHandler {
    /// Creates a new command handler with the given storage engine.
    pub fn new(storage: Arc<StorageEngine>) -> Self {
        Self {
            storage,
            registry: CommandRegistry::global(),
        }
    }

    /// The storage engine commands run against.
    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    /// Parses one frame from `raw`, runs it and returns the encoded reply.
    ///
    /// Bytes after the first frame are ignored; connections that need
    /// pipelining go through [`RespParser`](crate::protocol::RespParser) and
    /// [`dispatch`](Self::dispatch) instead.
    ///
    /// # Example
    ///
    /// ```
    /// use resplite::commands::CommandHandler;
    /// use resplite::storage::StorageEngine;
    /// use std::sync::Arc;
    ///
    /// let handler = CommandHandler::new(Arc::new(StorageEngine::new()));
    /// let reply = handler.execute(b"*1\r\n$4\r\nPING\r\n").unwrap();
    /// assert_eq!(reply, b"+PONG\r\n");
    /// ```
    pub fn execute(&self, raw: &[u8]) -> Result<Vec<u8>, ExecuteError> {
        let (command, rest) = parse(raw)?;
        if !rest.is_empty() {
            trace!(ignored = rest.len(), "Ignoring bytes after the first frame");
        }

        let response = self.dispatch(command)?;
        Ok(response.serialize())
    }

    /// Runs an already decoded request.
    pub fn dispatch(&self, command: RespValue) -> CommandResult {
        let args = command_arguments(command)?;

        let name = std::str::from_utf8(&args[0]).map_err(|_| CommandError::InvalidCommand)?;
        let Some(command_fn) = self.registry.get(name) else {
            debug!(command = %name, "Unknown command");
            return Err(CommandError::InvalidCommand);
        };

        trace!(command = %name, argc = args.len(), "Dispatching command");
        command_fn(&self.storage, &args)
    }
}

/// Unpacks a request into its bulk string arguments.
fn command_arguments(command: RespValue) -> Result<Vec<Bytes>, CommandError> {
    let elements = command.into_array().ok_or(CommandError::InvalidCommand)?;
    if elements.is_empty() {
        return Err(CommandError::InvalidCommand);
    }

    elements
        .into_iter()
        .map(|element| match element {
            RespValue::BulkString(Some(arg)) => Ok(arg),
            _ => Err(CommandError::InvalidCommand),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ParseError;
    use std::time::Duration;

    fn create_handler() -> CommandHandler {
        let storage = Arc::new(StorageEngine::new());
        CommandHandler::new(storage)
    }

    fn make_command(args: &[&str]) -> RespValue {
        RespValue::array(
            args.iter()
                .map(|s| RespValue::bulk_string(Bytes::from(s.to_string())))
                .collect(),
        )
    }

    #[test]
    fn test_ping() {
        let handler = create_handler();
        assert_eq!(
            handler.execute(b"*1\r\n$4\r\nPING\r\n").unwrap(),
            b"+PONG\r\n"
        );
    }

    #[test]
    fn test_echo() {
        let handler = create_handler();
        assert_eq!(
            handler
                .execute(b"*2\r\n$4\r\nECHO\r\n$3\r\nhey\r\n")
                .unwrap(),
            b"$3\r\nhey\r\n"
        );
    }

    #[test]
    fn test_set_get() {
        let handler = create_handler();

        let response = handler
            .execute(b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n")
            .unwrap();
        assert_eq!(response, b"+OK\r\n");

        let response = handler
            .execute(b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n")
            .unwrap();
        assert_eq!(response, b"$3\r\nbar\r\n");
    }

    #[test]
    fn test_set_px_expires() {
        let handler = create_handler();

        let response = handler.dispatch(make_command(&["SET", "foo", "bar", "PX", "100"]));
        assert_eq!(response, Ok(RespValue::ok()));

        std::thread::sleep(Duration::from_millis(150));

        assert_eq!(
            handler
                .execute(b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n")
                .unwrap(),
            b"$-1\r\n"
        );
    }

    #[test]
    fn test_get_missing_key() {
        let handler = create_handler();
        assert_eq!(
            handler
                .execute(b"*2\r\n$3\r\nGET\r\n$10\r\nmissingkey\r\n")
                .unwrap(),
            b"$-1\r\n"
        );
    }

    #[test]
    fn test_unknown_command() {
        let handler = create_handler();
        assert_eq!(
            handler.execute(b"*2\r\n$3\r\nfoo\r\n$5\r\nhello\r\n"),
            Err(ExecuteError::Command(CommandError::InvalidCommand))
        );
    }

    #[test]
    fn test_command_name_is_case_insensitive() {
        let handler = create_handler();
        assert_eq!(handler.dispatch(make_command(&["ping"])), Ok(RespValue::pong()));
        assert_eq!(
            handler.dispatch(make_command(&["eChO", "x"])),
            Ok(RespValue::bulk_string(Bytes::from("x")))
        );
    }

    #[test]
    fn test_request_shape_is_validated() {
        let handler = create_handler();

        let invalid = [
            // Not an array
            RespValue::bulk_string(Bytes::from("PING")),
            RespValue::simple_string("PING"),
            // Null and empty arrays
            RespValue::null_array(),
            RespValue::array(vec![]),
            // Name is not a present bulk string
            RespValue::array(vec![RespValue::simple_string("PING")]),
            RespValue::array(vec![RespValue::null()]),
            RespValue::array(vec![RespValue::integer(1)]),
            // An argument is not a present bulk string
            RespValue::array(vec![
                RespValue::bulk_string(Bytes::from("ECHO")),
                RespValue::integer(5),
            ]),
            RespValue::array(vec![
                RespValue::bulk_string(Bytes::from("GET")),
                RespValue::array(vec![]),
            ]),
        ];

        for command in invalid {
            assert_eq!(
                handler.dispatch(command.clone()),
                Err(CommandError::InvalidCommand),
                "accepted {:?}",
                command
            );
        }
    }

    #[test]
    fn test_non_utf8_command_name() {
        let handler = create_handler();
        let command = RespValue::array(vec![RespValue::bulk_string(Bytes::from(&b"\xff\xfe"[..]))]);
        assert_eq!(handler.dispatch(command), Err(CommandError::InvalidCommand));
    }

    #[test]
    fn test_argument_errors_surface() {
        let handler = create_handler();
        assert_eq!(
            handler.execute(b"*1\r\n$4\r\nECHO\r\n"),
            Err(ExecuteError::Command(CommandError::MissingArgument("ECHO")))
        );
        assert!(matches!(
            handler.dispatch(make_command(&["SET", "k", "v", "PX", "abc"])),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_protocol_errors_surface() {
        let handler = create_handler();
        assert_eq!(
            handler.execute(b"@PING\r\n"),
            Err(ExecuteError::Protocol(ParseError::UnknownPrefix(b'@')))
        );
        assert!(matches!(
            handler.execute(b"*2\r\n$3\r\nGET\r\n"),
            Err(ExecuteError::Protocol(ParseError::Element { index: 1, .. }))
        ));
    }

    #[test]
    fn test_error_reply_with_line_break_is_one_frame() {
        let handler = create_handler();
        let err = handler
            .execute(b"*4\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$6\r\nX\r\n+OK\r\n")
            .unwrap_err();

        let wire = err.to_resp().serialize();
        assert_eq!(
            wire,
            b"-ERR invalid argument: unsupported SET option 'X  +OK'\r\n"
        );

        let (reply, rest) = parse(&wire).unwrap();
        assert!(reply.is_error());
        assert!(rest.is_empty());
    }

    #[test]
    fn test_trailing_frames_ignored() {
        let handler = create_handler();
        let reply = handler
            .execute(b"*1\r\n$4\r\nPING\r\n*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n")
            .unwrap();
        assert_eq!(reply, b"+PONG\r\n");
        assert!(handler.storage().is_empty());
    }

    #[test]
    fn test_binary_values_survive() {
        let handler = create_handler();
        let value = Bytes::from(&b"a\r\n\x00b"[..]);
        let set = RespValue::array(vec![
            RespValue::bulk_string(Bytes::from("SET")),
            RespValue::bulk_string(Bytes::from("bin")),
            RespValue::bulk_string(value.clone()),
        ]);
        handler.dispatch(set).unwrap();

        assert_eq!(
            handler.dispatch(make_command(&["GET", "bin"])),
            Ok(RespValue::bulk_string(value))
        );
    }
}
