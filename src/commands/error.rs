//! Command-layer errors.

use crate::protocol::{ParseError, RespValue};
use thiserror::Error;

/// A well-formed frame that is not a valid command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Not an array of bulk strings, or an unknown command name
    #[error("invalid command")]
    InvalidCommand,

    #[error("missing argument for '{0}'")]
    MissingArgument(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("wrong number of arguments for '{0}'")]
    WrongArity(&'static str),
}

/// Result type returned by command implementations.
pub type CommandResult = Result<RespValue, CommandError>;

/// Anything that can go wrong turning raw bytes into a reply.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecuteError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    #[error("command error: {0}")]
    Command(#[from] CommandError),
}

impl ExecuteError {
    /// Renders the error as a RESP simple error for the client.
    pub fn to_resp(&self) -> RespValue {
        match self {
            ExecuteError::Protocol(e) => RespValue::error(format!("ERR Protocol error: {}", e)),
            ExecuteError::Command(e) => RespValue::error(format!("ERR {}", e)),
        }
    }
}
