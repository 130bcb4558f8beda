//! Connection-level commands: `PING`, `ECHO`.

use super::error::{CommandError, CommandResult};
use crate::protocol::RespValue;
use crate::storage::StorageEngine;
use bytes::Bytes;

/// PING
///
/// Always replies `+PONG`; extra arguments are ignored.
pub fn cmd_ping(_storage: &StorageEngine, _args: &[Bytes]) -> CommandResult {
    Ok(RespValue::pong())
}

/// ECHO message
pub fn cmd_echo(_storage: &StorageEngine, args: &[Bytes]) -> CommandResult {
    match args {
        [_, message] => Ok(RespValue::bulk_string(message.clone())),
        [_] => Err(CommandError::MissingArgument("ECHO")),
        _ => Err(CommandError::WrongArity("ECHO")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<Bytes> {
        items.iter().map(|s| Bytes::from(s.to_string())).collect()
    }

    #[test]
    fn test_ping_ignores_arguments() {
        let storage = StorageEngine::new();
        assert_eq!(cmd_ping(&storage, &args(&["PING"])), Ok(RespValue::pong()));
        assert_eq!(
            cmd_ping(&storage, &args(&["PING", "hello", "world"])),
            Ok(RespValue::pong())
        );
    }

    #[test]
    fn test_echo() {
        let storage = StorageEngine::new();
        assert_eq!(
            cmd_echo(&storage, &args(&["ECHO", "hey"])),
            Ok(RespValue::bulk_string(Bytes::from("hey")))
        );
        assert_eq!(
            cmd_echo(&storage, &args(&["ECHO", ""])),
            Ok(RespValue::bulk_string(Bytes::new()))
        );
        assert_eq!(
            cmd_echo(&storage, &args(&["ECHO"])),
            Err(CommandError::MissingArgument("ECHO"))
        );
        assert_eq!(
            cmd_echo(&storage, &args(&["ECHO", "a", "b"])),
            Err(CommandError::WrongArity("ECHO"))
        );
    }
}
