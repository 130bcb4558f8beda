//! String commands: `SET`, `GET`.

use super::error::{CommandError, CommandResult};
use crate::protocol::RespValue;
use crate::storage::StorageEngine;
use bytes::Bytes;
use std::time::Duration;

/// SET key value [PX milliseconds]
///
/// Without `PX` the store's default TTL applies.
pub fn cmd_set(storage: &StorageEngine, args: &[Bytes]) -> CommandResult {
    let (key, value, options) = match args {
        [_, key, value, options @ ..] => (key, value, options),
        _ => return Err(CommandError::MissingArgument("SET")),
    };

    let ttl = parse_set_options(options)?;
    storage.set(key.clone(), value.clone(), ttl);

    Ok(RespValue::ok())
}

/// GET key
pub fn cmd_get(storage: &StorageEngine, args: &[Bytes]) -> CommandResult {
    match args {
        [_, key] => Ok(match storage.get(key) {
            Some(value) => RespValue::bulk_string(value),
            None => RespValue::null(),
        }),
        [_] => Err(CommandError::MissingArgument("GET")),
        _ => Err(CommandError::WrongArity("GET")),
    }
}

/// Parses the optional `PX <ms>` tail of SET.
fn parse_set_options(options: &[Bytes]) -> Result<Option<Duration>, CommandError> {
    match options {
        [] => Ok(None),
        [flag, ms] if flag.eq_ignore_ascii_case(b"PX") => {
            let ms = parse_integer(ms)?;
            if ms <= 0 {
                return Err(CommandError::InvalidArgument(format!(
                    "PX must be positive, got {}",
                    ms
                )));
            }
            Ok(Some(Duration::from_millis(ms as u64)))
        }
        [flag] if flag.eq_ignore_ascii_case(b"PX") => Err(CommandError::InvalidArgument(
            "PX requires a value".to_string(),
        )),
        [flag, _, extra, ..] if flag.eq_ignore_ascii_case(b"PX") => Err(unsupported_option(extra)),
        [flag, ..] => Err(unsupported_option(flag)),
    }
}

fn unsupported_option(option: &Bytes) -> CommandError {
    CommandError::InvalidArgument(format!(
        "unsupported SET option '{}'",
        String::from_utf8_lossy(option)
    ))
}

fn parse_integer(raw: &Bytes) -> Result<i64, CommandError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            CommandError::InvalidArgument(format!(
                "'{}' is not an integer",
                String::from_utf8_lossy(raw)
            ))
        })
}
