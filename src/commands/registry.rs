//! Command registry
//!
//! Maps uppercase command names to their implementations. The registry is
//! built once per process and is read-only afterwards.

use super::error::CommandResult;
use super::{server, string};
use crate::storage::StorageEngine;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Signature shared by every command.
///
/// `args[0]` is the command name itself, so the first real argument is
/// `args[1]`.
pub type CommandFn = fn(&StorageEngine, &[Bytes]) -> CommandResult;

/// Registry of all available commands
#[derive(Debug)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandFn>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Creates a registry holding every supported command.
    pub fn new() -> Self {
        let mut registry = CommandRegistry {
            commands: HashMap::new(),
        };

        registry.register("PING", server::cmd_ping);
        registry.register("ECHO", server::cmd_echo);

        registry.register("SET", string::cmd_set);
        registry.register("GET", string::cmd_get);

        registry
    }

    /// The process-wide registry.
    pub fn global() -> &'static CommandRegistry {
        static REGISTRY: OnceLock<CommandRegistry> = OnceLock::new();
        REGISTRY.get_or_init(CommandRegistry::new)
    }

    fn register(&mut self, name: &'static str, command: CommandFn) {
        debug_assert_eq!(name, name.to_ascii_uppercase());
        self.commands.insert(name, command);
    }

    /// Looks up a command by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<CommandFn> {
        self.commands.get(name.to_ascii_uppercase().as_str()).copied()
    }
}
