//! Command Handler Module
//!
//! This module implements the command layer: it receives decoded RESP
//! requests, executes them against the storage engine and returns replies.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RESP Parser    │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  validate shape, look up name
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandRegistry │  PING, ECHO, SET, GET
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ StorageEngine   │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `PING` - replies `PONG`
//! - `ECHO message` - replies with `message`
//! - `SET key value [PX milliseconds]` - store a value
//! - `GET key` - fetch a value, or null

pub mod error;
pub mod handler;
pub mod registry;
pub mod server;
pub mod string;

pub use error::{CommandError, CommandResult, ExecuteError};
pub use handler::CommandHandler;
pub use registry::{CommandFn, CommandRegistry};
