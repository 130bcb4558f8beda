//! # resplite - A Minimal RESP Key-Value Server
//!
//! resplite speaks the Redis Serialization Protocol (RESP) over TCP and
//! serves four commands from an in-memory store with per-key expiry.
//!
//! ## Features
//!
//! - **RESP codec**: strict parsing of all five RESP types, with null and
//!   empty bulk strings and arrays kept distinct
//! - **Streaming frames**: partial frames are buffered, pipelined frames are
//!   answered in order
//! - **TTL Support**: `SET ... PX ms` expiry, reclaimed lazily on read and by
//!   a background sweeper
//! - **Async I/O**: one Tokio task per connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              resplite                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │   Server    │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                            ▼                  ▼                         │
//! │                     ┌─────────────┐    ┌─────────────────────────────┐  │
//! │                     │   RESP      │    │       StorageEngine         │  │
//! │                     │   Parser    │    │  RwLock<HashMap<key,entry>> │  │
//! │                     └─────────────┘    └─────────────────────────────┘  │
//! │                                               ▲                         │
//! │                                               │                         │
//! │                     ┌─────────────────────────┴───────────────────────┐ │
//! │                     │           ExpirySweeper                         │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use clap::Parser;
//! use resplite::{Config, Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::parse();
//!     let server = Server::bind(&config).await?;
//!
//!     server
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `PING` - replies `+PONG`
//! - `ECHO message` - replies with `message` as a bulk string
//! - `SET key value [PX milliseconds]` - replies `+OK`
//! - `GET key` - replies with the value, or a null bulk string
//!
//! Any error is answered with a single `-ERR ...` reply, after which the
//! connection is closed.
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP value model, parser and serializer
//! - [`storage`]: Thread-safe store with TTL support and the expiry sweeper
//! - [`commands`]: Command registry and dispatch
//! - [`connection`]: Per-client read/dispatch/write loop
//! - [`server`]: Listener, accept loop and shutdown
//! - [`config`]: Command-line configuration
//!
//! ## Lazy + Active Expiry
//!
//! Keys with TTL are expired in two ways:
//! 1. **Lazy**: `GET` on an expired key removes it and reports a miss
//! 2. **Active**: A background task periodically removes expired keys
//!
//! This ensures memory is reclaimed even for keys that are never accessed again.

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandError, CommandHandler, ExecuteError};
pub use config::Config;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{ParseError, RespParser, RespValue};
pub use server::Server;
pub use storage::{ExpiryConfig, ExpirySweeper, StorageEngine};

/// The default port resplite listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host resplite binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of resplite
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
