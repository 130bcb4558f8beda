//! Connection Handler Module
//!
//! Each client connection is served by its own task running a
//! read-parse-execute-respond loop, one request at a time.
//!
//! ## Buffer Management
//!
//! TCP is a stream protocol: one read can hold half a frame, or several
//! frames. Incoming bytes are appended to a `BytesMut`. A [`FrameScanner`]
//! walks only the bytes it has not seen yet, and the parser runs once the
//! front frame is complete or malformed. Complete frames are taken off the
//! buffer until the scanner needs more input; only then is the socket read
//! again.
//!
//! ## Errors
//!
//! A malformed frame or an invalid command is answered with a `-ERR` reply
//! and the connection is closed. The byte stream is not resynchronised.

use crate::commands::{CommandError, CommandHandler, ExecuteError};
use crate::protocol::parser::MAX_BULK_SIZE;
use crate::protocol::{FrameScanner, ParseError, RespParser, RespValue};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, error, info, trace, warn};

/// Maximum size for the read buffer: the largest bulk string plus framing
const MAX_BUFFER_SIZE: usize = MAX_BULK_SIZE + 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client connection.
///
/// Generic over the stream so it can serve a `TcpStream` or any other
/// duplex byte stream.
pub struct ConnectionHandler<S> {
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Bytes received but not yet parsed
    buffer: BytesMut,

    command_handler: CommandHandler,

    parser: RespParser,

    /// Progress through the partial frame at the front of `buffer`
    scanner: FrameScanner,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    pub fn new(
        stream: S,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            command_handler,
            parser: RespParser::new(),
            scanner: FrameScanner::new(),
            stats,
        }
    }

    /// Serves the connection until the client disconnects or an error occurs.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => debug!(client = %self.addr, "Client disconnected"),
            Err(ConnectionError::Io(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => debug!(client = %self.addr, error = %e, "Connection closed with error"),
        }

        self.stats.connection_closed();
        result
    }

    /// The main read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            // Answer every complete frame already buffered
            loop {
                let command = match self.try_parse_command() {
                    Ok(Some(command)) => command,
                    Ok(None) => break,
                    Err(e) => return self.reject(e.into()).await,
                };

                match self.command_handler.dispatch(command) {
                    Ok(response) => {
                        self.stats.command_processed();
                        self.write_response(&response).await?;
                    }
                    Err(e) => return self.reject(e.into()).await,
                }
            }

            self.stream.flush().await?;

            if !self.read_more_data().await? {
                return Ok(());
            }
        }
    }

    /// Attempts to take one complete frame off the front of the buffer.
    fn try_parse_command(&mut self) -> Result<Option<RespValue>, ParseError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        if !self.scanner.frame_ready(&self.buffer) {
            trace!(
                client = %self.addr,
                buffered = self.buffer.len(),
                "Incomplete command, need more data"
            );
            return Ok(None);
        }

        match self.parser.parse_frame(&self.buffer)? {
            Some((value, consumed)) => {
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.addr,
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed command"
                );
                Ok(Some(value))
            }
            None => {
                trace!(
                    client = %self.addr,
                    buffered = self.buffer.len(),
                    "Incomplete command, need more data"
                );
                Ok(None)
            }
        }
    }

    /// Reads more data from the stream into the buffer.
    ///
    /// Returns `false` when the client closed the connection cleanly.
    async fn read_more_data(&mut self) -> Result<bool, ConnectionError> {
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = self.stream.read_buf(&mut self.buffer).await?;

        if n == 0 {
            return if self.buffer.is_empty() {
                Ok(false)
            } else {
                Err(ConnectionError::UnexpectedEof)
            };
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(true)
    }

    /// Buffers a response; it is flushed before the next read.
    async fn write_response(&mut self, response: &RespValue) -> Result<(), ConnectionError> {
        let bytes = response.serialize();
        self.stream.write_all(&bytes).await?;
        self.stats.bytes_written(bytes.len());
        trace!(client = %self.addr, bytes = bytes.len(), "Sent response");
        Ok(())
    }

    /// Reports `error` to the client and ends the connection with it.
    async fn reject(&mut self, error: ExecuteError) -> Result<(), ConnectionError> {
        warn!(client = %self.addr, error = %error, "Closing connection");
        self.write_response(&error.to_resp()).await?;
        self.stream.flush().await?;
        Err(error.into())
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed RESP frame
    #[error("Protocol error: {0}")]
    Protocol(#[from] ParseError),

    /// Well-formed frame that is not a valid command
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Stream ended in the middle of a frame
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// Buffer size limit exceeded
    #[error("Buffer size limit exceeded")]
    BufferFull,
}

impl From<ExecuteError> for ConnectionError {
    fn from(error: ExecuteError) -> Self {
        match error {
            ExecuteError::Protocol(e) => ConnectionError::Protocol(e),
            ExecuteError::Command(e) => ConnectionError::Command(e),
        }
    }
}

/// Handles a client connection.
///
/// Creates a [`ConnectionHandler`] and runs it to completion.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, addr, command_handler, stats);
    // Errors are logged by `run`
    let _ = handler.run().await;
}
