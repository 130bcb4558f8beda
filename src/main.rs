//! resplite - A Minimal RESP Key-Value Server
//!
//! This is the main entry point for the resplite server.
//! It parses the configuration, sets up logging and runs the server until
//! Ctrl+C is received.

use clap::Parser;
use resplite::{Config, Server};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn print_banner(config: &Config) {
    println!(
        r#"
resplite v{} - Minimal RESP Key-Value Server
──────────────────────────────────────────────
Server started on {}
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        resplite::VERSION,
        config.bind_address()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::parse();

    // Set up logging, RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    // Bind the TCP listener
    let server = Server::bind(&config).await?;

    print_banner(&config);
    info!(
        sweep_interval_ms = config.sweep_interval_ms,
        default_ttl_ms = ?config.default_ttl_ms,
        "Storage engine initialized"
    );

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    server.run(shutdown).await;
    Ok(())
}
