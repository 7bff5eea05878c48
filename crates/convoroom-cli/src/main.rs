//! ConvoRoom terminal client.
//!
//! # Usage
//!
//! ```bash
//! # Join a room on a local backend
//! convoroom --room AB12CD
//!
//! # Point at a deployed backend
//! CONVOROOM_BACKEND=https://api.example.com/ CONVOROOM_WS=wss://api.example.com/ convoroom
//! ```

use clap::Parser;
use convoroom_cli::Args;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    tracing::info!(backend = %args.backend, ws = %args.ws, "ConvoRoom starting");

    convoroom_cli::run(args).await?;

    Ok(())
}
