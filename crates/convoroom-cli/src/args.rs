//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use convoroom_client::ClientConfig;
use convoroom_proto::Endpoints;

/// ConvoRoom terminal client
#[derive(Parser, Debug, Clone)]
#[command(name = "convoroom")]
#[command(about = "Terminal client for ConvoRoom chat rooms")]
#[command(version)]
pub struct Args {
    /// HTTP backend base URL (history, compute, room creation)
    #[arg(long, env = "CONVOROOM_BACKEND", default_value = "http://localhost:8000/")]
    pub backend: String,

    /// WebSocket base URL for room channels
    #[arg(long, env = "CONVOROOM_WS", default_value = "ws://localhost:8000/")]
    pub ws: String,

    /// Room to enter on start
    #[arg(short, long)]
    pub room: Option<String>,

    /// Display name for this session
    ///
    /// When omitted, the remembered name is used, or a new one is generated
    /// and remembered.
    #[arg(short, long)]
    pub username: Option<String>,

    /// Directory for the remembered name and room ledger
    #[arg(long, default_value = ".convoroom")]
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Backend endpoints from the base URLs.
    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(self.backend.clone(), self.ws.clone())
    }

    /// Client configuration with default policies.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.endpoints())
    }
}
