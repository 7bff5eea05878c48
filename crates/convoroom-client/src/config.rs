//! Client configuration.

use convoroom_core::{channel::ChannelConfig, dedup::DedupConfig, history::HistoryConfig};
use convoroom_proto::Endpoints;

/// Everything a [`crate::Client`] needs to know up front.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend and duplex channel base URLs
    pub endpoints: Endpoints,
    /// Connect, keepalive and reconnect policy
    pub channel: ChannelConfig,
    /// Dedupe window and sweep cadence
    pub dedup: DedupConfig,
    /// New-room heuristic
    pub history: HistoryConfig,
}

impl ClientConfig {
    /// Default policies against the given endpoints.
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            channel: ChannelConfig::default(),
            dedup: DedupConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}
