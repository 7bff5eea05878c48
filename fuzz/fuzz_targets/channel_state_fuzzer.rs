//! Fuzz target for the channel manager state machine
//!
//! # Strategy
//!
//! - Arbitrary interleavings of connect, open, close, error, tick, teardown
//! - Events for the current handle, a stale handle, and a future handle
//! - Virtual time advanced by arbitrary steps
//!
//! # Invariants
//!
//! - Reconnect attempts never exceed the configured limit
//! - Connected iff state is Open
//! - Frames are only queued for the current handle
//! - Events for any other handle produce no actions
//! - NEVER panic

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use convoroom_core::channel::{
    ChannelAction, ChannelConfig, ChannelHandle, ChannelManager, ChannelState,
};
use convoroom_core::error::ChannelError;
use convoroom_proto::{CloseCode, OutboundEnvelope};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Target {
    Current,
    Stale,
    Future,
}

#[derive(Debug, Clone, Arbitrary)]
enum ChannelOp {
    Connect { resolved: bool },
    Open(Target),
    Close { target: Target, code: u16 },
    Error(Target),
    Tick { advance_ms: u16 },
    Send,
    Teardown,
}

fuzz_target!(|ops: Vec<ChannelOp>| {
    let config = ChannelConfig::default();
    let max_attempts = config.max_reconnect_attempts;
    let mut channel: ChannelManager<Duration> = ChannelManager::new(config);
    let mut now = Duration::ZERO;
    let mut newest = 0_u64;

    for op in ops {
        let pick = |target: &Target, channel: &ChannelManager<Duration>| match target {
            Target::Current => channel.handle().unwrap_or(ChannelHandle(u64::MAX)),
            Target::Stale => ChannelHandle(newest.saturating_sub(1)),
            Target::Future => ChannelHandle(newest + 1),
        };

        let foreign = match &op {
            ChannelOp::Open(target) | ChannelOp::Close { target, .. } | ChannelOp::Error(target) => {
                !channel.is_current(pick(target, &channel))
            }
            _ => false,
        };

        let actions = match &op {
            ChannelOp::Connect { resolved } => {
                let url = resolved.then(|| "ws://fuzz/ws/room/r/".to_string());
                channel.connect(now, url).unwrap_or_default()
            }
            ChannelOp::Open(target) => {
                channel.handle_open(now, pick(target, &channel))
            }
            ChannelOp::Close { target, code } => {
                channel.handle_close(now, pick(target, &channel), CloseCode(*code))
            }
            ChannelOp::Error(target) => {
                let error = ChannelError::Transport("fuzz".into());
                channel.handle_error(now, pick(target, &channel), &error)
            }
            ChannelOp::Tick { advance_ms } => {
                now += Duration::from_millis(u64::from(*advance_ms));
                channel.tick(now)
            }
            ChannelOp::Send => {
                channel.send(&OutboundEnvelope::Ping);
                channel.take_outgoing()
            }
            ChannelOp::Teardown => channel.teardown(),
        };

        if foreign {
            assert!(actions.is_empty(), "{op:?} on a foreign handle produced {actions:?}");
        }

        for action in &actions {
            match action {
                ChannelAction::Open { handle, .. } => {
                    assert!(handle.0 > newest);
                    newest = handle.0;
                }
                ChannelAction::Send { handle, .. } => {
                    assert_eq!(Some(*handle), channel.handle());
                    assert_eq!(channel.state(), ChannelState::Open);
                }
                _ => {}
            }
        }

        assert!(channel.reconnect_attempt() <= max_attempts);
        assert_eq!(channel.is_connected(), channel.state() == ChannelState::Open);
    }
});
