//! Duplex channel lifecycle.
//!
//! Owns connect, keepalive, reconnect with exponential backoff, and teardown
//! for the room's single push connection. Knows nothing about chat messages:
//! envelopes handed to [`ChannelManager::send`] are opaque JSON.
//!
//! Uses the action pattern. Methods take time as input and return actions for
//! the driver to execute.
//!
//! # State Machine
//!
//! ```text
//!                connect            on_open
//! ┌──────────────┐ ──────> ┌────────────┐ ──────> ┌──────┐
//! │ Disconnected │         │ Connecting │         │ Open │
//! └──────────────┘ <────── └────────────┘         └──────┘
//!     ^    │   close/error/timeout                  │  │
//!     │    │                                        │  │ teardown
//!     │    └── backoff timer ──> Connecting         │  v
//!     │                                             │ ┌─────────┐
//!     └──────────── close/error (reconnect) ────────┘ │ Closing │
//!     ^                                               └─────────┘
//!     └───────────────────── close ───────────────────────┘
//! ```
//!
//! Each connection attempt gets a fresh [`ChannelHandle`]. The manager owns at
//! most one live handle; events for any other handle are stale and ignored.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use convoroom_proto::{CloseCode, OutboundEnvelope};

use crate::error::ChannelError;

/// Time allowed for a connection attempt to reach `Open`.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between keepalive probes while `Open`.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Delay before the first reconnect attempt.
pub const DEFAULT_RECONNECT_BASE: Duration = Duration::from_secs(3);

/// Growth factor applied per reconnect attempt.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.5;

/// Reconnect attempts before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Reason attached to the normal-closure frame on teardown.
pub const TEARDOWN_REASON: &str = "Component unmounted";

/// Identifies one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelHandle(pub u64);

impl std::fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Actions returned by the channel state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAction {
    /// Open a new duplex connection
    Open {
        /// Handle for the new attempt
        handle: ChannelHandle,
        /// Endpoint to connect to
        url: String,
    },

    /// Write a text frame on an open connection
    Send {
        /// Connection to write on
        handle: ChannelHandle,
        /// Serialized envelope
        text: String,
    },

    /// Close the connection gracefully
    Close {
        /// Connection to close
        handle: ChannelHandle,
        /// Closure code sent to the peer
        code: CloseCode,
        /// Human-readable reason
        reason: String,
    },

    /// Drop the connection without a closing handshake
    Abort {
        /// Connection to drop
        handle: ChannelHandle,
    },

    /// The connected/not-connected indicator changed
    ConnectionChanged {
        /// New value
        connected: bool,
    },
}

/// Channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No live connection. A reconnect may be scheduled.
    Disconnected,
    /// Attempt in progress, waiting for open
    Connecting,
    /// Connection established
    Open,
    /// Teardown requested, waiting for the close to complete
    Closing,
}

/// Channel configuration
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Connection attempts that have not opened after this long are aborted
    pub connect_timeout: Duration,
    /// Keepalive cadence while open
    pub heartbeat_interval: Duration,
    /// First reconnect delay
    pub reconnect_base: Duration,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
    /// Attempts before the manager gives up
    pub max_reconnect_attempts: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_base: DEFAULT_RECONNECT_BASE,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl ChannelConfig {
    /// Delay before reconnect attempt number `attempt` (zero-based).
    ///
    /// `reconnect_base * backoff_factor ^ attempt`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.reconnect_base.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::try_from_secs_f64(scaled).unwrap_or(Duration::MAX)
    }
}

#[derive(Debug, Clone, Copy)]
struct ReconnectTimer<I> {
    scheduled_at: I,
    delay: Duration,
}

/// Duplex channel state machine
///
/// Pure: no I/O, no clock. Generic over `Instant` so simulations can run on
/// virtual time.
#[derive(Debug, Clone)]
pub struct ChannelManager<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    state: ChannelState,
    config: ChannelConfig,
    /// Endpoint of the current room. `None` until identity and room resolve.
    url: Option<String>,
    handle: Option<ChannelHandle>,
    next_handle: u64,
    reconnect_attempt: u32,
    exhausted: bool,
    connecting_since: Option<I>,
    last_heartbeat: Option<I>,
    reconnect_timer: Option<ReconnectTimer<I>>,
    outgoing: Vec<ChannelAction>,
}

impl<I> ChannelManager<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a manager in [`ChannelState::Disconnected`].
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            state: ChannelState::Disconnected,
            config,
            url: None,
            handle: None,
            next_handle: 1,
            reconnect_attempt: 0,
            exhausted: false,
            connecting_since: None,
            last_heartbeat: None,
            reconnect_timer: None,
            outgoing: Vec::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Configuration in use
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// True while the connection is open.
    pub fn is_connected(&self) -> bool {
        self.state == ChannelState::Open
    }

    /// Reconnect attempts made since the last successful open.
    pub fn reconnect_attempt(&self) -> u32 {
        self.reconnect_attempt
    }

    /// True between an abnormal closure and the next successful open.
    pub fn is_reconnecting(&self) -> bool {
        self.reconnect_attempt > 0
    }

    /// True once the manager has given up. Cleared by the next
    /// [`connect`](Self::connect).
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Handle of the live connection attempt, if any.
    pub fn handle(&self) -> Option<ChannelHandle> {
        self.handle
    }

    /// True if `handle` refers to the live connection attempt.
    pub fn is_current(&self, handle: ChannelHandle) -> bool {
        self.handle == Some(handle)
    }

    /// Endpoint of the current room.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Time until the scheduled reconnect fires. `None` if nothing is
    /// scheduled.
    pub fn next_reconnect_in(&self, now: I) -> Option<Duration> {
        self.reconnect_timer
            .map(|timer| timer.delay.saturating_sub(now - timer.scheduled_at))
    }

    /// Start connecting to `url`.
    ///
    /// A `None` url means identity or room is not resolved yet; the manager
    /// stays `Disconnected`. Resets the attempt counter and clears
    /// exhaustion.
    ///
    /// # Errors
    ///
    /// - `ChannelError::InvalidState` if already connecting or open
    pub fn connect(
        &mut self,
        now: I,
        url: Option<String>,
    ) -> Result<Vec<ChannelAction>, ChannelError> {
        match self.state {
            ChannelState::Disconnected | ChannelState::Closing => {},
            state => return Err(ChannelError::InvalidState { state, operation: "connect" }),
        }

        self.reconnect_attempt = 0;
        self.exhausted = false;
        self.reconnect_timer = None;
        self.url = url;

        if self.url.is_none() {
            tracing::debug!("channel target unresolved, staying disconnected");
            self.state = ChannelState::Disconnected;
            self.handle = None;
            return Ok(Vec::new());
        }

        Ok(self.open_attempt(now))
    }

    /// Process the open event for `handle`.
    pub fn handle_open(&mut self, now: I, handle: ChannelHandle) -> Vec<ChannelAction> {
        if !self.is_current(handle) || self.state != ChannelState::Connecting {
            tracing::debug!(%handle, state = ?self.state, "ignoring stale open");
            return Vec::new();
        }

        tracing::info!(%handle, "channel open");

        self.state = ChannelState::Open;
        self.reconnect_attempt = 0;
        self.connecting_since = None;
        self.last_heartbeat = Some(now);

        vec![ChannelAction::ConnectionChanged { connected: true }]
    }

    /// Process the close event for `handle`.
    ///
    /// Intentional closure codes and closes during teardown never reconnect.
    /// Anything else schedules a reconnect until attempts run out.
    pub fn handle_close(
        &mut self,
        now: I,
        handle: ChannelHandle,
        code: CloseCode,
    ) -> Vec<ChannelAction> {
        if !self.is_current(handle) {
            tracing::debug!(%handle, %code, "ignoring stale close");
            return Vec::new();
        }

        let was_open = self.state == ChannelState::Open;
        let was_closing = self.state == ChannelState::Closing;

        self.state = ChannelState::Disconnected;
        self.handle = None;
        self.connecting_since = None;
        self.last_heartbeat = None;

        let mut actions = Vec::new();
        if was_open {
            actions.push(ChannelAction::ConnectionChanged { connected: false });
        }

        if was_closing {
            tracing::info!(%handle, %code, "channel closed after teardown");
            return actions;
        }

        if code.is_intentional() {
            tracing::info!(%handle, %code, "channel closed normally");
            return actions;
        }

        tracing::info!(%handle, %code, "channel closed abnormally");
        self.schedule_reconnect(now);
        actions
    }

    /// Process a transport failure for `handle`.
    ///
    /// Treated as an abnormal closure.
    pub fn handle_error(
        &mut self,
        now: I,
        handle: ChannelHandle,
        error: &ChannelError,
    ) -> Vec<ChannelAction> {
        if !self.is_current(handle) {
            tracing::debug!(%handle, %error, "ignoring stale error");
            return Vec::new();
        }

        tracing::warn!(%handle, %error, "channel error");
        self.handle_close(now, handle, CloseCode::ABNORMAL)
    }

    /// Process periodic maintenance (connect timeout, keepalive, reconnect
    /// timer).
    pub fn tick(&mut self, now: I) -> Vec<ChannelAction> {
        match self.state {
            ChannelState::Connecting => self.check_connect_timeout(now),
            ChannelState::Open => self.check_heartbeat(now),
            ChannelState::Disconnected => self.check_reconnect_timer(now),
            ChannelState::Closing => Vec::new(),
        }
    }

    /// Queue `envelope` on the open connection.
    ///
    /// Returns false without queueing anything unless the channel is open.
    /// Queued frames are collected with [`take_outgoing`](Self::take_outgoing).
    pub fn send(&mut self, envelope: &OutboundEnvelope) -> bool {
        let (ChannelState::Open, Some(handle)) = (self.state, self.handle) else {
            return false;
        };

        match envelope.to_json() {
            Ok(text) => {
                self.outgoing.push(ChannelAction::Send { handle, text });
                true
            },
            Err(error) => {
                tracing::warn!(%error, "failed to encode envelope");
                false
            },
        }
    }

    /// Drain frames queued by [`send`](Self::send).
    pub fn take_outgoing(&mut self) -> Vec<ChannelAction> {
        std::mem::take(&mut self.outgoing)
    }

    /// Close the channel for good (room exit).
    ///
    /// Uses the normal-closure code so the close never triggers a reconnect.
    /// Cancels any scheduled reconnect.
    pub fn teardown(&mut self) -> Vec<ChannelAction> {
        self.reconnect_timer = None;
        self.connecting_since = None;
        self.last_heartbeat = None;
        self.outgoing.clear();

        let Some(handle) = self.handle else {
            self.state = ChannelState::Disconnected;
            return Vec::new();
        };

        if self.state == ChannelState::Closing {
            return Vec::new();
        }

        let was_open = self.state == ChannelState::Open;
        self.state = ChannelState::Closing;

        tracing::info!(%handle, "channel teardown");

        let mut actions = vec![ChannelAction::Close {
            handle,
            code: CloseCode::NORMAL,
            reason: TEARDOWN_REASON.to_string(),
        }];
        if was_open {
            actions.push(ChannelAction::ConnectionChanged { connected: false });
        }
        actions
    }

    fn open_attempt(&mut self, now: I) -> Vec<ChannelAction> {
        let Some(url) = self.url.clone() else {
            self.state = ChannelState::Disconnected;
            return Vec::new();
        };

        let handle = ChannelHandle(self.next_handle);
        self.next_handle += 1;

        self.handle = Some(handle);
        self.state = ChannelState::Connecting;
        self.connecting_since = Some(now);
        self.last_heartbeat = None;

        tracing::info!(%handle, %url, attempt = self.reconnect_attempt, "connecting");

        vec![ChannelAction::Open { handle, url }]
    }

    fn schedule_reconnect(&mut self, now: I) {
        if self.reconnect_attempt >= self.config.max_reconnect_attempts {
            self.exhausted = true;
            tracing::warn!(
                attempts = self.reconnect_attempt,
                "reconnect attempts exhausted, staying disconnected"
            );
            return;
        }

        let delay = self.config.backoff_delay(self.reconnect_attempt);
        self.reconnect_timer = Some(ReconnectTimer { scheduled_at: now, delay });
        self.reconnect_attempt += 1;

        tracing::info!(attempt = self.reconnect_attempt, ?delay, "reconnect scheduled");
    }

    fn check_connect_timeout(&mut self, now: I) -> Vec<ChannelAction> {
        let (Some(since), Some(handle)) = (self.connecting_since, self.handle) else {
            return Vec::new();
        };

        let elapsed = now - since;
        if elapsed < self.config.connect_timeout {
            return Vec::new();
        }

        let error = ChannelError::ConnectTimeout { elapsed };
        tracing::warn!(%handle, %error, "connection attempt timed out");

        let mut actions = vec![ChannelAction::Abort { handle }];
        actions.extend(self.handle_close(now, handle, CloseCode::ABNORMAL));
        actions
    }

    fn check_heartbeat(&mut self, now: I) -> Vec<ChannelAction> {
        let Some(handle) = self.handle else {
            return Vec::new();
        };

        let due = match self.last_heartbeat {
            None => true,
            Some(last) => now - last >= self.config.heartbeat_interval,
        };
        if !due {
            return Vec::new();
        }

        self.last_heartbeat = Some(now);
        match OutboundEnvelope::Ping.to_json() {
            Ok(text) => vec![ChannelAction::Send { handle, text }],
            Err(error) => {
                tracing::warn!(%error, "failed to encode keepalive");
                Vec::new()
            },
        }
    }

    fn check_reconnect_timer(&mut self, now: I) -> Vec<ChannelAction> {
        let Some(timer) = self.reconnect_timer else {
            return Vec::new();
        };

        if now - timer.scheduled_at < timer.delay {
            return Vec::new();
        }

        self.reconnect_timer = None;
        self.open_attempt(now)
    }
}
