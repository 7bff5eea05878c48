//! Scripted host for a single client.
//!
//! `SimHost` plays every role around the client: it is the transport (opens
//! and closes channels, delivers frames), the backend (answers history and
//! compute requests when told to), and the UI (applies message, connection
//! and typing actions to a local projection). Nothing happens unless a test
//! asks for it, so any interleaving of network outcomes can be scripted.

use std::{
    collections::{HashSet, VecDeque},
    time::Duration,
};

use convoroom_client::{Client, ClientAction, ClientConfig, ClientError, ClientEvent, RequestId};
use convoroom_core::{
    RoomId,
    channel::ChannelHandle,
    env::Environment,
    error::HttpError,
    ledger::RoomLedger,
    message::{Message, MessageId},
};
use convoroom_proto::{CloseCode, Endpoints, OutboundEnvelope, ProtocolError};

use crate::{
    invariants::{HostSnapshot, InvariantRegistry, Violation},
    notices::RecordingSink,
    sim_env::{SimEnv, SimInstant},
};

/// HTTP base used by [`SimHost::new`].
pub const SIM_HTTP_BASE: &str = "http://backend.test";

/// WebSocket base used by [`SimHost::new`].
pub const SIM_WS_BASE: &str = "ws://backend.test";

/// Error type for simulation steps.
#[derive(Debug)]
pub enum HostError {
    /// The client rejected an event.
    Client(ClientError),
    /// A scripted frame could not be encoded.
    Protocol(ProtocolError),
    /// An invariant failed after the step.
    Invariant(Vec<Violation>),
    /// The script asked for something the client never requested.
    Script(&'static str),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client(error) => write!(f, "client error: {error}"),
            Self::Protocol(error) => write!(f, "protocol error: {error}"),
            Self::Invariant(violations) => {
                let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
                write!(f, "invariant violation:\n  {}", messages.join("\n  "))
            },
            Self::Script(what) => write!(f, "script error: {what}"),
        }
    }
}

impl std::error::Error for HostError {}

impl From<ClientError> for HostError {
    fn from(error: ClientError) -> Self {
        Self::Client(error)
    }
}

impl From<ProtocolError> for HostError {
    fn from(error: ProtocolError) -> Self {
        Self::Protocol(error)
    }
}

/// Step result.
pub type HostResult<T = Vec<ClientAction>> = Result<T, HostError>;

/// A compute call the client issued and nobody answered yet.
#[derive(Debug, Clone)]
pub struct PendingCompute {
    /// Request to answer
    pub request: RequestId,
    /// Target URL
    pub url: String,
    /// JSON body the client posted
    pub body: String,
}

/// Simulation host. See the module docs.
#[derive(Debug)]
pub struct SimHost {
    env: SimEnv,
    config: ClientConfig,
    client: Client<SimEnv, RecordingSink>,
    notices: RecordingSink,
    invariants: Option<InvariantRegistry>,

    actions: Vec<ClientAction>,
    displayed: Vec<Message>,
    live_ids: HashSet<MessageId>,
    ui_connected: bool,
    ui_typing: bool,
    scrolls: usize,

    latest_channel: Option<ChannelHandle>,
    opened: Vec<(ChannelHandle, String)>,
    frames: Vec<(ChannelHandle, String)>,
    closed: Vec<(ChannelHandle, CloseCode, String)>,
    aborted: Vec<ChannelHandle>,
    stale_sends: usize,

    pending_history: VecDeque<(RequestId, String)>,
    pending_compute: VecDeque<PendingCompute>,
}

impl SimHost {
    /// Host with default policies against the simulated backend.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, ClientConfig::new(Endpoints::new(SIM_HTTP_BASE, SIM_WS_BASE)))
    }

    /// Host with custom policies.
    pub fn with_config(seed: u64, config: ClientConfig) -> Self {
        let env = SimEnv::with_seed(seed);
        let notices = RecordingSink::new();
        let client = Client::new(env.clone(), config.clone(), RoomLedger::new(), notices.clone());

        Self {
            env,
            config,
            client,
            notices,
            invariants: None,
            actions: Vec::new(),
            displayed: Vec::new(),
            live_ids: HashSet::new(),
            ui_connected: false,
            ui_typing: false,
            scrolls: 0,
            latest_channel: None,
            opened: Vec::new(),
            frames: Vec::new(),
            closed: Vec::new(),
            aborted: Vec::new(),
            stale_sends: 0,
            pending_history: VecDeque::new(),
            pending_compute: VecDeque::new(),
        }
    }

    /// Check `registry` after every step.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Feed one event to the client and apply the resulting actions.
    pub fn handle(&mut self, event: ClientEvent<SimInstant>) -> HostResult {
        let actions = self.client.handle(event)?;
        tracing::trace!(actions = actions.len(), "sim step");
        for action in &actions {
            self.apply(action);
        }
        self.actions.extend(actions.iter().cloned());

        if let Some(registry) = &self.invariants {
            registry.check_all(&self.snapshot()).map_err(HostError::Invariant)?;
        }

        Ok(actions)
    }

    fn apply(&mut self, action: &ClientAction) {
        match action {
            ClientAction::OpenChannel { handle, url } => {
                self.latest_channel = Some(*handle);
                self.opened.push((*handle, url.clone()));
            },
            ClientAction::SendFrame { handle, text } => {
                if self.latest_channel != Some(*handle) {
                    self.stale_sends += 1;
                }
                self.frames.push((*handle, text.clone()));
            },
            ClientAction::CloseChannel { handle, code, reason } => {
                self.closed.push((*handle, *code, reason.clone()));
            },
            ClientAction::AbortChannel { handle } => self.aborted.push(*handle),
            ClientAction::FetchHistory { request, url } => {
                self.pending_history.push_back((*request, url.clone()));
            },
            ClientAction::PostCompute { request, url, body } => {
                self.pending_compute.push_back(PendingCompute {
                    request: *request,
                    url: url.clone(),
                    body: body.clone(),
                });
            },
            ClientAction::ConnectionChanged { connected } => self.ui_connected = *connected,
            ClientAction::MessageAppended(message) => {
                self.live_ids.insert(message.id.clone());
                self.displayed.push(message.clone());
            },
            ClientAction::MessagesReplaced(messages) => self.displayed.clone_from(messages),
            ClientAction::MessageRemoved { id } => self.displayed.retain(|m| &m.id != id),
            ClientAction::TypingChanged { active } => self.ui_typing = *active,
            ClientAction::ScrollToBottom => self.scrolls += 1,
        }
    }

    /// Resolve the local identity.
    pub fn identify(&mut self, username: &str) -> HostResult {
        self.handle(ClientEvent::IdentityResolved { username: username.to_string() })
    }

    /// Record that this client created `room` just now.
    pub fn create_room(&mut self, room: &str) -> HostResult {
        self.handle(ClientEvent::RoomCreated { room_id: RoomId::new(room) })
    }

    /// Enter `room`.
    pub fn enter(&mut self, room: &str) -> HostResult {
        self.handle(ClientEvent::EnterRoom { room_id: RoomId::new(room) })
    }

    /// Leave the current room.
    pub fn leave(&mut self) -> HostResult {
        self.handle(ClientEvent::LeaveRoom)
    }

    /// Identify, enter `room` and open the channel.
    ///
    /// Any history request stays pending.
    pub fn join(&mut self, username: &str, room: &str) -> HostResult<()> {
        self.identify(username)?;
        self.enter(room)?;
        self.open()?;
        Ok(())
    }

    fn current_channel(&self) -> HostResult<ChannelHandle> {
        self.latest_channel.ok_or(HostError::Script("no channel was opened"))
    }

    /// Report the newest channel as open.
    pub fn open(&mut self) -> HostResult {
        let handle = self.current_channel()?;
        self.handle(ClientEvent::ChannelOpened { handle })
    }

    /// Report the newest channel as closed with `code`.
    pub fn close(&mut self, code: CloseCode) -> HostResult {
        let handle = self.current_channel()?;
        self.handle(ClientEvent::ChannelClosed { handle, code })
    }

    /// Report a transport failure on the newest channel.
    pub fn fail(&mut self, reason: &str) -> HostResult {
        let handle = self.current_channel()?;
        self.handle(ClientEvent::ChannelFailed { handle, reason: reason.to_string() })
    }

    /// Deliver raw frame text on the newest channel.
    pub fn frame(&mut self, text: &str) -> HostResult {
        let handle = self.current_channel()?;
        self.handle(ClientEvent::FrameReceived { handle, text: text.to_string() })
    }

    /// Deliver a chat frame from `sender` on the newest channel.
    pub fn chat(&mut self, sender: &str, text: &str) -> HostResult {
        let room = self.client.room().cloned().unwrap_or_else(|| RoomId::new(""));
        let frame = OutboundEnvelope::ChatMessage {
            message: text.to_string(),
            room_id: room,
            username: sender.to_string(),
        }
        .to_json()?;
        self.frame(&frame)
    }

    /// The user typed `text`.
    pub fn send(&mut self, text: &str) -> HostResult {
        self.handle(ClientEvent::Send { text: text.to_string() })
    }

    /// Report the scroll position.
    pub fn scroll(&mut self, at_bottom: bool) -> HostResult {
        self.handle(ClientEvent::ViewportChanged { at_bottom })
    }

    /// Answer the oldest pending history request.
    pub fn answer_history(&mut self, result: Result<Vec<u8>, HttpError>) -> HostResult {
        let (request, _url) =
            self.pending_history.pop_front().ok_or(HostError::Script("no history request"))?;
        self.handle(ClientEvent::HistoryFetched { request, result })
    }

    /// Answer the oldest pending compute call.
    pub fn answer_compute(&mut self, result: Result<Vec<u8>, HttpError>) -> HostResult {
        let pending =
            self.pending_compute.pop_front().ok_or(HostError::Script("no compute request"))?;
        self.handle(ClientEvent::ComputeCompleted { request: pending.request, result })
    }

    /// Answer the oldest pending compute call with `{"response": reply}`.
    pub fn reply(&mut self, reply: &str) -> HostResult {
        let body = serde_json::json!({ "response": reply }).to_string();
        self.answer_compute(Ok(body.into_bytes()))
    }

    /// Deliver a tick at the current virtual time.
    pub fn tick(&mut self) -> HostResult {
        let now = self.env.now();
        self.handle(ClientEvent::Tick { now })
    }

    /// Move virtual time forward and tick once.
    pub fn advance(&mut self, by: Duration) -> HostResult {
        self.env.advance(by);
        self.tick()
    }

    /// Tick every `step` until `total` has elapsed. Returns all actions.
    pub fn run_for(&mut self, total: Duration, step: Duration) -> HostResult {
        let mut actions = Vec::new();
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            let step = step.min(total - elapsed);
            actions.extend(self.advance(step)?);
            elapsed += step;
        }
        Ok(actions)
    }

    /// Current observable state for invariant checks.
    pub fn snapshot(&self) -> HostSnapshot {
        let live =
            self.displayed.iter().filter(|m| self.live_ids.contains(&m.id)).cloned().collect();

        HostSnapshot {
            displayed: self.displayed.clone(),
            live,
            client_messages: self.client.messages().to_vec(),
            ui_connected: self.ui_connected,
            client_connected: self.client.is_connected(),
            ui_typing: self.ui_typing,
            client_sending: self.client.is_sending(),
            reconnect_attempt: self.client.reconnect_attempt(),
            max_reconnect_attempts: self.config.channel.max_reconnect_attempts,
            stale_sends: self.stale_sends,
            dedupe_window: self.config.dedup.window,
        }
    }

    /// Shared environment.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// The client under test.
    pub fn client(&self) -> &Client<SimEnv, RecordingSink> {
        &self.client
    }

    /// Notices the user would have seen.
    pub fn notices(&self) -> &RecordingSink {
        &self.notices
    }

    /// Every action the client returned, in order.
    pub fn actions(&self) -> &[ClientAction] {
        &self.actions
    }

    /// Messages the UI shows.
    pub fn displayed(&self) -> &[Message] {
        &self.displayed
    }

    /// `(sender, text)` of every displayed message.
    pub fn transcript(&self) -> Vec<(String, String)> {
        self.displayed.iter().map(|m| (m.sender.clone(), m.text.clone())).collect()
    }

    /// Connection indicator.
    pub fn is_connected(&self) -> bool {
        self.ui_connected
    }

    /// Typing indicator.
    pub fn is_typing(&self) -> bool {
        self.ui_typing
    }

    /// Number of `ScrollToBottom` actions so far.
    pub fn scroll_count(&self) -> usize {
        self.scrolls
    }

    /// Channels the client asked to open, with their URLs.
    pub fn opened_channels(&self) -> &[(ChannelHandle, String)] {
        &self.opened
    }

    /// Frames written to any channel.
    pub fn frames(&self) -> &[(ChannelHandle, String)] {
        &self.frames
    }

    /// Channels the client closed, with code and reason.
    pub fn closed_channels(&self) -> &[(ChannelHandle, CloseCode, String)] {
        &self.closed
    }

    /// Channels the client abandoned without a handshake.
    pub fn aborted_channels(&self) -> &[ChannelHandle] {
        &self.aborted
    }

    /// Unanswered history requests.
    pub fn pending_history(&self) -> impl Iterator<Item = &(RequestId, String)> {
        self.pending_history.iter()
    }

    /// Unanswered compute calls.
    pub fn pending_compute(&self) -> impl Iterator<Item = &PendingCompute> {
        self.pending_compute.iter()
    }

    /// Drop all pending requests without answering them.
    pub fn forget_requests(&mut self) -> (Vec<(RequestId, String)>, Vec<PendingCompute>) {
        (self.pending_history.drain(..).collect(), self.pending_compute.drain(..).collect())
    }
}
