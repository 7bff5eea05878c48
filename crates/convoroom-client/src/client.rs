//! Client state machine.
//!
//! The `Client` is the top-level state machine for one room at a time. It owns
//! the channel manager, the history loader, the transcript view and the two
//! message paths, and wires them together on each event.

use convoroom_core::{
    RoomId,
    channel::{ChannelHandle, ChannelManager, ChannelState},
    env::Environment,
    error::{ChannelError, HttpError},
    history::{HistoryLoader, HistoryPlan},
    ledger::{LedgerEntry, RoomLedger},
    message::Message,
};
use convoroom_proto::{CloseCode, OutboundEnvelope};

use crate::{
    config::ClientConfig,
    error::ClientError,
    event::{ClientAction, ClientEvent, RequestId},
    inbound::InboundRouter,
    notice::NoticeSink,
    outbound::{Outgoing, OutboundPipeline},
    view::RoomView,
};

/// Client for one ConvoRoom room at a time.
///
/// A room is mounted once both identity and room are known. Mounting starts
/// the history fetch and the channel; unmounting (leave, or entering another
/// room) tears the channel down with a normal closure and discards every
/// outstanding request.
pub struct Client<E: Environment, N: NoticeSink> {
    /// Environment for time and randomness.
    env: E,

    /// Endpoints and policies.
    config: ClientConfig,

    /// Local display identity.
    identity: Option<String>,

    /// Current room.
    room: Option<RoomId>,

    /// Rooms this client created.
    ledger: RoomLedger,

    /// True between mount and unmount.
    mounted: bool,

    /// Room-mount generation, stamped into request ids.
    session: u64,

    /// Next request sequence number within the session.
    next_seq: u64,

    /// Outstanding history fetch.
    pending_history: Option<RequestId>,

    /// Duplex channel lifecycle.
    channel: ChannelManager<E::Instant>,

    /// Transcript plus deduplicator.
    view: RoomView,

    history: HistoryLoader,
    inbound: InboundRouter,
    outbound: OutboundPipeline<N>,
}

impl<E: Environment, N: NoticeSink> Client<E, N> {
    /// Create a client with no identity and no room.
    pub fn new(env: E, config: ClientConfig, ledger: RoomLedger, notices: N) -> Self {
        Self {
            channel: ChannelManager::new(config.channel.clone()),
            view: RoomView::new(config.dedup.clone()),
            history: HistoryLoader::new(config.history.clone()),
            inbound: InboundRouter,
            outbound: OutboundPipeline::new(notices),
            env,
            config,
            identity: None,
            room: None,
            ledger,
            mounted: false,
            session: 0,
            next_seq: 0,
            pending_history: None,
        }
    }

    /// Local display identity, once resolved.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Current room.
    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// Displayed messages in order.
    pub fn messages(&self) -> &[Message] {
        self.view.messages().as_slice()
    }

    /// Transcript and dedupe state.
    pub fn view(&self) -> &RoomView {
        &self.view
    }

    /// Channel state.
    pub fn connection_state(&self) -> ChannelState {
        self.channel.state()
    }

    /// True while the channel is open.
    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    /// Reconnect attempts since the last successful open.
    pub fn reconnect_attempt(&self) -> u32 {
        self.channel.reconnect_attempt()
    }

    /// True between an abnormal closure and the next successful open.
    pub fn is_reconnecting(&self) -> bool {
        self.channel.is_reconnecting()
    }

    /// True once reconnects are exhausted. Re-enter the room to recover.
    pub fn is_exhausted(&self) -> bool {
        self.channel.is_exhausted()
    }

    /// True while a send awaits the compute endpoint.
    pub fn is_sending(&self) -> bool {
        self.outbound.is_sending()
    }

    /// True while the history fetch is outstanding.
    pub fn is_loading_history(&self) -> bool {
        self.pending_history.is_some()
    }

    /// Rooms this client created.
    pub fn ledger(&self) -> &RoomLedger {
        &self.ledger
    }

    /// Created rooms other than the current one, newest first.
    pub fn recent_rooms(&self) -> Vec<&LedgerEntry> {
        match &self.room {
            Some(room) => self.ledger.recent(room).collect(),
            None => self.ledger.entries().iter().collect(),
        }
    }

    /// Process an event and return resulting actions.
    pub fn handle(
        &mut self,
        event: ClientEvent<E::Instant>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::IdentityResolved { username } => self.handle_identity(username),
            ClientEvent::RoomCreated { room_id } => {
                self.handle_room_created(room_id);
                Ok(Vec::new())
            },
            ClientEvent::EnterRoom { room_id } => self.handle_enter_room(room_id),
            ClientEvent::LeaveRoom => Ok(self.handle_leave_room()),
            ClientEvent::Tick { now } => Ok(self.handle_tick(now)),
            ClientEvent::ChannelOpened { handle } => Ok(self.handle_channel_opened(handle)),
            ClientEvent::ChannelClosed { handle, code } => {
                Ok(self.handle_channel_closed(handle, code))
            },
            ClientEvent::ChannelFailed { handle, reason } => {
                Ok(self.handle_channel_failed(handle, reason))
            },
            ClientEvent::FrameReceived { handle, text } => Ok(self.handle_frame(handle, &text)),
            ClientEvent::Send { text } => self.handle_send(&text),
            ClientEvent::HistoryFetched { request, result } => {
                Ok(self.handle_history(request, result))
            },
            ClientEvent::ComputeCompleted { request, result } => {
                Ok(self.outbound.complete(&self.env, &mut self.view, request, result))
            },
            ClientEvent::ViewportChanged { at_bottom } => {
                self.view.set_at_bottom(at_bottom);
                Ok(Vec::new())
            },
        }
    }

    fn handle_identity(&mut self, username: String) -> Result<Vec<ClientAction>, ClientError> {
        let username = username.trim().to_string();
        if username.is_empty() || self.identity.as_deref() == Some(username.as_str()) {
            return Ok(Vec::new());
        }

        tracing::info!(%username, "identity resolved");

        let mut actions = self.unmount();
        self.identity = Some(username);
        actions.extend(self.mount()?);
        Ok(actions)
    }

    fn handle_room_created(&mut self, room_id: RoomId) {
        tracing::info!(room = %room_id, "room created");
        self.ledger.record_created(room_id, self.env.wall_clock());
    }

    fn handle_enter_room(&mut self, room_id: RoomId) -> Result<Vec<ClientAction>, ClientError> {
        if self.room.as_ref() == Some(&room_id) && self.mounted {
            return Ok(Vec::new());
        }

        let mut actions = self.unmount();
        self.room = Some(room_id);
        actions.extend(self.mount()?);
        Ok(actions)
    }

    fn handle_leave_room(&mut self) -> Vec<ClientAction> {
        let actions = self.unmount();
        self.room = None;
        actions
    }

    fn handle_tick(&mut self, now: E::Instant) -> Vec<ClientAction> {
        self.view.sweep(self.env.wall_clock());
        self.channel.tick(now).into_iter().map(ClientAction::from).collect()
    }

    fn handle_channel_opened(&mut self, handle: ChannelHandle) -> Vec<ClientAction> {
        let opened = self.channel.handle_open(self.env.now(), handle);
        if opened.is_empty() {
            return Vec::new();
        }

        let mut actions: Vec<ClientAction> = opened.into_iter().map(ClientAction::from).collect();

        if let (Some(username), Some(room_id)) = (self.identity.clone(), self.room.clone()) {
            self.channel.send(&OutboundEnvelope::Join { username, room_id });
            actions.extend(self.channel.take_outgoing().into_iter().map(ClientAction::from));
        }

        actions
    }

    fn handle_channel_closed(&mut self, handle: ChannelHandle, code: CloseCode) -> Vec<ClientAction> {
        let now = self.env.now();
        self.channel.handle_close(now, handle, code).into_iter().map(ClientAction::from).collect()
    }

    fn handle_channel_failed(&mut self, handle: ChannelHandle, reason: String) -> Vec<ClientAction> {
        let now = self.env.now();
        let error = ChannelError::Transport(reason);
        self.channel.handle_error(now, handle, &error).into_iter().map(ClientAction::from).collect()
    }

    fn handle_frame(&mut self, handle: ChannelHandle, text: &str) -> Vec<ClientAction> {
        if !self.channel.is_current(handle) {
            tracing::debug!(%handle, "dropping frame from stale channel");
            return Vec::new();
        }

        self.inbound.route(&self.env, &mut self.view, self.identity.as_deref(), text)
    }

    fn handle_send(&mut self, text: &str) -> Result<Vec<ClientAction>, ClientError> {
        let request = self.next_request();
        let compute_url = self.config.endpoints.compute_url();
        let outgoing = Outgoing {
            identity: self.identity.as_deref(),
            room: if self.mounted { self.room.as_ref() } else { None },
            text,
            request,
            compute_url: &compute_url,
        };

        Ok(self.outbound.send(&self.env, &mut self.view, &mut self.channel, outgoing)?)
    }

    fn handle_history(
        &mut self,
        request: RequestId,
        result: Result<Vec<u8>, HttpError>,
    ) -> Vec<ClientAction> {
        if self.pending_history != Some(request) {
            tracing::debug!(%request, "discarding stale history result");
            return Vec::new();
        }
        self.pending_history = None;

        let Some(room) = self.room.clone() else {
            return Vec::new();
        };

        let history = self.history.settle(&self.env, &room, result);
        if history.is_empty() {
            return Vec::new();
        }

        let admitted = self.view.merge_history(history);
        tracing::debug!(%room, admitted, "history merged");

        vec![
            ClientAction::MessagesReplaced(self.view.messages().as_slice().to_vec()),
            ClientAction::ScrollToBottom,
        ]
    }

    /// Start history and channel for the current room, if both identity and
    /// room are known.
    fn mount(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        if self.mounted {
            return Ok(Vec::new());
        }
        let (Some(identity), Some(room)) = (self.identity.clone(), self.room.clone()) else {
            return Ok(Vec::new());
        };

        self.mounted = true;
        self.session += 1;
        self.next_seq = 0;

        tracing::info!(%room, %identity, session = self.session, "entering room");

        let mut actions = Vec::new();

        let plan = self.history.plan(
            &room,
            &self.config.endpoints,
            &self.ledger,
            self.env.wall_clock(),
        );
        match plan {
            HistoryPlan::Fetch { url } => {
                let request = self.next_request();
                self.pending_history = Some(request);
                actions.push(ClientAction::FetchHistory { request, url });
            },
            HistoryPlan::Skip(reason) => {
                tracing::debug!(%room, ?reason, "history skipped");
            },
        }

        let url = self.config.endpoints.channel_url(&room);
        let opened = self.channel.connect(self.env.now(), Some(url))?;
        actions.extend(opened.into_iter().map(ClientAction::from));

        Ok(actions)
    }

    /// Tear down the current room. Outstanding requests become stale.
    fn unmount(&mut self) -> Vec<ClientAction> {
        if !self.mounted {
            return Vec::new();
        }
        self.mounted = false;
        self.pending_history = None;

        if let Some(room) = &self.room {
            tracing::info!(%room, "leaving room");
        }

        let mut actions: Vec<ClientAction> =
            self.channel.teardown().into_iter().map(ClientAction::from).collect();

        if self.outbound.reset() {
            actions.push(ClientAction::TypingChanged { active: false });
        }

        if !self.view.messages().is_empty() {
            actions.push(ClientAction::MessagesReplaced(Vec::new()));
        }
        self.view.reset();

        actions
    }

    fn next_request(&mut self) -> RequestId {
        let request = RequestId { session: self.session, seq: self.next_seq };
        self.next_seq += 1;
        request
    }
}

impl<E: Environment, N: NoticeSink> std::fmt::Debug for Client<E, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("identity", &self.identity)
            .field("room", &self.room)
            .field("mounted", &self.mounted)
            .field("session", &self.session)
            .field("state", &self.channel.state())
            .field("messages", &self.view.messages().len())
            .finish_non_exhaustive()
    }
}
