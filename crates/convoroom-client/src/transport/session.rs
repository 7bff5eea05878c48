//! Async executor for a [`Client`].
//!
//! The session owns the client and performs its actions: channel actions go
//! to per-handle WebSocket tasks, HTTP actions to spawned requests, and
//! everything meant for the UI to the caller's channel. Outcomes come back as
//! events on an internal queue. Ticks fire on a fixed interval.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use convoroom_core::{RoomId, channel::ChannelHandle, env::Environment};
use tokio::{
    sync::mpsc,
    time::{MissedTickBehavior, interval},
};

use super::{HttpBackend, SystemEnv, TransportError, websocket};
use crate::{
    client::Client,
    event::{ClientAction, ClientEvent},
    notice::NoticeSink,
};

/// Tick cadence. Bounds how late a timer can fire.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Feeds user intents into a running [`Session`].
///
/// The session stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<ClientEvent<Instant>>,
}

impl SessionHandle {
    /// Forward any event.
    pub fn submit(&self, event: ClientEvent<Instant>) -> Result<(), TransportError> {
        self.commands.send(event).map_err(|_| TransportError::SessionClosed)
    }

    /// The user typed `text`.
    pub fn send_text(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.submit(ClientEvent::Send { text: text.into() })
    }

    /// Enter `room`.
    pub fn enter_room(&self, room: RoomId) -> Result<(), TransportError> {
        self.submit(ClientEvent::EnterRoom { room_id: room })
    }

    /// Leave the current room.
    pub fn leave_room(&self) -> Result<(), TransportError> {
        self.submit(ClientEvent::LeaveRoom)
    }

    /// Report the scroll position.
    pub fn viewport(&self, at_bottom: bool) -> Result<(), TransportError> {
        self.submit(ClientEvent::ViewportChanged { at_bottom })
    }
}

enum Wake {
    Command(ClientEvent<Instant>),
    Outcome(ClientEvent<Instant>),
    Tick,
    Shutdown,
}

/// Runs a [`Client`] against real I/O.
pub struct Session<N: NoticeSink> {
    env: SystemEnv,
    client: Client<SystemEnv, N>,
    http: HttpBackend,
    channels: HashMap<ChannelHandle, websocket::ChannelTask>,
    commands: mpsc::UnboundedReceiver<ClientEvent<Instant>>,
    outcomes_tx: mpsc::UnboundedSender<ClientEvent<Instant>>,
    outcomes: mpsc::UnboundedReceiver<ClientEvent<Instant>>,
    tick_interval: Duration,
}

impl<N: NoticeSink> Session<N> {
    /// Wrap `client`. Returns the session and a handle for user intents.
    pub fn new(env: SystemEnv, client: Client<SystemEnv, N>, http: HttpBackend) -> (Self, SessionHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (outcomes_tx, outcomes) = mpsc::unbounded_channel();

        let session = Self {
            env,
            client,
            http,
            channels: HashMap::new(),
            commands,
            outcomes_tx,
            outcomes,
            tick_interval: DEFAULT_TICK_INTERVAL,
        };
        (session, SessionHandle { commands: commands_tx })
    }

    /// Override the tick cadence.
    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    /// The wrapped client.
    pub fn client(&self) -> &Client<SystemEnv, N> {
        &self.client
    }

    /// Run until every [`SessionHandle`] is dropped, then leave the room.
    ///
    /// Actions meant for the UI are forwarded to `ui`.
    pub async fn run(mut self, ui: mpsc::UnboundedSender<ClientAction>) -> Client<SystemEnv, N> {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let wake = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(event) => Wake::Command(event),
                    None => Wake::Shutdown,
                },
                Some(event) = self.outcomes.recv() => Wake::Outcome(event),
                _ = ticker.tick() => Wake::Tick,
            };

            match wake {
                Wake::Command(event) | Wake::Outcome(event) => self.dispatch(event, &ui),
                Wake::Tick => {
                    let now = self.env.now();
                    self.dispatch(ClientEvent::Tick { now }, &ui);
                },
                Wake::Shutdown => break,
            }
        }

        tracing::info!("session shutting down");
        self.dispatch(ClientEvent::LeaveRoom, &ui);
        self.client
    }

    fn dispatch(&mut self, event: ClientEvent<Instant>, ui: &mpsc::UnboundedSender<ClientAction>) {
        if let ClientEvent::ChannelClosed { handle, .. } | ClientEvent::ChannelFailed { handle, .. } =
            &event
        {
            self.channels.remove(handle);
        }

        match self.client.handle(event) {
            Ok(actions) => {
                for action in actions {
                    self.execute(action, ui);
                }
            },
            Err(error) => tracing::error!(%error, "client rejected event"),
        }
    }

    fn execute(&mut self, action: ClientAction, ui: &mpsc::UnboundedSender<ClientAction>) {
        match action {
            ClientAction::OpenChannel { handle, url } => {
                let task = websocket::spawn(self.env.clone(), handle, url, self.outcomes_tx.clone());
                self.channels.insert(handle, task);
            },
            ClientAction::SendFrame { handle, text } => match self.channels.get(&handle) {
                Some(task) => task.send(text),
                None => tracing::debug!(%handle, "frame for unknown channel"),
            },
            ClientAction::CloseChannel { handle, code, reason } => {
                if let Some(task) = self.channels.get(&handle) {
                    task.close(code, reason);
                }
            },
            ClientAction::AbortChannel { handle } => {
                if let Some(task) = self.channels.remove(&handle) {
                    task.abort();
                }
            },
            ClientAction::FetchHistory { request, url } => {
                let http = self.http.clone();
                let outcomes = self.outcomes_tx.clone();
                tokio::spawn(async move {
                    let result = http.get(&url).await;
                    let _ = outcomes.send(ClientEvent::HistoryFetched { request, result });
                });
            },
            ClientAction::PostCompute { request, url, body } => {
                let http = self.http.clone();
                let outcomes = self.outcomes_tx.clone();
                tokio::spawn(async move {
                    let result = http.post_json(&url, body).await;
                    let _ = outcomes.send(ClientEvent::ComputeCompleted { request, result });
                });
            },
            ClientAction::ConnectionChanged { .. }
            | ClientAction::MessageAppended(_)
            | ClientAction::MessagesReplaced(_)
            | ClientAction::MessageRemoved { .. }
            | ClientAction::TypingChanged { .. }
            | ClientAction::ScrollToBottom => {
                if ui.send(action).is_err() {
                    tracing::debug!("ui receiver dropped");
                }
            },
        }
    }
}
