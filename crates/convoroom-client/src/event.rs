//! Client events and actions.

use convoroom_core::{
    RoomId,
    channel::{ChannelAction, ChannelHandle},
    error::HttpError,
    message::{Message, MessageId},
};
use convoroom_proto::CloseCode;

/// Identifies one request/response call.
///
/// `session` is the room-mount generation the request was issued in. Results
/// for a request the client no longer expects are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId {
    /// Room-mount generation
    pub session: u64,
    /// Sequence number within the generation
    pub seq: u64,
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.session, self.seq)
    }
}

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Executing channel and HTTP actions and reporting their outcomes
/// - Driving time forward via ticks
/// - Forwarding user intents (enter room, send text, scroll)
///
/// Generic over `I` (Instant type) to support both production
/// (`std::time::Instant`) and simulation (virtual time) environments.
#[derive(Debug, Clone)]
pub enum ClientEvent<I = std::time::Instant> {
    /// The local user's display identity is known.
    IdentityResolved {
        /// Display identity
        username: String,
    },

    /// This client just created `room_id`.
    ///
    /// Recorded in the room ledger so the first entry skips history.
    RoomCreated {
        /// Room that was created
        room_id: RoomId,
    },

    /// The user entered a room. Leaves the current room first.
    EnterRoom {
        /// Room to enter
        room_id: RoomId,
    },

    /// The user left the current room.
    LeaveRoom,

    /// Time tick for timers.
    ///
    /// The caller should send ticks periodically (sub-second) so connect
    /// timeouts, keepalives and reconnects fire on time.
    Tick {
        /// Current time from the environment
        now: I,
    },

    /// A channel opened.
    ChannelOpened {
        /// Connection that opened
        handle: ChannelHandle,
    },

    /// A channel closed.
    ChannelClosed {
        /// Connection that closed
        handle: ChannelHandle,
        /// Closure code reported by the transport
        code: CloseCode,
    },

    /// A channel failed without a clean close.
    ChannelFailed {
        /// Connection that failed
        handle: ChannelHandle,
        /// Transport diagnostic
        reason: String,
    },

    /// A text frame arrived on a channel.
    FrameReceived {
        /// Connection the frame arrived on
        handle: ChannelHandle,
        /// Raw frame text
        text: String,
    },

    /// The user submitted text.
    Send {
        /// Text as typed
        text: String,
    },

    /// A history fetch finished.
    HistoryFetched {
        /// Request from the `FetchHistory` action
        request: RequestId,
        /// Response body on 2xx
        result: Result<Vec<u8>, HttpError>,
    },

    /// A compute call finished.
    ComputeCompleted {
        /// Request from the `PostCompute` action
        request: RequestId,
        /// Response body on 2xx
        result: Result<Vec<u8>, HttpError>,
    },

    /// The transcript view scrolled.
    ViewportChanged {
        /// True if the newest message is visible
        at_bottom: bool,
    },
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Open a duplex connection.
    OpenChannel {
        /// Handle to report events under
        handle: ChannelHandle,
        /// Endpoint
        url: String,
    },

    /// Close a duplex connection gracefully.
    CloseChannel {
        /// Connection to close
        handle: ChannelHandle,
        /// Closure code
        code: CloseCode,
        /// Reason text
        reason: String,
    },

    /// Drop a duplex connection without a closing handshake.
    AbortChannel {
        /// Connection to drop
        handle: ChannelHandle,
    },

    /// Write a text frame.
    SendFrame {
        /// Connection to write on
        handle: ChannelHandle,
        /// Frame text
        text: String,
    },

    /// `GET` the room transcript and report it as `HistoryFetched`.
    FetchHistory {
        /// Request id to report the result under
        request: RequestId,
        /// History endpoint
        url: String,
    },

    /// `POST` to the compute endpoint and report it as `ComputeCompleted`.
    PostCompute {
        /// Request id to report the result under
        request: RequestId,
        /// Compute endpoint
        url: String,
        /// JSON request body
        body: String,
    },

    /// The connected indicator changed.
    ConnectionChanged {
        /// New value
        connected: bool,
    },

    /// A message was appended to the transcript.
    MessageAppended(Message),

    /// The whole transcript was replaced.
    MessagesReplaced(Vec<Message>),

    /// A message was withdrawn.
    MessageRemoved {
        /// Withdrawn message
        id: MessageId,
    },

    /// A computed reply started or stopped being awaited.
    TypingChanged {
        /// True while awaiting
        active: bool,
    },

    /// Scroll the transcript view to the newest message.
    ScrollToBottom,
}

impl From<ChannelAction> for ClientAction {
    fn from(action: ChannelAction) -> Self {
        match action {
            ChannelAction::Open { handle, url } => Self::OpenChannel { handle, url },
            ChannelAction::Send { handle, text } => Self::SendFrame { handle, text },
            ChannelAction::Close { handle, code, reason } => {
                Self::CloseChannel { handle, code, reason }
            },
            ChannelAction::Abort { handle } => Self::AbortChannel { handle },
            ChannelAction::ConnectionChanged { connected } => Self::ConnectionChanged { connected },
        }
    }
}
