//! Outbound pipeline: typed text to optimistic echo, broadcast and compute
//! call, with rollback on failure.

use convoroom_core::{
    RoomId,
    channel::ChannelManager,
    env::Environment,
    error::HttpError,
    message::{AI_SENDER, Message, MessageId},
};
use convoroom_proto::{ComputeRequest, ComputeResponse, OutboundEnvelope, ProtocolError};

use crate::{
    error::SendError,
    event::{ClientAction, RequestId},
    notice::{Notice, NoticeSink},
    view::RoomView,
};

/// One send waiting on the compute endpoint.
#[derive(Debug, Clone)]
struct InFlight {
    request: RequestId,
    /// `None` when the echo was suppressed as a duplicate
    optimistic: Option<MessageId>,
}

/// A send request as seen by the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Outgoing<'a> {
    /// Local display identity, if resolved
    pub identity: Option<&'a str>,
    /// Current room, if any
    pub room: Option<&'a RoomId>,
    /// Text as typed
    pub text: &'a str,
    /// Id to issue the compute call under
    pub request: RequestId,
    /// Compute endpoint
    pub compute_url: &'a str,
}

/// Turns typed text into an optimistic echo, a peer broadcast and a compute
/// call. At most one send is in flight.
pub struct OutboundPipeline<N: NoticeSink> {
    notices: N,
    in_flight: Option<InFlight>,
}

impl<N: NoticeSink> OutboundPipeline<N> {
    /// Create a pipeline reporting failures to `notices`.
    pub fn new(notices: N) -> Self {
        Self { notices, in_flight: None }
    }

    /// True while a compute call is outstanding.
    pub fn is_sending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a send.
    ///
    /// A silent no-op unless the trimmed text is non-empty, nothing is in
    /// flight, the channel is open, and identity and room are known.
    pub fn send<E: Environment>(
        &mut self,
        env: &E,
        view: &mut RoomView,
        channel: &mut ChannelManager<E::Instant>,
        outgoing: Outgoing<'_>,
    ) -> Result<Vec<ClientAction>, ProtocolError> {
        let (Some(identity), Some(room)) = (outgoing.identity, outgoing.room) else {
            tracing::debug!("send ignored: identity or room unresolved");
            return Ok(Vec::new());
        };
        if outgoing.text.trim().is_empty() || self.in_flight.is_some() || !channel.is_connected() {
            tracing::debug!(
                sending = self.in_flight.is_some(),
                connected = channel.is_connected(),
                "send ignored"
            );
            return Ok(Vec::new());
        }

        let text = outgoing.text;
        let body = ComputeRequest {
            message: text.to_string(),
            room_id: room.clone(),
            username: identity.to_string(),
        }
        .to_json()?;

        let mut actions = Vec::new();

        let message = Message::compose(env, identity, text, env.wall_clock());
        let optimistic = if view.admit(message.clone()) {
            let id = message.id.clone();
            actions.push(ClientAction::MessageAppended(message));
            actions.push(ClientAction::ScrollToBottom);
            Some(id)
        } else {
            None
        };

        let broadcast = OutboundEnvelope::ChatMessage {
            message: text.to_string(),
            room_id: room.clone(),
            username: identity.to_string(),
        };
        if !channel.send(&broadcast) {
            tracing::debug!(%room, "broadcast not delivered");
        }
        actions.extend(channel.take_outgoing().into_iter().map(ClientAction::from));

        actions.push(ClientAction::TypingChanged { active: true });
        actions.push(ClientAction::PostCompute {
            request: outgoing.request,
            url: outgoing.compute_url.to_string(),
            body,
        });

        tracing::debug!(request = %outgoing.request, %room, "send started");
        self.in_flight = Some(InFlight { request: outgoing.request, optimistic });

        Ok(actions)
    }

    /// Apply the outcome of a compute call.
    ///
    /// Results for anything but the in-flight request are discarded.
    pub fn complete<E: Environment>(
        &mut self,
        env: &E,
        view: &mut RoomView,
        request: RequestId,
        result: Result<Vec<u8>, HttpError>,
    ) -> Vec<ClientAction> {
        let in_flight = match self.in_flight.take() {
            Some(in_flight) if in_flight.request == request => in_flight,
            other => {
                self.in_flight = other;
                tracing::debug!(%request, "discarding stale compute result");
                return Vec::new();
            },
        };

        let mut actions = vec![ClientAction::TypingChanged { active: false }];

        let response = result
            .map_err(SendError::from)
            .and_then(|body| ComputeResponse::decode(&body).map_err(SendError::from));

        match response {
            Ok(response) => {
                let Some(reply) = response.reply() else {
                    tracing::debug!(%request, "compute returned no reply");
                    return actions;
                };

                let message = Message::compose(env, AI_SENDER, reply, env.wall_clock());
                if view.admit(message.clone()) {
                    actions.push(ClientAction::MessageAppended(message));
                    actions.push(ClientAction::ScrollToBottom);
                }
            },
            Err(error) => {
                tracing::warn!(%request, %error, "send failed, rolling back");
                if let Some(id) = in_flight.optimistic {
                    if view.rollback(&id).is_some() {
                        actions.push(ClientAction::MessageRemoved { id });
                    }
                }
                self.notices.notify(Notice::send_failed());
            },
        }

        actions
    }

    /// Forget the in-flight send (room exit). Returns true if one was pending.
    pub fn reset(&mut self) -> bool {
        self.in_flight.take().is_some()
    }
}

impl<N: NoticeSink> std::fmt::Debug for OutboundPipeline<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundPipeline").field("in_flight", &self.in_flight).finish_non_exhaustive()
    }
}
