//! One WebSocket connection per channel handle.
//!
//! Each connection runs in its own task and reports open, frames, close and
//! failure back to the session as client events tagged with its handle.

use std::time::{Duration, Instant};

use convoroom_core::{channel::ChannelHandle, env::Environment};
use convoroom_proto::CloseCode;
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::{sync::mpsc, task::AbortHandle};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Message as WsMessage,
        protocol::{CloseFrame, frame::coding::CloseCode as WsCloseCode},
    },
};

use super::SystemEnv;
use crate::event::ClientEvent;

/// How long to wait for the server's close reply after sending ours.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Closure code reported when the peer closes without a status.
const NO_STATUS: CloseCode = CloseCode(1005);

enum Command {
    Send(String),
    Close { code: CloseCode, reason: String },
}

/// Handle to a running connection task.
pub(crate) struct ChannelTask {
    commands: mpsc::UnboundedSender<Command>,
    abort: AbortHandle,
}

impl ChannelTask {
    /// Queue a text frame.
    pub(crate) fn send(&self, text: String) {
        if self.commands.send(Command::Send(text)).is_err() {
            tracing::debug!("send on finished channel task");
        }
    }

    /// Start the closing handshake.
    pub(crate) fn close(&self, code: CloseCode, reason: String) {
        if self.commands.send(Command::Close { code, reason }).is_err() {
            tracing::debug!("close on finished channel task");
        }
    }

    /// Drop the connection immediately. No event is reported.
    pub(crate) fn abort(&self) {
        self.abort.abort();
    }
}

/// Connect to `url` in a new task.
pub(crate) fn spawn(
    env: SystemEnv,
    handle: ChannelHandle,
    url: String,
    events: mpsc::UnboundedSender<ClientEvent<Instant>>,
) -> ChannelTask {
    let (commands, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(env, handle, url, rx, events));
    ChannelTask { commands, abort: task.abort_handle() }
}

async fn run(
    env: SystemEnv,
    handle: ChannelHandle,
    url: String,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<ClientEvent<Instant>>,
) {
    let report = |event: ClientEvent<Instant>| {
        if events.send(event).is_err() {
            tracing::debug!(%handle, "session gone, dropping channel event");
        }
    };

    let socket = match connect_async(url.as_str()).await {
        Ok((socket, _response)) => socket,
        Err(error) => {
            report(ClientEvent::ChannelFailed { handle, reason: error.to_string() });
            return;
        },
    };
    report(ClientEvent::ChannelOpened { handle });

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send(text)) => {
                    if let Err(error) = sink.send(WsMessage::Text(text)).await {
                        report(ClientEvent::ChannelFailed { handle, reason: error.to_string() });
                        return;
                    }
                },
                Some(Command::Close { code, reason }) => {
                    let frame = CloseFrame { code: WsCloseCode::from(code.code()), reason: reason.into() };
                    if let Err(error) = sink.send(WsMessage::Close(Some(frame))).await {
                        tracing::debug!(%handle, %error, "close frame not sent");
                    }
                    let code = await_close_reply(&env, &mut stream).await.unwrap_or(code);
                    report(ClientEvent::ChannelClosed { handle, code });
                    return;
                },
                None => return,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(WsMessage::Text(text))) => report(ClientEvent::FrameReceived { handle, text }),
                Some(Ok(WsMessage::Close(frame))) => {
                    let code = frame.map_or(NO_STATUS, |f| CloseCode(u16::from(f.code)));
                    report(ClientEvent::ChannelClosed { handle, code });
                    return;
                },
                Some(Ok(_)) => {},
                Some(Err(error)) => {
                    report(ClientEvent::ChannelFailed { handle, reason: error.to_string() });
                    return;
                },
                None => {
                    report(ClientEvent::ChannelClosed { handle, code: CloseCode::ABNORMAL });
                    return;
                },
            },
        }
    }
}

/// Read until the server's close frame or the grace period ends.
async fn await_close_reply<E, S>(env: &E, stream: &mut S) -> Option<CloseCode>
where
    E: Environment,
    S: Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let wait = async {
        while let Some(Ok(message)) = stream.next().await {
            if let WsMessage::Close(frame) = message {
                return frame.map(|f| CloseCode(u16::from(f.code)));
            }
        }
        None
    };

    tokio::select! {
        biased;
        code = wait => code,
        () = env.sleep(CLOSE_GRACE) => None,
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;
    use tokio_tungstenite::tungstenite::Error as WsError;

    use super::*;
    use crate::test_support::TestEnv;

    #[tokio::test]
    async fn close_reply_carries_server_code() {
        let env = TestEnv::default();
        let frame = CloseFrame { code: WsCloseCode::from(1001), reason: "bye".into() };
        let mut replies = stream::iter(vec![
            Ok::<_, WsError>(WsMessage::Text("late".into())),
            Ok(WsMessage::Close(Some(frame))),
        ]);

        assert_eq!(await_close_reply(&env, &mut replies).await, Some(CloseCode::GOING_AWAY));
    }

    #[tokio::test]
    async fn silent_server_ends_at_grace_period() {
        let env = TestEnv::default();
        let mut silent = stream::pending::<Result<WsMessage, WsError>>();

        assert_eq!(await_close_reply(&env, &mut silent).await, None);
    }
}
