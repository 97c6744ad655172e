//! Relay session ownership and the client event loop.
//!
//! Exactly one live session exists at a time, owned by the loop in
//! [`RelayConnection::run`]; on loss the old stream is dropped before a new
//! connect is attempted, so events from an abandoned session can never reach
//! the synchronizer. Reconnection is an explicit loop driven by a timer, not
//! recursive self-calls.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use couchsync_shared::Message;

use crate::ports::outbound::{PlayerEvent, PlayerPort};
use crate::sync::Synchronizer;

use super::{BackoffState, RECONNECT_JITTER_MS};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;

#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// Transport closed or failed; schedule a reconnect.
    Lost,
    /// Cooperative shutdown; leave the loop for good.
    Shutdown,
}

/// One turn of the session loop.
enum SessionEvent {
    Frame(Option<Result<WsMessage, WsError>>),
    Player(Option<PlayerEvent>),
    Shutdown,
}

/// Owns the WebSocket session to the relay and drives the synchronizer.
pub struct RelayConnection {
    endpoint: Url,
    player: Arc<dyn PlayerPort>,
    player_events: mpsc::UnboundedReceiver<PlayerEvent>,
    synchronizer: Synchronizer,
    backoff: BackoffState,
    shutdown: CancellationToken,
}

impl RelayConnection {
    pub fn new(
        endpoint: Url,
        player: Arc<dyn PlayerPort>,
        player_events: mpsc::UnboundedReceiver<PlayerEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            endpoint,
            player,
            player_events,
            synchronizer: Synchronizer::new(),
            backoff: BackoffState::default(),
            shutdown,
        }
    }

    /// Connect and keep the room in sync until shutdown.
    ///
    /// Connection loss is never terminal; every loss schedules a jittered,
    /// exponentially backed-off reconnect.
    pub async fn run(mut self) {
        loop {
            let attempt = tokio::select! {
                _ = self.shutdown.cancelled() => None,
                attempt = connect_async(self.endpoint.as_str()) => Some(attempt),
            };
            let Some(attempt) = attempt else {
                tracing::info!("shutting down");
                return;
            };

            match attempt {
                Ok((session, _response)) => {
                    tracing::info!(endpoint = %self.endpoint, "connection established");
                    self.backoff.reset();
                    if self.run_session(session).await == SessionEnd::Shutdown {
                        return;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to reach relay");
                }
            }

            if !self.wait_before_reconnect().await {
                return;
            }
        }
    }

    /// Drive one live session until it is lost or shut down.
    async fn run_session(&mut self, session: WsStream) -> SessionEnd {
        let (mut write, mut read) = session.split();

        // Transitions that fired while no session was open were droppable
        // then and stay dropped now.
        while let Ok(event) = self.player_events.try_recv() {
            tracing::error!(?event, "cannot send message - not connected");
        }

        // Resync handshake: pause, pin the position, announce it.
        let hello = self.synchronizer.handshake(self.player.as_ref());
        if !Self::send(&mut write, &hello).await {
            return SessionEnd::Lost;
        }

        loop {
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => SessionEvent::Shutdown,
                frame = read.next() => SessionEvent::Frame(frame),
                event = self.player_events.recv() => SessionEvent::Player(event),
            };

            match event {
                SessionEvent::Shutdown => {
                    tracing::info!("shutting down, closing session");
                    let _ = write.send(WsMessage::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
                SessionEvent::Frame(Some(Ok(WsMessage::Text(text)))) => {
                    self.handle_frame(&text);
                }
                SessionEvent::Frame(Some(Ok(WsMessage::Close(_)))) => {
                    tracing::info!("relay closed the connection");
                    return SessionEnd::Lost;
                }
                // ping/pong/binary frames are not part of the protocol
                SessionEvent::Frame(Some(Ok(_))) => {}
                // errors are logged only; the stream ending is what drives
                // reconnection
                SessionEvent::Frame(Some(Err(e))) => {
                    tracing::error!(error = %e, "transport error");
                }
                SessionEvent::Frame(None) => {
                    tracing::info!("connection lost");
                    return SessionEnd::Lost;
                }
                SessionEvent::Player(Some(event)) => {
                    if let Some(msg) =
                        self.synchronizer.on_player_event(event, self.player.as_ref())
                    {
                        // Fire-and-forget: a failed send is dropped; the
                        // read side decides when the session is over.
                        let _ = Self::send(&mut write, &msg).await;
                    }
                }
                SessionEvent::Player(None) => {
                    tracing::warn!("player event stream ended");
                    return SessionEnd::Shutdown;
                }
            }
        }
    }

    fn handle_frame(&mut self, payload: &str) {
        match Message::decode(payload) {
            Ok(msg) => {
                self.synchronizer.apply_remote(&msg, self.player.as_ref());
            }
            // Malformed payloads are discarded; they never close the session.
            Err(e) => tracing::warn!(error = %e, "discarding malformed payload"),
        }
    }

    async fn send(write: &mut WsSink, msg: &Message) -> bool {
        let payload = match msg.encode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode message");
                return true;
            }
        };
        match write.send(WsMessage::Text(payload)).await {
            Ok(()) => {
                tracing::debug!(action = %msg.action, time = %msg.time, "sent message");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot send message - transport not open");
                false
            }
        }
    }

    /// Sleep out the backoff delay, discarding player events meanwhile.
    ///
    /// Returns `false` on shutdown.
    async fn wait_before_reconnect(&mut self) -> bool {
        let base_delay = self.backoff.next_delay_and_advance();
        let jitter = rand::thread_rng().gen_range(0..RECONNECT_JITTER_MS);
        tracing::info!(
            attempt = self.backoff.attempts(),
            base_delay_ms = base_delay,
            jitter_ms = jitter,
            "scheduling reconnect"
        );

        let sleep = tokio::time::sleep(Duration::from_millis(base_delay + jitter));
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return false,
                () = &mut sleep => return true,
                event = self.player_events.recv() => match event {
                    // No session, so nothing to transmit; drop, never queue.
                    Some(event) => {
                        tracing::error!(?event, "cannot send message - not connected")
                    }
                    None => return false,
                },
            }
        }
    }
}
