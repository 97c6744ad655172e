//! Playback synchronizer.
//!
//! A small state machine owning the expectation gate: the single value that
//! decides which inbound actions are honored and which local player
//! transitions are broadcast. The gate is what breaks the feedback cycle -
//! a transition caused by applying a remote message no longer matches the
//! gate (it was flipped when the message was applied) and is therefore never
//! re-broadcast.
//!
//! This module is deliberately free of any transport or runtime dependency;
//! the connection layer feeds it decoded messages and player events.

use couchsync_domain::SyncAction;
use couchsync_shared::Message;

use crate::ports::outbound::{PlayerEvent, PlayerPort};

/// Outcome of processing an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// Message matched the gate (or was a `sync`) and was applied to the
    /// player.
    Applied(SyncAction),
    /// Message did not match the gate; no player call was made and the gate
    /// is unchanged.
    Ignored,
}

/// The client-side protocol state machine.
///
/// Owns exactly one piece of state: the next action this client is willing
/// to treat as legitimate, as opposed to an echo. `None` until the first
/// connection handshake arms it.
#[derive(Debug, Default)]
pub struct Synchronizer {
    expected: Option<SyncAction>,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The action currently expected next, if any.
    pub fn expected(&self) -> Option<SyncAction> {
        self.expected
    }

    /// Resynchronization handshake, run on every successful connect.
    ///
    /// Pauses local playback, pins the player to its current position and
    /// returns the `sync` announcement to transmit. Arms the gate to expect
    /// `play` - a peer receiving `sync` is expected to respond by eventually
    /// playing.
    pub fn handshake(&mut self, player: &dyn PlayerPort) -> Message {
        player.pause();
        let time = player.current_time();
        player.seek_to(time, true);
        self.expected = Some(SyncAction::Play);
        tracing::debug!(%time, "announcing sync");
        Message::sync(time)
    }

    /// Process one inbound message.
    ///
    /// Accepted iff its action matches the gate or is `sync` (the
    /// unconditional resynchronization primitive). On acceptance the player
    /// is driven accordingly and the gate flips to the complement of the
    /// action just applied.
    pub fn apply_remote(&mut self, msg: &Message, player: &dyn PlayerPort) -> Inbound {
        let accepted = msg.action == SyncAction::Sync || self.expected == Some(msg.action);
        if !accepted {
            tracing::debug!(
                action = %msg.action,
                expected = ?self.expected,
                "ignoring unexpected action"
            );
            return Inbound::Ignored;
        }

        match msg.action {
            SyncAction::Play => {
                player.seek_to(msg.time, true);
                player.play();
            }
            SyncAction::Pause => {
                player.pause();
                player.seek_to(msg.time, true);
            }
            SyncAction::Sync => {
                player.pause();
                player.seek_to(msg.time, true);
            }
        }
        self.expected = Some(msg.action.follows());
        tracing::debug!(action = %msg.action, time = %msg.time, "applied remote action");
        Inbound::Applied(msg.action)
    }

    /// Process one local player transition.
    ///
    /// Returns the message to broadcast, or `None` when the transition is an
    /// echo of an applied remote action (gate mismatch) or a transition the
    /// protocol does not track. Dropped transitions are never queued or
    /// retried.
    pub fn on_player_event(
        &mut self,
        event: PlayerEvent,
        player: &dyn PlayerPort,
    ) -> Option<Message> {
        let action = match event {
            PlayerEvent::Playing => SyncAction::Play,
            PlayerEvent::Paused => SyncAction::Pause,
            PlayerEvent::Buffering | PlayerEvent::Ended => return None,
        };

        if self.expected != Some(action) {
            tracing::trace!(%action, expected = ?self.expected, "suppressing echoed transition");
            return None;
        }

        self.expected = Some(action.follows());
        let time = player.current_time();
        tracing::debug!(%action, %time, "broadcasting local transition");
        Some(Message { action, time })
    }
}
