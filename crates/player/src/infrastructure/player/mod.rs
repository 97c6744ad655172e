//! Simulated player adapter.
//!
//! A wall-clock playback model standing in for a real video widget: position
//! advances while playing, and every actual state transition - including one
//! caused by applying a remote message - emits a [`PlayerEvent`], which is
//! exactly how embedded players behave and what makes echo suppression
//! necessary.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::mpsc;

use couchsync_domain::PlaybackPosition;

use crate::ports::outbound::{PlayerEvent, PlayerPort};

#[derive(Debug)]
struct PlaybackClock {
    playing: bool,
    base_secs: f64,
    resumed_at: Option<Instant>,
}

impl PlaybackClock {
    fn position_secs(&self) -> f64 {
        match self.resumed_at {
            Some(resumed_at) if self.playing => {
                self.base_secs + resumed_at.elapsed().as_secs_f64()
            }
            _ => self.base_secs,
        }
    }
}

/// In-process player used by the CLI binary and integration tests.
pub struct SimulatedPlayer {
    clock: Mutex<PlaybackClock>,
    events: mpsc::UnboundedSender<PlayerEvent>,
}

impl SimulatedPlayer {
    /// Create a paused player at position zero, plus the receiving end of
    /// its state-change stream.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PlayerEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let player = Arc::new(Self {
            clock: Mutex::new(PlaybackClock {
                playing: false,
                base_secs: 0.0,
                resumed_at: None,
            }),
            events,
        });
        (player, rx)
    }

    pub fn is_playing(&self) -> bool {
        self.clock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .playing
    }

    fn emit(&self, event: PlayerEvent) {
        // Receiver gone means the client is shutting down; nothing to do.
        let _ = self.events.send(event);
    }
}

impl PlayerPort for SimulatedPlayer {
    fn current_time(&self) -> PlaybackPosition {
        let secs = self
            .clock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .position_secs();
        PlaybackPosition::try_from(secs).unwrap_or(PlaybackPosition::ZERO)
    }

    fn seek_to(&self, position: PlaybackPosition, _allow_seek_ahead: bool) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        clock.base_secs = position.as_secs_f64();
        if clock.playing {
            clock.resumed_at = Some(Instant::now());
        }
    }

    fn play(&self) {
        let transitioned = {
            let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
            if clock.playing {
                false
            } else {
                clock.playing = true;
                clock.resumed_at = Some(Instant::now());
                true
            }
        };
        if transitioned {
            self.emit(PlayerEvent::Playing);
        }
    }

    fn pause(&self) {
        let transitioned = {
            let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
            if clock.playing {
                clock.base_secs = clock.position_secs();
                clock.resumed_at = None;
                clock.playing = false;
                true
            } else {
                false
            }
        };
        if transitioned {
            self.emit(PlayerEvent::Paused);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(secs: f64) -> PlaybackPosition {
        PlaybackPosition::try_from(secs).expect("valid position")
    }

    #[tokio::test]
    async fn starts_paused_at_zero() {
        let (player, _rx) = SimulatedPlayer::new();
        assert!(!player.is_playing());
        assert_eq!(player.current_time().as_secs_f64(), 0.0);
    }

    #[tokio::test]
    async fn transitions_emit_events_once() {
        let (player, mut rx) = SimulatedPlayer::new();

        player.play();
        player.play(); // no transition, no event
        player.pause();
        player.pause();

        assert_eq!(rx.recv().await, Some(PlayerEvent::Playing));
        assert_eq!(rx.recv().await, Some(PlayerEvent::Paused));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn seek_moves_position_while_paused() {
        let (player, _rx) = SimulatedPlayer::new();
        player.seek_to(pos(90.0), true);
        assert_eq!(player.current_time().as_secs_f64(), 90.0);
    }

    #[tokio::test]
    async fn position_advances_while_playing() {
        let (player, _rx) = SimulatedPlayer::new();
        player.seek_to(pos(10.0), true);
        player.play();
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        let now = player.current_time().as_secs_f64();
        assert!(now >= 10.0, "position went backwards: {now}");

        player.pause();
        let frozen = player.current_time().as_secs_f64();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(player.current_time().as_secs_f64(), frozen);
    }
}
