//! Test doubles for the player port.

use std::sync::Mutex;

use couchsync_domain::PlaybackPosition;

use super::PlayerPort;

/// Everything a [`RecordingPlayer`] saw, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    SeekTo { secs: f64, allow_seek_ahead: bool },
    Play,
    Pause,
}

/// A player double that records control calls and reports a scripted clock.
///
/// Unlike the mockall mock this needs no expectations up front, which keeps
/// state-machine tests focused on the sequence of effects.
pub struct RecordingPlayer {
    calls: Mutex<Vec<PlayerCall>>,
    now: Mutex<f64>,
}

impl RecordingPlayer {
    pub fn at(secs: f64) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            now: Mutex::new(secs),
        }
    }

    pub fn set_time(&self, secs: f64) {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = secs;
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: PlayerCall) {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(call);
    }
}

impl PlayerPort for RecordingPlayer {
    fn current_time(&self) -> PlaybackPosition {
        let secs = *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        PlaybackPosition::try_from(secs).unwrap_or(PlaybackPosition::ZERO)
    }

    fn seek_to(&self, position: PlaybackPosition, allow_seek_ahead: bool) {
        self.record(PlayerCall::SeekTo {
            secs: position.as_secs_f64(),
            allow_seek_ahead,
        });
    }

    fn play(&self) {
        self.record(PlayerCall::Play);
    }

    fn pause(&self) {
        self.record(PlayerCall::Pause);
    }
}
