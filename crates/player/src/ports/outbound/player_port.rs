//! Player Port - the capability surface of the embedded video player.
//!
//! The widget itself (YouTube iframe, mpv, a test double) lives outside this
//! crate; the synchronizer only ever talks to it through this trait plus a
//! stream of [`PlayerEvent`] notifications delivered over a channel owned by
//! the adapter.

use couchsync_domain::PlaybackPosition;

/// State-change notification from the player.
///
/// Only `Playing` and `Paused` participate in the protocol; the other
/// discriminants exist so adapters can forward their full notification
/// stream and let the synchronizer ignore what it does not care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Playing,
    Paused,
    Buffering,
    Ended,
}

/// Port for controlling the local video player.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PlayerPort: Send + Sync {
    /// Current playback position.
    fn current_time(&self) -> PlaybackPosition;

    /// Seek to an absolute position.
    ///
    /// `allow_seek_ahead` permits seeking into not-yet-buffered media.
    fn seek_to(&self, position: PlaybackPosition, allow_seek_ahead: bool);

    /// Resume playback.
    fn play(&self);

    /// Pause playback.
    fn pause(&self);
}
