//! Playback vocabulary: synchronization actions and validated positions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The three actions the synchronization protocol knows about.
///
/// `Play` and `Pause` strictly alternate between peers; `Sync` is the
/// unconditional resynchronization primitive sent on every (re)connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Play,
    Pause,
    Sync,
}

impl SyncAction {
    /// The action a peer is expected to produce next, after this one has
    /// been processed.
    ///
    /// Invariant: `Play` expects `Pause`, `Pause` expects `Play`, and `Sync`
    /// always resets the expectation to `Play`.
    pub fn follows(self) -> SyncAction {
        match self {
            SyncAction::Play => SyncAction::Pause,
            SyncAction::Pause => SyncAction::Play,
            SyncAction::Sync => SyncAction::Play,
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncAction::Play => "play",
            SyncAction::Pause => "pause",
            SyncAction::Sync => "sync",
        };
        write!(f, "{s}")
    }
}

/// A playback position in seconds.
///
/// Always finite and non-negative; construction through `try_from` is the
/// only way to get one from a raw float, so a `PlaybackPosition` never has
/// to be re-validated downstream.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct PlaybackPosition(f64);

impl PlaybackPosition {
    pub const ZERO: PlaybackPosition = PlaybackPosition(0.0);

    pub fn as_secs_f64(self) -> f64 {
        self.0
    }
}

impl From<PlaybackPosition> for f64 {
    fn from(position: PlaybackPosition) -> Self {
        position.0
    }
}

impl TryFrom<f64> for PlaybackPosition {
    type Error = DomainError;

    fn try_from(secs: f64) -> Result<Self, Self::Error> {
        if !secs.is_finite() {
            return Err(DomainError::validation(format!(
                "playback position must be finite, got {secs}"
            )));
        }
        if secs < 0.0 {
            return Err(DomainError::validation(format!(
                "playback position must be non-negative, got {secs}"
            )));
        }
        Ok(Self(secs))
    }
}

impl fmt::Display for PlaybackPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternation_rule() {
        assert_eq!(SyncAction::Play.follows(), SyncAction::Pause);
        assert_eq!(SyncAction::Pause.follows(), SyncAction::Play);
        assert_eq!(SyncAction::Sync.follows(), SyncAction::Play);
    }

    #[test]
    fn action_serializes_lowercase() {
        let json = serde_json::to_string(&SyncAction::Play).expect("serialize");
        assert_eq!(json, "\"play\"");
        let back: SyncAction = serde_json::from_str("\"sync\"").expect("deserialize");
        assert_eq!(back, SyncAction::Sync);
    }

    #[test]
    fn position_accepts_zero_and_positive() {
        assert_eq!(PlaybackPosition::try_from(0.0), Ok(PlaybackPosition::ZERO));
        let pos = PlaybackPosition::try_from(42.5).expect("valid");
        assert_eq!(pos.as_secs_f64(), 42.5);
    }

    #[test]
    fn position_rejects_negative_and_non_finite() {
        assert!(PlaybackPosition::try_from(-0.1).is_err());
        assert!(PlaybackPosition::try_from(f64::NAN).is_err());
        assert!(PlaybackPosition::try_from(f64::INFINITY).is_err());
    }

    #[test]
    fn position_deserialization_enforces_domain() {
        let ok: PlaybackPosition = serde_json::from_str("12.5").expect("valid position");
        assert_eq!(ok.as_secs_f64(), 12.5);
        assert!(serde_json::from_str::<PlaybackPosition>("-3.0").is_err());
    }
}
