//! The wire message exchanged between room members.
//!
//! One message per WebSocket text frame, no framing beyond that, no
//! compression, no versioning field. Messages carry no sender identity or
//! sequence number - the protocol is stateless per message and relies on the
//! expectation gate on the receiving side.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use couchsync_domain::{PlaybackPosition, SyncAction};

/// Errors produced while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload was not a valid message record (bad JSON, unknown action,
    /// out-of-domain time value).
    #[error("malformed message payload: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// The only wire entity: a playback action and the position it refers to.
///
/// Serialized as a flat JSON record, e.g. `{"action":"play","time":12.5}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub action: SyncAction,
    pub time: PlaybackPosition,
}

impl Message {
    pub fn play(time: PlaybackPosition) -> Self {
        Self {
            action: SyncAction::Play,
            time,
        }
    }

    pub fn pause(time: PlaybackPosition) -> Self {
        Self {
            action: SyncAction::Pause,
            time,
        }
    }

    pub fn sync(time: PlaybackPosition) -> Self {
        Self {
            action: SyncAction::Sync,
            time,
        }
    }

    /// Serialize to the text-frame payload.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Parse a text-frame payload.
    ///
    /// Rejects anything that is not a record with a known `action` and a
    /// finite, non-negative `time`. Unknown extra fields are ignored.
    pub fn decode(payload: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(payload).map_err(ProtocolError::Malformed)
    }
}
