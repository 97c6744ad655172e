//! CouchSync Domain - Core vocabulary types for playback synchronization.
//!
//! This crate contains the types shared by the relay and the player client:
//! room identifiers, the synchronization action vocabulary, and validated
//! playback positions. No transport or serialization logic beyond serde
//! derives lives here.

pub mod error;
pub mod ids;
pub mod playback;

pub use error::DomainError;
pub use ids::{ConnectionId, RoomId};
pub use playback::{PlaybackPosition, SyncAction};
