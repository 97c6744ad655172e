//! CouchSync Relay - fans playback messages out to room members.
//!
//! The relay is deliberately protocol-agnostic: it tracks room membership
//! and forwards text frames verbatim to the other member of the sender's
//! room. Message validation is the consuming client's job.

pub mod api;
pub mod rooms;
