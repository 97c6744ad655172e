//! CouchSync Player - headless synchronization client.
//!
//! The client has two cooperating halves:
//! - [`sync::Synchronizer`] - the playback state machine deciding which
//!   inbound actions are honored and which local transitions are broadcast
//! - [`infrastructure::websocket::RelayConnection`] - owns the transport
//!   session to the relay and replaces it on loss with backoff
//!
//! The actual video player is consumed behind [`ports::outbound::PlayerPort`];
//! adapters (and tests) provide implementations.

pub mod infrastructure;
pub mod ports;
pub mod sync;

pub use infrastructure::endpoint::{relay_endpoint, EndpointError};
pub use infrastructure::player::SimulatedPlayer;
pub use infrastructure::websocket::RelayConnection;
pub use ports::outbound::{PlayerEvent, PlayerPort};
pub use sync::Synchronizer;
