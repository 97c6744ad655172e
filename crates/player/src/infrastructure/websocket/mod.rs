//! WebSocket connection to the relay.
//!
//! - `backoff`: reconnection delay math, runtime-agnostic
//! - `client`: the tokio-tungstenite session owner and event loop

mod backoff;
mod client;

pub use backoff::BackoffState;
pub use client::RelayConnection;

// Reconnection constants.
pub const INITIAL_RETRY_DELAY_MS: u64 = 1_000;
pub const MAX_RETRY_DELAY_MS: u64 = 16_000;
pub const RECONNECT_JITTER_MS: u64 = 3_000;
