//! CouchSync Shared - wire protocol between relay and player clients.
//!
//! This crate contains the single message type exchanged over the WebSocket
//! connection, plus its text encoding. Both sides speak the same `Message`;
//! the relay itself never decodes it (fan-out is verbatim), so this crate is
//! consumed primarily by clients and by tests.
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - only serde, serde_json, and thiserror
//! 2. **No business logic** - pure data types and serialization
//! 3. **Additive evolution** - unknown fields are ignored on decode; any
//!    protocol change must be a new optional field, never a breaking rename

pub mod messages;

pub use messages::{Message, ProtocolError};
