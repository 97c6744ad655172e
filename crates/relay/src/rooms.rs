//! Room membership and fan-out.
//!
//! Tracks which connections belong to which room and forwards frames between
//! them. Payloads pass through untouched.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::{mpsc, RwLock};

use couchsync_domain::{ConnectionId, RoomId};

/// A room is a pair of viewers; a third connection is rejected.
pub const MAX_ROOM_MEMBERS: usize = 2;

/// Buffer size for per-connection message channels.
pub const CONNECTION_CHANNEL_BUFFER: usize = 256;

#[derive(Debug, Error, PartialEq)]
pub enum RoomError {
    #[error("room {0} does not exist")]
    NotFound(RoomId),

    #[error("room {0} is full")]
    Full(RoomId),
}

#[derive(Default)]
struct Room {
    members: HashMap<ConnectionId, mpsc::Sender<String>>,
}

/// Manages all rooms and their connected members.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the room if it does not exist yet.
    pub async fn ensure(&self, room_id: RoomId) {
        let mut rooms = self.rooms.write().await;
        rooms.entry(room_id).or_insert_with(|| {
            tracing::debug!(%room_id, "room created");
            Room::default()
        });
    }

    pub async fn exists(&self, room_id: RoomId) -> bool {
        self.rooms.read().await.contains_key(&room_id)
    }

    /// Number of members, or `None` for an unknown room.
    pub async fn member_count(&self, room_id: RoomId) -> Option<usize> {
        self.rooms
            .read()
            .await
            .get(&room_id)
            .map(|room| room.members.len())
    }

    /// Register a connection as a room member.
    pub async fn join(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        sender: mpsc::Sender<String>,
    ) -> Result<(), RoomError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&room_id).ok_or(RoomError::NotFound(room_id))?;
        if room.members.len() >= MAX_ROOM_MEMBERS {
            return Err(RoomError::Full(room_id));
        }
        room.members.insert(connection_id, sender);
        tracing::info!(
            %connection_id,
            %room_id,
            members = room.members.len(),
            "member joined"
        );
        Ok(())
    }

    /// Remove a member; the room itself goes away with its last member.
    pub async fn leave(&self, room_id: RoomId, connection_id: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(&room_id) {
            if room.members.remove(&connection_id).is_some() {
                tracing::info!(%connection_id, %room_id, "member left");
            }
            if room.members.is_empty() {
                rooms.remove(&room_id);
                tracing::debug!(%room_id, "room removed");
            }
        }
    }

    /// Forward a raw frame to every member except the sender.
    ///
    /// Returns the number of members the frame was handed to.
    pub async fn broadcast(
        &self,
        room_id: RoomId,
        sender_id: ConnectionId,
        payload: &str,
    ) -> usize {
        let rooms = self.rooms.read().await;
        let Some(room) = rooms.get(&room_id) else {
            return 0;
        };

        let mut delivered = 0;
        for (member_id, tx) in &room.members {
            if *member_id == sender_id {
                continue;
            }
            match tx.try_send(payload.to_string()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(%member_id, error = %e, "dropping frame for slow or gone member")
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_channel() -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
        mpsc::channel(CONNECTION_CHANNEL_BUFFER)
    }

    #[tokio::test]
    async fn join_requires_an_existing_room() {
        let registry = RoomRegistry::new();
        let room_id = RoomId::new();
        let (tx, _rx) = member_channel();

        let err = registry
            .join(room_id, ConnectionId::new(), tx)
            .await
            .expect_err("unknown room");
        assert_eq!(err, RoomError::NotFound(room_id));
    }

    #[tokio::test]
    async fn third_member_is_rejected() {
        let registry = RoomRegistry::new();
        let room_id = RoomId::new();
        registry.ensure(room_id).await;

        for _ in 0..MAX_ROOM_MEMBERS {
            let (tx, _rx) = member_channel();
            registry
                .join(room_id, ConnectionId::new(), tx)
                .await
                .expect("room has space");
        }

        let (tx, _rx) = member_channel();
        let err = registry
            .join(room_id, ConnectionId::new(), tx)
            .await
            .expect_err("room is at capacity");
        assert_eq!(err, RoomError::Full(room_id));
    }

    #[tokio::test]
    async fn broadcast_excludes_the_sender() {
        let registry = RoomRegistry::new();
        let room_id = RoomId::new();
        registry.ensure(room_id).await;

        let alice = ConnectionId::new();
        let bob = ConnectionId::new();
        let (alice_tx, mut alice_rx) = member_channel();
        let (bob_tx, mut bob_rx) = member_channel();
        registry.join(room_id, alice, alice_tx).await.expect("join");
        registry.join(room_id, bob, bob_tx).await.expect("join");

        let delivered = registry
            .broadcast(room_id, alice, r#"{"action":"play","time":1.0}"#)
            .await;

        assert_eq!(delivered, 1);
        assert_eq!(
            bob_rx.recv().await.as_deref(),
            Some(r#"{"action":"play","time":1.0}"#)
        );
        assert!(alice_rx.try_recv().is_err(), "sender must not hear itself");
    }

    #[tokio::test]
    async fn room_is_removed_with_its_last_member() {
        let registry = RoomRegistry::new();
        let room_id = RoomId::new();
        registry.ensure(room_id).await;

        let alice = ConnectionId::new();
        let bob = ConnectionId::new();
        let (alice_tx, _alice_rx) = member_channel();
        let (bob_tx, _bob_rx) = member_channel();
        registry.join(room_id, alice, alice_tx).await.expect("join");
        registry.join(room_id, bob, bob_tx).await.expect("join");

        registry.leave(room_id, alice).await;
        assert!(registry.exists(room_id).await, "room survives one leave");

        registry.leave(room_id, bob).await;
        assert!(!registry.exists(room_id).await, "empty room is dropped");
    }

    #[tokio::test]
    async fn broadcast_to_unknown_room_delivers_nothing() {
        let registry = RoomRegistry::new();
        assert_eq!(registry.broadcast(RoomId::new(), ConnectionId::new(), "x").await, 0);
    }
}
