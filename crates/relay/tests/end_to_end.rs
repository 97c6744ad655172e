//! Two simulated players kept in lockstep through a real relay.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use url::Url;

use couchsync_domain::RoomId;
use couchsync_player::{PlayerEvent, PlayerPort, RelayConnection, SimulatedPlayer};
use couchsync_relay::api::{self, AppState};

async fn spawn_relay() -> (SocketAddr, Arc<AppState>) {
    let state = Arc::new(AppState::new());
    let router = api::router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind relay listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("relay serve failed");
    });
    (addr, state)
}

struct Client {
    player: Arc<SimulatedPlayer>,
    shutdown: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl Client {
    fn start(addr: SocketAddr, room_id: RoomId) -> Self {
        let endpoint: Url = format!("ws://{addr}/ws/{room_id}")
            .parse()
            .expect("endpoint url");
        let (player, player_events): (
            Arc<SimulatedPlayer>,
            tokio::sync::mpsc::UnboundedReceiver<PlayerEvent>,
        ) = SimulatedPlayer::new();
        let shutdown = CancellationToken::new();
        let player_port: Arc<dyn PlayerPort> = player.clone();
        let task = tokio::spawn(
            RelayConnection::new(endpoint, player_port, player_events, shutdown.clone()).run(),
        );
        Self {
            player,
            shutdown,
            task,
        }
    }

    async fn stop(self) {
        self.shutdown.cancel();
        self.task.await.expect("client task panicked");
    }
}

async fn wait_until(what: &str, mut check: impl FnMut() -> bool) {
    for _ in 0..500 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting until {what}");
}

#[tokio::test]
async fn playback_propagates_between_two_clients_without_echo_storms() {
    let (addr, state) = spawn_relay().await;
    let room_id = RoomId::new();
    state.rooms.ensure(room_id).await;

    let alice = Client::start(addr, room_id);
    let bob = Client::start(addr, room_id);

    // wait for both sockets to be registered before driving playback
    for _ in 0..500 {
        if state.rooms.member_count(room_id).await == Some(2) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(state.rooms.member_count(room_id).await, Some(2));
    // let both resync handshakes settle
    tokio::time::sleep(Duration::from_millis(100)).await;

    // alice starts playback; bob follows
    alice.player.play();
    wait_until("bob is playing", || bob.player.is_playing()).await;

    // bob pauses; alice follows
    bob.player.pause();
    wait_until("alice is paused", || !alice.player.is_playing()).await;

    // no echo storm: both sides stay settled
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!alice.player.is_playing());
    assert!(!bob.player.is_playing());

    alice.stop().await;
    bob.stop().await;
}
