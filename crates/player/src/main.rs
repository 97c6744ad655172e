//! CouchSync Player - headless client entry point.
//!
//! Connects a simulated local player to a relay room and mirrors playback
//! both ways. Drive it from stdin; run two instances against the same room
//! to watch them stay in lockstep.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use couchsync_domain::PlaybackPosition;
use couchsync_player::{relay_endpoint, PlayerPort, RelayConnection, SimulatedPlayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "couchsync_player=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CouchSync Player");

    // The room page URL is the only required configuration. Without it
    // there is no player to attach to, which is a degraded startup: log and
    // exit without ever attempting a connection.
    let page_url = match std::env::var("COUCHSYNC_ROOM_URL") {
        Ok(raw) => match raw.parse::<Url>() {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "COUCHSYNC_ROOM_URL is not a valid URL; not connecting");
                anyhow::bail!("invalid COUCHSYNC_ROOM_URL: {e}");
            }
        },
        Err(_) => {
            tracing::error!("COUCHSYNC_ROOM_URL is not set; not connecting");
            anyhow::bail!(
                "COUCHSYNC_ROOM_URL is required (e.g. http://localhost:3000/rooms/<uuid>)"
            );
        }
    };
    let endpoint = relay_endpoint(&page_url)?;
    tracing::info!(%endpoint, "derived relay endpoint");

    let (player, player_events) = SimulatedPlayer::new();
    let shutdown = CancellationToken::new();

    let player_port: Arc<dyn PlayerPort> = player.clone();
    let connection =
        RelayConnection::new(endpoint, player_port, player_events, shutdown.clone());
    let connection_task = tokio::spawn(connection.run());

    run_console(&player, &shutdown).await?;

    shutdown.cancel();
    let _ = connection_task.await;
    Ok(())
}

/// Minimal stdin console driving the simulated player.
async fn run_console(player: &Arc<SimulatedPlayer>, shutdown: &CancellationToken) -> anyhow::Result<()> {
    println!("commands: play | pause | seek <secs> | status | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // stdin closed
                    return Ok(());
                };
                if !handle_command(player, line.trim()) {
                    return Ok(());
                }
            }
        }
    }
}

/// Returns `false` when the console should exit.
fn handle_command(player: &Arc<SimulatedPlayer>, command: &str) -> bool {
    match command.split_whitespace().collect::<Vec<_>>().as_slice() {
        [] => {}
        ["play"] => player.play(),
        ["pause"] => player.pause(),
        ["seek", secs] => match secs.parse::<f64>().map(PlaybackPosition::try_from) {
            Ok(Ok(position)) => player.seek_to(position, true),
            _ => println!("seek needs a non-negative number of seconds"),
        },
        ["status"] => {
            let state = if player.is_playing() { "playing" } else { "paused" };
            println!("{state} at {}", player.current_time());
        }
        ["quit"] | ["exit"] => return false,
        _ => println!("commands: play | pause | seek <secs> | status | quit"),
    }
    true
}
