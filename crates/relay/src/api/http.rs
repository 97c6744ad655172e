//! HTTP routes: room creation and room entry.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use couchsync_domain::RoomId;

use crate::rooms::MAX_ROOM_MEMBERS;

use super::AppState;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health))
        .route("/rooms", post(create_room))
        .route("/rooms/{id}", get(enter_room))
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct CreateRoomBody {
    #[serde(rename = "videoURL")]
    video_url: String,
}

#[derive(Debug, Serialize)]
struct CreateRoomResponse {
    pathname: String,
}

/// Mint a room path for a video URL.
///
/// The room itself is registered lazily when the first member enters it.
async fn create_room(
    Json(body): Json<CreateRoomBody>,
) -> Result<Json<CreateRoomResponse>, ApiError> {
    let video_id = extract_video_id(&body.video_url)
        .ok_or_else(|| ApiError::BadRequest("video URL is incorrect".to_string()))?;
    let room_id = RoomId::new();
    tracing::info!(%room_id, video_id, "room path created");
    Ok(Json(CreateRoomResponse {
        pathname: format!("/rooms/{room_id}?videoid={video_id}"),
    }))
}

#[derive(Debug, Serialize)]
struct RoomStatusResponse {
    id: RoomId,
    members: usize,
}

/// Enter (and lazily create) a room.
async fn enter_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RoomStatusResponse>, ApiError> {
    let room_id: RoomId = id
        .parse()
        .map_err(|_| ApiError::BadRequest("room ID is not a valid UUID".to_string()))?;

    if let Some(members) = state.rooms.member_count(room_id).await {
        if members >= MAX_ROOM_MEMBERS {
            return Err(ApiError::BadRequest("room is full".to_string()));
        }
    }

    state.rooms.ensure(room_id).await;
    let members = state.rooms.member_count(room_id).await.unwrap_or(0);
    Ok(Json(RoomStatusResponse {
        id: room_id,
        members,
    }))
}

/// The video id is the segment between the last `/` and the `?` after it.
fn extract_video_id(url: &str) -> Option<&str> {
    let start = url.rfind('/').map_or(0, |i| i + 1);
    let rest = &url[start..];
    let end = rest.find('?')?;
    (end > 0).then_some(&rest[..end])
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::BadRequest(msg) => {
                (axum::http::StatusCode::BAD_REQUEST, msg).into_response()
            }
        }
    }
}
