//! Relay endpoint derivation.
//!
//! The room page URL is the single piece of client configuration; everything
//! about the relay endpoint is derived from it: secure pages speak `wss`,
//! plain pages `ws`, the host is reused as-is and the room id is the final
//! path segment.

use thiserror::Error;
use url::Url;

use couchsync_domain::RoomId;

#[derive(Debug, Error, PartialEq)]
pub enum EndpointError {
    #[error("unsupported page scheme: {0}")]
    UnsupportedScheme(String),

    #[error("page URL has no host")]
    MissingHost,

    #[error("page URL has no room id segment")]
    MissingRoomId,

    #[error("room id is not a valid UUID: {0}")]
    InvalidRoomId(String),
}

/// Derive the relay WebSocket endpoint from a room page URL.
///
/// `https://host/rooms/{id}?videoid=v` becomes `wss://host/ws/{id}`.
pub fn relay_endpoint(page_url: &Url) -> Result<Url, EndpointError> {
    let scheme = match page_url.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
    };

    if page_url.host_str().is_none() {
        return Err(EndpointError::MissingHost);
    }

    let segment = page_url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .ok_or(EndpointError::MissingRoomId)?;

    let room_id: RoomId = segment
        .parse()
        .map_err(|_| EndpointError::InvalidRoomId(segment.to_string()))?;

    let mut endpoint = page_url.clone();
    endpoint
        .set_scheme(scheme)
        .map_err(|()| EndpointError::UnsupportedScheme(page_url.scheme().to_string()))?;
    endpoint.set_path(&format!("/ws/{room_id}"));
    endpoint.set_query(None);
    endpoint.set_fragment(None);
    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(s: &str) -> Url {
        Url::parse(s).expect("valid test url")
    }

    #[test]
    fn secure_page_yields_wss() {
        let url = page("https://couch.example/rooms/0a8ab44e-77a8-4f1e-b7b1-f3f09a12a3f5?videoid=abc");
        let endpoint = relay_endpoint(&url).expect("derives");
        assert_eq!(
            endpoint.as_str(),
            "wss://couch.example/ws/0a8ab44e-77a8-4f1e-b7b1-f3f09a12a3f5"
        );
    }

    #[test]
    fn plain_page_yields_ws_and_keeps_port() {
        let url = page("http://localhost:3000/rooms/0a8ab44e-77a8-4f1e-b7b1-f3f09a12a3f5");
        let endpoint = relay_endpoint(&url).expect("derives");
        assert_eq!(
            endpoint.as_str(),
            "ws://localhost:3000/ws/0a8ab44e-77a8-4f1e-b7b1-f3f09a12a3f5"
        );
    }

    #[test]
    fn rejects_non_http_schemes() {
        let url = page("ftp://couch.example/rooms/0a8ab44e-77a8-4f1e-b7b1-f3f09a12a3f5");
        assert_eq!(
            relay_endpoint(&url),
            Err(EndpointError::UnsupportedScheme("ftp".to_string()))
        );
    }

    #[test]
    fn rejects_missing_room_segment() {
        assert_eq!(
            relay_endpoint(&page("http://localhost:3000/")),
            Err(EndpointError::MissingRoomId)
        );
        // trailing slash leaves an empty final segment
        assert_eq!(
            relay_endpoint(&page(
                "http://localhost:3000/rooms/0a8ab44e-77a8-4f1e-b7b1-f3f09a12a3f5/"
            )),
            Err(EndpointError::MissingRoomId)
        );
    }

    #[test]
    fn rejects_non_uuid_room_id() {
        assert_eq!(
            relay_endpoint(&page("http://localhost:3000/rooms/not-a-uuid")),
            Err(EndpointError::InvalidRoomId("not-a-uuid".to_string()))
        );
    }
}
