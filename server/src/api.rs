//! Room create/join endpoints and the router that mounts them.

use arena_shared::protocol::{CreateRoomResponse, JoinRoomResponse, PlayerProfile};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;

use crate::room::{JoinError, RoomId};
use crate::ws::{play_handler, AppState};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid Inputs")]
    InvalidInputs,
    #[error("Invalid Request")]
    InvalidRequest,
    #[error("Room is full")]
    RoomFull,
}

impl From<JoinError> for ApiError {
    fn from(e: JoinError) -> Self {
        match e {
            JoinError::RoomNotFound(_) | JoinError::AlreadyStarted => ApiError::InvalidRequest,
            JoinError::RoomFull => ApiError::RoomFull,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinQuery {
    pub room_id: RoomId,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/rooms/create", post(create_room))
        .route("/api/rooms/join", post(join_room))
        .route("/play", get(play_handler))
        .with_state(state)
}

fn parse_profile(body: &[u8]) -> Result<PlayerProfile, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!("Rejecting player profile: {}", e);
        ApiError::InvalidInputs
    })
}

pub async fn create_room(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreateRoomResponse>), ApiError> {
    let profile = parse_profile(&body)?;
    let (room_id, owner) = state.directory.create(profile).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room_id,
            player_id: owner.wire_id(),
        }),
    ))
}

pub async fn join_room(
    State(state): State<AppState>,
    query: Result<Query<JoinQuery>, QueryRejection>,
    body: Bytes,
) -> Result<(StatusCode, Json<JoinRoomResponse>), ApiError> {
    let Ok(Query(query)) = query else {
        return Err(ApiError::InvalidInputs);
    };
    let profile = parse_profile(&body)?;
    let slot = state.directory.join(query.room_id, profile).await.map_err(|e| {
        tracing::warn!("Join to room {} rejected: {}", query.room_id, e);
        ApiError::from(e)
    })?;
    Ok((
        StatusCode::CREATED,
        Json(JoinRoomResponse {
            player_id: slot.wire_id(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_errors_map_to_client_messages() {
        assert_eq!(
            ApiError::from(JoinError::RoomNotFound(9)).to_string(),
            "Invalid Request"
        );
        assert_eq!(
            ApiError::from(JoinError::AlreadyStarted).to_string(),
            "Invalid Request"
        );
        assert_eq!(ApiError::from(JoinError::RoomFull).to_string(), "Room is full");
    }

    #[test]
    fn profile_accepts_capitalized_keys() {
        let profile = parse_profile(br##"{"Name":"ash","Color":"#00ff00"}"##).unwrap();
        assert_eq!(profile.name, "ash");
        assert_eq!(profile.color, "#00ff00");
    }

    #[test]
    fn malformed_profile_is_invalid_input() {
        assert!(matches!(
            parse_profile(b"{\"name\": 3}"),
            Err(ApiError::InvalidInputs)
        ));
    }

    #[test]
    fn errors_are_bad_request() {
        let response = ApiError::RoomFull.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
