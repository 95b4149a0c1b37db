use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    constants::PIN_ATTEMPTS,
    error::{AppError, Result},
    models::{
        ApiResponse, CreateRoomRequest, CreateRoomResponse, JoinResponse, RoomActionRequest,
        RoomStateResponse, RoomStatus, RoundView, StartResponse,
    },
    services::generator,
    utils::generate_room_pin,
};

use super::{require_room, AppState};

/// POST /api/game24/rooms
///
/// Creates a room with a fresh 4-digit pin, retrying on pin collision, and
/// seats the host as its first player. The host receives a separate host
/// credential gating the start action.
pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<Json<ApiResponse<CreateRoomResponse>>> {
    let host_name = req.host_name.trim();
    if host_name.is_empty() {
        return Err(AppError::BadRequest("Host name is required".to_string()));
    }

    let host_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let mut pin: Option<String> = None;
    for _ in 0..PIN_ATTEMPTS {
        let candidate = generate_room_pin();
        if state
            .db
            .create_room(&candidate, &host_id, state.config.max_players, now)
            .await?
        {
            pin = Some(candidate);
            break;
        }
    }
    let Some(pin) = pin else {
        return Err(AppError::Internal(
            "Failed to generate unique room PIN".to_string(),
        ));
    };

    let player_id = Uuid::new_v4().to_string();
    if let Err(e) = state.db.insert_player(&pin, &player_id, host_name, now).await {
        // Compensate so a half-created room does not squat on the pin.
        let _ = state.db.delete_room(&pin).await;
        return Err(e);
    }

    let room = state
        .db
        .get_room(&pin)
        .await?
        .ok_or_else(|| AppError::Internal("Room vanished after creation".to_string()))?;

    tracing::info!(pin = %pin, "room created");

    Ok(Json(ApiResponse::success(CreateRoomResponse {
        pin,
        host_id,
        player_id,
        room,
    })))
}

/// GET /api/game24/rooms/{pin}
pub async fn get_room_state(
    State(state): State<AppState>,
    Path(pin): Path<String>,
) -> Result<Json<ApiResponse<RoomStateResponse>>> {
    let room = require_room(&state, &pin).await?;
    let players = state.db.list_players(&pin).await?;

    let round = if room.round_number > 0 {
        state.db.get_round(&pin, room.round_number).await?
    } else {
        None
    };

    Ok(Json(ApiResponse::success(RoomStateResponse {
        room,
        players,
        round,
    })))
}

/// POST /api/game24/rooms/{pin} — join / start / play-again.
pub async fn room_action(
    State(state): State<AppState>,
    Path(pin): Path<String>,
    Json(req): Json<RoomActionRequest>,
) -> Result<Json<ApiResponse<Value>>> {
    let room = require_room(&state, &pin).await?;
    let now = Utc::now();

    match req.action.as_str() {
        "join" => {
            let name = req
                .player_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| AppError::BadRequest("Player name is required".to_string()))?;

            let count = state.db.count_players(&pin).await?;
            if count >= room.max_players as i64 {
                return Err(AppError::RoomFull(room.max_players));
            }

            let player_id = Uuid::new_v4().to_string();
            state.db.insert_player(&pin, &player_id, name, now).await?;

            // A hostless room adopts its first joiner as host.
            if room.host_id.is_none() {
                state.db.set_room_host(&pin, &player_id, now).await?;
            } else {
                state.db.touch_room(&pin, now).await?;
            }

            // Counted after the insert so concurrent joiners do not report
            // the same seat.
            let position = state.db.count_players(&pin).await?;

            let body = serde_json::to_value(JoinResponse { player_id, position })
                .map_err(|e| AppError::Internal(e.to_string()))?;
            Ok(Json(ApiResponse::success(body)))
        }

        "start" => {
            let host_id = req
                .host_id
                .as_deref()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| AppError::BadRequest("hostId is required".to_string()))?;
            if room.host_id.as_deref() != Some(host_id) {
                return Err(AppError::Forbidden(
                    "Only the host can start the game".to_string(),
                ));
            }
            if room.status() != RoomStatus::Waiting {
                return Err(AppError::Conflict(
                    "Game has already started".to_string(),
                ));
            }

            let count = state.db.count_players(&pin).await?;
            if count < 2 {
                return Err(AppError::BadRequest(
                    "Need at least 2 players to start".to_string(),
                ));
            }

            // Clear any leftovers from a previous game in this room.
            state.db.delete_submissions(&pin).await?;
            state.db.delete_rounds(&pin).await?;
            state.db.reset_scores(&pin).await?;

            let numbers = generator::generate_solvable();
            state.db.upsert_round(&pin, 1, &numbers, now).await?;

            let started = state
                .db
                .activate_round(&pin, RoomStatus::Waiting.as_str(), 0, 1, now)
                .await?;
            if !started {
                return Err(AppError::Conflict(
                    "Room state changed; re-fetch and retry".to_string(),
                ));
            }

            tracing::info!(pin = %pin, "game started");

            let body = serde_json::to_value(StartResponse {
                round: RoundView {
                    round_number: 1,
                    numbers: numbers.to_vec(),
                    started_at: now,
                },
            })
            .map_err(|e| AppError::Internal(e.to_string()))?;
            Ok(Json(ApiResponse::success(body)))
        }

        "play-again" => {
            let player_id = req
                .player_id
                .as_deref()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| AppError::BadRequest("playerId is required".to_string()))?;

            if room.status() != RoomStatus::Finished {
                return Err(AppError::Conflict(
                    "Play again is only available after the game finishes".to_string(),
                ));
            }

            let player = state
                .db
                .get_player(&pin, player_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Player not found".to_string()))?;

            // The reset flips the room out of finished before any cleanup,
            // so a concurrent reset that loses the flip changes nothing.
            let reset = state
                .db
                .reset_room_for_replay(&pin, player_id, &player.name, now)
                .await?;
            if !reset {
                return Err(AppError::Conflict(
                    "Room was already reset by another player".to_string(),
                ));
            }

            let body = serde_json::json!({
                "pin": pin,
                "hostId": player_id,
                "playerId": player_id,
            });
            Ok(Json(ApiResponse::success(body)))
        }

        _ => Err(AppError::BadRequest("Invalid action".to_string())),
    }
}
