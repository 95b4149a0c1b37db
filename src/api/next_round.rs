use axum::{extract::State, Json};
use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, NextRoundRequest, NextRoundResponse, Room, RoomStatus, RoundView},
    services::{
        generator,
        lifecycle::{advance_if_due, DueTransition, RoomClock},
    },
};

use super::{require_room, AppState};

fn clock_of(room: &Room) -> RoomClock {
    RoomClock {
        status: room.status(),
        round_number: room.round_number,
        round_started_at: room.current_round_started_at,
        intermission_until: room.intermission_until,
    }
}

/// Point-in-time view of a room for a poll response; performs no writes.
/// Used both for the no-transition case and by race losers after re-reading.
fn snapshot(state: &AppState, room: &Room, now: DateTime<Utc>) -> NextRoundResponse {
    let transition = advance_if_due(
        &clock_of(room),
        now,
        state.config.round_duration_ms,
        state.config.intermission_ms,
        state.config.max_rounds,
    );
    let mut response = NextRoundResponse::status_only(room.status());
    if let DueTransition::Hold { wait_ms } = transition {
        response.wait_ms = wait_ms;
    }
    if room.status() == RoomStatus::Intermission {
        response.intermission_until = room.intermission_until;
    }
    response
}

/// POST /api/game24/next-round
///
/// Idempotent "advance if due": timed transitions are pulled by whichever
/// client polls first, applied via conditional updates keyed on the expected
/// prior state. A poll that loses the race reports the fresh state instead of
/// failing.
pub async fn next_round(
    State(state): State<AppState>,
    Json(req): Json<NextRoundRequest>,
) -> Result<Json<ApiResponse<NextRoundResponse>>> {
    let room = require_room(&state, &req.pin).await?;
    let pin = &req.pin;
    let now = Utc::now();

    let transition = advance_if_due(
        &clock_of(&room),
        now,
        state.config.round_duration_ms,
        state.config.intermission_ms,
        state.config.max_rounds,
    );

    let response = match transition {
        DueTransition::Hold { .. } => snapshot(&state, &room, now),

        DueTransition::MissingRoundStart => {
            return Err(AppError::Conflict("Round start missing".to_string()));
        }

        DueTransition::BeginIntermission { until } => {
            let won = state
                .db
                .begin_intermission(pin, room.round_number, until, now)
                .await?;
            if won {
                tracing::debug!(pin = %pin, round = room.round_number, "round ended");
                NextRoundResponse {
                    status: RoomStatus::Intermission,
                    wait_ms: None,
                    intermission_until: Some(until),
                    round: None,
                }
            } else {
                reread(&state, pin, now).await?
            }
        }

        DueTransition::BeginRound { round_number } => {
            let numbers = generator::generate_solvable();
            state
                .db
                .upsert_round(pin, round_number, &numbers, now)
                .await?;

            let won = state
                .db
                .activate_round(
                    pin,
                    RoomStatus::Intermission.as_str(),
                    room.round_number,
                    round_number,
                    now,
                )
                .await?;
            if won {
                tracing::debug!(pin = %pin, round = round_number, "round started");
                // Report the stored row: a racing poller's upsert may have
                // won with different numbers.
                let round = state
                    .db
                    .get_round(pin, round_number)
                    .await?
                    .map(RoundView::from);
                NextRoundResponse {
                    status: RoomStatus::Active,
                    wait_ms: None,
                    intermission_until: None,
                    round,
                }
            } else {
                reread(&state, pin, now).await?
            }
        }

        DueTransition::Finish => {
            // Either this poll or a concurrent one flips the room; the
            // outcome is the same.
            state.db.finish_room(pin, room.round_number, now).await?;
            tracing::info!(pin = %pin, "game finished");
            NextRoundResponse::status_only(RoomStatus::Finished)
        }
    };

    Ok(Json(ApiResponse::success(response)))
}

async fn reread(
    state: &AppState,
    pin: &str,
    now: DateTime<Utc>,
) -> Result<NextRoundResponse> {
    let room = state
        .db
        .get_room(pin)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;
    Ok(snapshot(state, &room, now))
}
