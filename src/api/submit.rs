use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, RoomStatus, SubmitRequest, SubmitResponse},
    services::{expression, validator},
};

use super::{require_room, require_valid_pin, AppState};

/// POST /api/game24/submit
///
/// Validates and scores one answer attempt. A repeat correct submission from
/// the same player in the same round is accepted with zero additional score
/// rather than rejected, so flaky clients can retry safely.
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<ApiResponse<SubmitResponse>>> {
    require_valid_pin(&req.pin)?;
    if req.player_id.trim().is_empty() || req.expression.trim().is_empty() {
        return Err(AppError::BadRequest(
            "playerId and expression are required".to_string(),
        ));
    }
    // Input validation rejects before any store access.
    if !expression::is_expression_safe(&req.expression) {
        return Err(AppError::InvalidCharacters);
    }

    let room = require_room(&state, &req.pin).await?;
    if room.status() != RoomStatus::Active || room.round_number < 1 {
        return Err(AppError::Conflict("Round is not active".to_string()));
    }

    let player = state
        .db
        .get_player(&req.pin, &req.player_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Player not found".to_string()))?;

    let round = state
        .db
        .get_round(&req.pin, room.round_number)
        .await?
        .ok_or_else(|| AppError::NotFound("Round not found".to_string()))?;

    let now = Utc::now();

    if let Err(rejection) = validator::validate_submission(&req.expression, &round.numbers) {
        // Incorrect attempts that reached this point are still recorded.
        state
            .db
            .insert_submission(
                &req.pin,
                room.round_number,
                &player.player_id,
                &req.expression,
                false,
                0,
                now,
            )
            .await?;
        return Err(rejection);
    }

    let elapsed_ms = room
        .current_round_started_at
        .map(|started| (now - started).num_milliseconds())
        .unwrap_or(state.config.round_duration_ms);
    let score = validator::score_for_elapsed(elapsed_ms, state.config.round_duration_ms);

    // At most one scored row per player per round: duplicates are caught by
    // the precheck or, for near-simultaneous submissions, by the partial
    // unique index rejecting the second insert.
    let previously_scored = state
        .db
        .has_correct_submission(&req.pin, room.round_number, &player.player_id)
        .await?;
    let insert_won = if previously_scored {
        false
    } else {
        state
            .db
            .insert_submission(
                &req.pin,
                room.round_number,
                &player.player_id,
                &req.expression,
                true,
                score,
                now,
            )
            .await?
    };
    let award = validator::settle_award(previously_scored, insert_won, score);

    if award > 0 {
        state
            .db
            .add_score(&req.pin, &player.player_id, award)
            .await?;
        state.db.touch_room(&req.pin, now).await?;

        tracing::debug!(
            pin = %req.pin,
            round = room.round_number,
            player = %player.player_id,
            award,
            "correct submission"
        );
    }

    Ok(Json(ApiResponse::success(SubmitResponse {
        accepted: true,
        score_awarded: award,
    })))
}
