pub mod health;
pub mod next_round;
pub mod rooms;
pub mod submit;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::Room;
use crate::utils::validate_room_pin;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
}

/// Pin-format gate shared by every room-scoped handler; malformed pins never
/// reach storage.
pub fn require_valid_pin(pin: &str) -> Result<()> {
    if !validate_room_pin(pin) {
        return Err(AppError::BadRequest("Invalid room PIN".to_string()));
    }
    Ok(())
}

pub async fn require_room(state: &AppState, pin: &str) -> Result<Room> {
    require_valid_pin(pin)?;
    state
        .db
        .get_room(pin)
        .await?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))
}
