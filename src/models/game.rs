use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ==================== ROOM ====================

/// Room status labels as persisted in `game24_rooms.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Active,
    Intermission,
    Finished,
}

impl RoomStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Intermission => "intermission",
            Self::Finished => "finished",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(Self::Waiting),
            "active" => Some(Self::Active),
            "intermission" => Some(Self::Intermission),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub pin: String,
    pub host_id: Option<String>,
    pub status: String,
    pub round_number: i32,
    pub current_round_started_at: Option<DateTime<Utc>>,
    pub intermission_until: Option<DateTime<Utc>>,
    pub max_players: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Room {
    /// Unknown labels collapse to `waiting`, the pre-game state.
    pub fn status(&self) -> RoomStatus {
        RoomStatus::parse(&self.status).unwrap_or(RoomStatus::Waiting)
    }
}

// ==================== PLAYER ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Player {
    pub id: String,
    pub room_pin: String,
    pub player_id: String,
    pub name: String,
    pub score: i64,
    pub is_connected: bool,
    pub joined_at: DateTime<Utc>,
}

// ==================== ROUND ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Round {
    pub id: String,
    pub room_pin: String,
    pub round_number: i32,
    pub numbers: Vec<i64>,
    pub started_at: DateTime<Utc>,
}

/// Round shape embedded in action/poll responses.
#[derive(Debug, Clone, Serialize)]
pub struct RoundView {
    pub round_number: i32,
    pub numbers: Vec<i64>,
    pub started_at: DateTime<Utc>,
}

impl From<Round> for RoundView {
    fn from(round: Round) -> Self {
        Self {
            round_number: round.round_number,
            numbers: round.numbers,
            started_at: round.started_at,
        }
    }
}

// ==================== REQUEST / RESPONSE ====================
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub host_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub pin: String,
    pub host_id: String,
    pub player_id: String,
    pub room: Room,
}

#[derive(Debug, Serialize)]
pub struct RoomStateResponse {
    pub room: Room,
    pub players: Vec<Player>,
    pub round: Option<Round>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomActionRequest {
    pub action: String,
    pub player_name: Option<String>,
    pub host_id: Option<String>,
    pub player_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub player_id: String,
    pub position: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub round: RoundView,
}

#[derive(Debug, Deserialize)]
pub struct NextRoundRequest {
    pub pin: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRoundResponse {
    pub status: RoomStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermission_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundView>,
}

impl NextRoundResponse {
    pub fn status_only(status: RoomStatus) -> Self {
        Self {
            status,
            wait_ms: None,
            intermission_until: None,
            round: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub pin: String,
    pub player_id: String,
    pub expression: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub accepted: bool,
    pub score_awarded: i64,
}

// ==================== API RESPONSE ====================
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
