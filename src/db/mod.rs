use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    config::Config,
    error::Result,
    models::{Player, Room, Round},
};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        // migrations live at the crate root: ./migrations
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ==================== ROOM QUERIES ====================
impl Database {
    /// Returns false on a pin collision so the caller can retry with a fresh
    /// pin; any other failure is an error.
    pub async fn create_room(
        &self,
        pin: &str,
        host_id: &str,
        max_players: i32,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO game24_rooms
                (pin, host_id, status, round_number, max_players,
                 created_at, updated_at, last_activity)
            VALUES ($1, $2, 'waiting', 0, $3, $4, $4, $4)
            ON CONFLICT (pin) DO NOTHING
            "#,
        )
        .bind(pin)
        .bind(host_id)
        .bind(max_players)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_room(&self, pin: &str) -> Result<Option<Room>> {
        let room = sqlx::query_as::<_, Room>("SELECT * FROM game24_rooms WHERE pin = $1")
            .bind(pin)
            .fetch_optional(&self.pool)
            .await?;
        Ok(room)
    }

    pub async fn delete_room(&self, pin: &str) -> Result<()> {
        sqlx::query("DELETE FROM game24_rooms WHERE pin = $1")
            .bind(pin)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn touch_room(&self, pin: &str, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE game24_rooms SET last_activity = $2, updated_at = $2 WHERE pin = $1")
            .bind(pin)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_room_host(&self, pin: &str, host_id: &str, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "UPDATE game24_rooms
             SET host_id = $2, last_activity = $3, updated_at = $3
             WHERE pin = $1",
        )
        .bind(pin)
        .bind(host_id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ==================== CONDITIONAL TRANSITIONS ====================
//
// Timed transitions race between concurrent pollers; every write is keyed on
// the expected prior (status, round_number) so the loser affects zero rows
// and treats the outcome as a no-op.
impl Database {
    pub async fn activate_round(
        &self,
        pin: &str,
        expected_status: &str,
        expected_round: i32,
        new_round: i32,
        started_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE game24_rooms
            SET status = 'active',
                round_number = $4,
                current_round_started_at = $5,
                intermission_until = NULL,
                last_activity = $5,
                updated_at = $5
            WHERE pin = $1 AND status = $2 AND round_number = $3
            "#,
        )
        .bind(pin)
        .bind(expected_status)
        .bind(expected_round)
        .bind(new_round)
        .bind(started_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn begin_intermission(
        &self,
        pin: &str,
        expected_round: i32,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE game24_rooms
            SET status = 'intermission',
                current_round_started_at = NULL,
                intermission_until = $3,
                last_activity = $4,
                updated_at = $4
            WHERE pin = $1 AND status = 'active' AND round_number = $2
            "#,
        )
        .bind(pin)
        .bind(expected_round)
        .bind(until)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn finish_room(
        &self,
        pin: &str,
        expected_round: i32,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE game24_rooms
            SET status = 'finished',
                intermission_until = NULL,
                last_activity = $3,
                updated_at = $3
            WHERE pin = $1 AND status = 'intermission' AND round_number = $2
            "#,
        )
        .bind(pin)
        .bind(expected_round)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Play-again: flip the room back to waiting and rebuild it around the
    /// caller, in one transaction. The flip runs first and is conditional on
    /// the room still being finished, so of two concurrent resets exactly one
    /// performs the cleanup; the loser returns false having written nothing.
    pub async fn reset_room_for_replay(
        &self,
        pin: &str,
        player_id: &str,
        player_name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query(
            r#"
            UPDATE game24_rooms
            SET host_id = $2,
                status = 'waiting',
                round_number = 0,
                current_round_started_at = NULL,
                intermission_until = NULL,
                last_activity = $3,
                updated_at = $3
            WHERE pin = $1 AND status = 'finished'
            "#,
        )
        .bind(pin)
        .bind(player_id)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if flipped == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM game24_submissions WHERE room_pin = $1")
            .bind(pin)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM game24_rounds WHERE room_pin = $1")
            .bind(pin)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM game24_players WHERE room_pin = $1")
            .bind(pin)
            .execute(&mut *tx)
            .await?;

        // Caller is re-admitted as the sole player and new host.
        sqlx::query(
            r#"
            INSERT INTO game24_players
                (id, room_pin, player_id, name, score, is_connected, joined_at)
            VALUES ($1, $2, $3, $4, 0, TRUE, $5)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(pin)
        .bind(player_id)
        .bind(player_name)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

// ==================== PLAYER QUERIES ====================
impl Database {
    pub async fn count_players(&self, pin: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM game24_players WHERE room_pin = $1")
                .bind(pin)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn insert_player(
        &self,
        pin: &str,
        player_id: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO game24_players
                (id, room_pin, player_id, name, score, is_connected, joined_at)
            VALUES ($1, $2, $3, $4, 0, TRUE, $5)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(pin)
        .bind(player_id)
        .bind(name)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_player(&self, pin: &str, player_id: &str) -> Result<Option<Player>> {
        let player = sqlx::query_as::<_, Player>(
            "SELECT * FROM game24_players WHERE room_pin = $1 AND player_id = $2",
        )
        .bind(pin)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(player)
    }

    pub async fn list_players(&self, pin: &str) -> Result<Vec<Player>> {
        let players = sqlx::query_as::<_, Player>(
            "SELECT * FROM game24_players WHERE room_pin = $1 ORDER BY joined_at ASC",
        )
        .bind(pin)
        .fetch_all(&self.pool)
        .await?;
        Ok(players)
    }

    pub async fn reset_scores(&self, pin: &str) -> Result<()> {
        sqlx::query("UPDATE game24_players SET score = 0, is_connected = TRUE WHERE room_pin = $1")
            .bind(pin)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Row-level atomic increment; never read-modify-write, so interleaved
    /// awards all land.
    pub async fn add_score(&self, pin: &str, player_id: &str, award: i64) -> Result<()> {
        sqlx::query(
            "UPDATE game24_players
             SET score = score + $3, is_connected = TRUE
             WHERE room_pin = $1 AND player_id = $2",
        )
        .bind(pin)
        .bind(player_id)
        .bind(award)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ==================== ROUND QUERIES ====================
impl Database {
    /// Upsert keyed on (room_pin, round_number): a duplicate creation attempt
    /// from a racing poller is harmless.
    pub async fn upsert_round(
        &self,
        pin: &str,
        round_number: i32,
        numbers: &[i64],
        started_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO game24_rounds (id, room_pin, round_number, numbers, started_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (room_pin, round_number) DO NOTHING
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(pin)
        .bind(round_number)
        .bind(numbers)
        .bind(started_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_round(&self, pin: &str, round_number: i32) -> Result<Option<Round>> {
        let round = sqlx::query_as::<_, Round>(
            "SELECT * FROM game24_rounds WHERE room_pin = $1 AND round_number = $2",
        )
        .bind(pin)
        .bind(round_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(round)
    }

    pub async fn delete_rounds(&self, pin: &str) -> Result<()> {
        sqlx::query("DELETE FROM game24_rounds WHERE room_pin = $1")
            .bind(pin)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ==================== SUBMISSION QUERIES ====================
impl Database {
    pub async fn has_correct_submission(
        &self,
        pin: &str,
        round_number: i32,
        player_id: &str,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM game24_submissions
                WHERE room_pin = $1
                  AND round_number = $2
                  AND player_id = $3
                  AND is_correct
            )
            "#,
        )
        .bind(pin)
        .bind(round_number)
        .bind(player_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Returns false when the partial unique index on correct submissions
    /// rejects the row: the player already scored this round (the race loser
    /// of two near-simultaneous correct submissions lands here).
    pub async fn insert_submission(
        &self,
        pin: &str,
        round_number: i32,
        player_id: &str,
        expression: &str,
        is_correct: bool,
        score_awarded: i64,
        submitted_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO game24_submissions
                (room_pin, round_number, player_id, expression,
                 is_correct, score_awarded, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(pin)
        .bind(round_number)
        .bind(player_id)
        .bind(expression)
        .bind(is_correct)
        .bind(score_awarded)
        .bind(submitted_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_submissions(&self, pin: &str) -> Result<()> {
        sqlx::query("DELETE FROM game24_submissions WHERE room_pin = $1")
            .bind(pin)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{INTERMISSION_MS, MAX_PLAYERS, MAX_ROUNDS, ROUND_DURATION_MS};

    fn test_config(database_url: &str) -> Config {
        Config {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            database_url: database_url.to_string(),
            database_max_connections: 1,
            round_duration_ms: ROUND_DURATION_MS,
            intermission_ms: INTERMISSION_MS,
            max_rounds: MAX_ROUNDS,
            max_players: MAX_PLAYERS,
            cors_allowed_origins: "*".to_string(),
        }
    }

    #[tokio::test]
    async fn database_new_returns_error_on_invalid_url() {
        let config = test_config("not-a-url");
        let result = Database::new(&config).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore = "needs a running Postgres; set DATABASE_URL"]
    async fn losing_replay_reset_changes_nothing() {
        use crate::models::RoomStatus;
        use crate::utils::generate_room_pin;

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let db = Database::new(&test_config(&url)).await.unwrap();
        db.run_migrations().await.unwrap();

        let now = Utc::now();
        let mut pin = generate_room_pin();
        while !db.create_room(&pin, "host-a", MAX_PLAYERS, now).await.unwrap() {
            pin = generate_room_pin();
        }
        // Post-insert counts are what join reports as a seat position.
        db.insert_player(&pin, "player-a", "Alice", now).await.unwrap();
        assert_eq!(db.count_players(&pin).await.unwrap(), 1);
        db.insert_player(&pin, "player-b", "Bobby", now).await.unwrap();
        assert_eq!(db.count_players(&pin).await.unwrap(), 2);

        sqlx::query("UPDATE game24_rooms SET status = 'finished', round_number = $2 WHERE pin = $1")
            .bind(&pin)
            .bind(MAX_ROUNDS)
            .execute(db.pool())
            .await
            .unwrap();

        // Winner flips finished -> waiting and rebuilds the room around
        // themselves.
        assert!(db
            .reset_room_for_replay(&pin, "player-a", "Alice", now)
            .await
            .unwrap());
        let room = db.get_room(&pin).await.unwrap().unwrap();
        assert_eq!(room.status(), RoomStatus::Waiting);
        assert_eq!(room.host_id.as_deref(), Some("player-a"));
        assert_eq!(db.count_players(&pin).await.unwrap(), 1);

        // A second reset finds the room no longer finished; it must report
        // the conflict without touching the winner's rebuilt room.
        assert!(!db
            .reset_room_for_replay(&pin, "player-b", "Bobby", now)
            .await
            .unwrap());
        let room = db.get_room(&pin).await.unwrap().unwrap();
        assert_eq!(room.status(), RoomStatus::Waiting);
        assert_eq!(room.host_id.as_deref(), Some("player-a"));
        assert_eq!(db.count_players(&pin).await.unwrap(), 1);
        assert!(db.get_player(&pin, "player-a").await.unwrap().is_some());
        assert!(db.get_player(&pin, "player-b").await.unwrap().is_none());

        db.delete_room(&pin).await.unwrap();
    }
}
