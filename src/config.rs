use serde::Deserialize;
use std::env;

use crate::constants::{INTERMISSION_MS, MAX_PLAYERS, MAX_ROUNDS, ROUND_DURATION_MS};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Game tunables
    pub round_duration_ms: i64,
    pub intermission_ms: i64,
    pub max_rounds: i32,
    pub max_players: i32,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,

            round_duration_ms: env::var("GAME_ROUND_DURATION_MS")
                .unwrap_or_else(|_| ROUND_DURATION_MS.to_string())
                .parse()?,
            intermission_ms: env::var("GAME_INTERMISSION_MS")
                .unwrap_or_else(|_| INTERMISSION_MS.to_string())
                .parse()?,
            max_rounds: env::var("GAME_MAX_ROUNDS")
                .unwrap_or_else(|_| MAX_ROUNDS.to_string())
                .parse()?,
            max_players: env::var("GAME_MAX_PLAYERS")
                .unwrap_or_else(|_| MAX_PLAYERS.to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.round_duration_ms <= 0 {
            anyhow::bail!("GAME_ROUND_DURATION_MS must be positive");
        }
        if self.intermission_ms <= 0 {
            anyhow::bail!("GAME_INTERMISSION_MS must be positive");
        }
        if self.max_rounds < 1 {
            anyhow::bail!("GAME_MAX_ROUNDS must be at least 1");
        }
        if self.max_players < 2 {
            anyhow::bail!("GAME_MAX_PLAYERS must allow at least 2 players");
        }

        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            database_url: "postgres://localhost/game24".to_string(),
            database_max_connections: 1,
            round_duration_ms: ROUND_DURATION_MS,
            intermission_ms: INTERMISSION_MS,
            max_rounds: MAX_ROUNDS,
            max_players: MAX_PLAYERS,
            cors_allowed_origins: "*".to_string(),
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_database_url() {
        let mut config = base_config();
        config.database_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_durations() {
        let mut config = base_config();
        config.round_duration_ms = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.intermission_ms = -5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_single_player_cap() {
        let mut config = base_config();
        config.max_players = 1;
        assert!(config.validate().is_err());
    }
}
