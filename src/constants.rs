/// Application constants

// Room / round caps
pub const MAX_PLAYERS: i32 = 20;
pub const MAX_ROUNDS: i32 = 8;

// Timing (milliseconds)
pub const ROUND_DURATION_MS: i64 = 15_000;
pub const INTERMISSION_MS: i64 = 5_000;

// Room pin generation retries before giving up with a 500
pub const PIN_ATTEMPTS: u32 = 8;

// Puzzle generation
pub const GENERATOR_ATTEMPTS: u32 = 80;
pub const FALLBACK_NUMBERS: [i64; 4] = [4, 6, 8, 1];
pub const DIGIT_MIN: i64 = 1;
pub const DIGIT_MAX: i64 = 9;

// Solver / validator target. Tolerance absorbs division round-off.
pub const TARGET: f64 = 24.0;
pub const TOLERANCE: f64 = 1e-3;

// Scoring
pub const MAX_SCORE: i64 = 1000;
