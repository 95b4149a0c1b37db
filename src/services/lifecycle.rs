//! Room lifecycle: waiting -> active <-> intermission -> finished.
//!
//! There is no background scheduler. Any client's poll may observe that a
//! deadline has passed and is responsible for performing the transition, so
//! the decision function here is pure and idempotent; callers apply its
//! result only through conditional writes keyed on the expected prior state.

use chrono::{DateTime, Duration, Utc};

use crate::models::RoomStatus;

/// The timing fields a transition decision reads from a room row.
#[derive(Debug, Clone, Copy)]
pub struct RoomClock {
    pub status: RoomStatus,
    pub round_number: i32,
    pub round_started_at: Option<DateTime<Utc>>,
    pub intermission_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueTransition {
    /// No transition due. `wait_ms` carries the time until the next deadline
    /// when one is pending.
    Hold { wait_ms: Option<i64> },
    /// The active round's deadline has passed.
    BeginIntermission { until: DateTime<Utc> },
    /// The intermission has elapsed and more rounds remain.
    BeginRound { round_number: i32 },
    /// The intermission has elapsed and the round cap is reached.
    Finish,
    /// Active room with no round start timestamp; callers surface a conflict.
    MissingRoundStart,
}

pub fn advance_if_due(
    clock: &RoomClock,
    now: DateTime<Utc>,
    round_duration_ms: i64,
    intermission_ms: i64,
    max_rounds: i32,
) -> DueTransition {
    match clock.status {
        RoomStatus::Waiting | RoomStatus::Finished => DueTransition::Hold { wait_ms: None },

        RoomStatus::Active => {
            let Some(started_at) = clock.round_started_at else {
                return DueTransition::MissingRoundStart;
            };
            let elapsed = (now - started_at).num_milliseconds();
            let remaining = round_duration_ms - elapsed;
            if remaining > 0 {
                return DueTransition::Hold {
                    wait_ms: Some(remaining),
                };
            }
            DueTransition::BeginIntermission {
                until: now + Duration::milliseconds(intermission_ms),
            }
        }

        RoomStatus::Intermission => {
            if let Some(until) = clock.intermission_until {
                let wait = (until - now).num_milliseconds();
                if wait > 0 {
                    return DueTransition::Hold {
                        wait_ms: Some(wait),
                    };
                }
            }
            if clock.round_number >= max_rounds {
                DueTransition::Finish
            } else {
                DueTransition::BeginRound {
                    round_number: clock.round_number + 1,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{INTERMISSION_MS, MAX_ROUNDS, ROUND_DURATION_MS};
    use crate::services::validator::score_for_elapsed;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn advance(clock: &RoomClock, now: DateTime<Utc>) -> DueTransition {
        advance_if_due(clock, now, ROUND_DURATION_MS, INTERMISSION_MS, MAX_ROUNDS)
    }

    #[test]
    fn waiting_and_finished_never_self_advance() {
        for status in [RoomStatus::Waiting, RoomStatus::Finished] {
            let clock = RoomClock {
                status,
                round_number: 0,
                round_started_at: None,
                intermission_until: None,
            };
            assert_eq!(
                advance(&clock, at(1_000_000)),
                DueTransition::Hold { wait_ms: None }
            );
        }
    }

    #[test]
    fn active_round_holds_until_the_deadline() {
        let clock = RoomClock {
            status: RoomStatus::Active,
            round_number: 1,
            round_started_at: Some(at(0)),
            intermission_until: None,
        };

        assert_eq!(
            advance(&clock, at(3_000)),
            DueTransition::Hold {
                wait_ms: Some(ROUND_DURATION_MS - 3_000)
            }
        );
        // Exactly at the deadline the transition is due.
        assert_eq!(
            advance(&clock, at(ROUND_DURATION_MS)),
            DueTransition::BeginIntermission {
                until: at(ROUND_DURATION_MS + INTERMISSION_MS)
            }
        );
    }

    #[test]
    fn active_without_start_timestamp_is_flagged() {
        let clock = RoomClock {
            status: RoomStatus::Active,
            round_number: 1,
            round_started_at: None,
            intermission_until: None,
        };
        assert_eq!(advance(&clock, at(0)), DueTransition::MissingRoundStart);
    }

    #[test]
    fn intermission_holds_then_starts_the_next_round() {
        let clock = RoomClock {
            status: RoomStatus::Intermission,
            round_number: 3,
            round_started_at: None,
            intermission_until: Some(at(5_000)),
        };

        assert_eq!(
            advance(&clock, at(2_000)),
            DueTransition::Hold {
                wait_ms: Some(3_000)
            }
        );
        assert_eq!(
            advance(&clock, at(5_000)),
            DueTransition::BeginRound { round_number: 4 }
        );
    }

    #[test]
    fn intermission_without_deadline_is_immediately_due() {
        let clock = RoomClock {
            status: RoomStatus::Intermission,
            round_number: 1,
            round_started_at: None,
            intermission_until: None,
        };
        assert_eq!(
            advance(&clock, at(0)),
            DueTransition::BeginRound { round_number: 2 }
        );
    }

    #[test]
    fn round_cap_finishes_the_game() {
        let clock = RoomClock {
            status: RoomStatus::Intermission,
            round_number: MAX_ROUNDS,
            round_started_at: None,
            intermission_until: Some(at(0)),
        };
        assert_eq!(advance(&clock, at(1)), DueTransition::Finish);
    }

    #[test]
    fn decision_is_idempotent() {
        let clock = RoomClock {
            status: RoomStatus::Active,
            round_number: 2,
            round_started_at: Some(at(0)),
            intermission_until: None,
        };
        let first = advance(&clock, at(ROUND_DURATION_MS + 400));
        let second = advance(&clock, at(ROUND_DURATION_MS + 400));
        assert_eq!(first, second);
    }

    #[test]
    fn full_game_walkthrough() {
        // Round 1 begins at t=0; player A answers correctly at 3s of a 15s
        // round for 800 points; polls then drive the room through every
        // remaining round to finished.
        assert_eq!(score_for_elapsed(3_000, ROUND_DURATION_MS), 800);

        let mut clock = RoomClock {
            status: RoomStatus::Active,
            round_number: 1,
            round_started_at: Some(at(0)),
            intermission_until: None,
        };
        let mut now = at(0);
        let mut rounds_played = 1;

        loop {
            match advance(&clock, now) {
                DueTransition::Hold { wait_ms } => {
                    now = now + Duration::milliseconds(wait_ms.unwrap_or(1));
                }
                DueTransition::BeginIntermission { until } => {
                    clock.status = RoomStatus::Intermission;
                    clock.round_started_at = None;
                    clock.intermission_until = Some(until);
                }
                DueTransition::BeginRound { round_number } => {
                    clock.status = RoomStatus::Active;
                    clock.round_number = round_number;
                    clock.round_started_at = Some(now);
                    clock.intermission_until = None;
                    rounds_played += 1;
                }
                DueTransition::Finish => {
                    clock.status = RoomStatus::Finished;
                    break;
                }
                DueTransition::MissingRoundStart => panic!("corrupt clock"),
            }
        }

        assert_eq!(rounds_played, MAX_ROUNDS);
        assert_eq!(clock.status, RoomStatus::Finished);
        // Terminal: further polls change nothing.
        assert_eq!(
            advance(&clock, now + Duration::milliseconds(60_000)),
            DueTransition::Hold { wait_ms: None }
        );
    }
}
