//! Submission validation and time-decayed scoring.

use crate::constants::{MAX_SCORE, TARGET, TOLERANCE};
use crate::error::{AppError, Result};
use crate::services::expression;

/// Ordered checks, each a hard rejection: character allowlist, operand
/// multiset against the round's numbers, arithmetic evaluation, proximity to
/// 24. Returns the evaluated value on acceptance.
pub fn validate_submission(expression: &str, round_numbers: &[i64]) -> Result<f64> {
    if !expression::is_expression_safe(expression) {
        return Err(AppError::InvalidCharacters);
    }

    let used = expression::extract_numbers(expression);
    if !multiset_equals(&used, round_numbers) {
        return Err(AppError::NumbersMismatch);
    }

    let value = expression::evaluate(expression).ok_or(AppError::EvaluationFailed)?;

    if (value - TARGET).abs() > TOLERANCE {
        return Err(AppError::NotTwentyFour);
    }

    Ok(value)
}

/// Equal disregarding order, respecting repeated values.
fn multiset_equals(a: &[i64], b: &[i64]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut sorted_a = a.to_vec();
    let mut sorted_b = b.to_vec();
    sorted_a.sort_unstable();
    sorted_b.sort_unstable();
    sorted_a == sorted_b
}

/// Linear decay from `MAX_SCORE` at the round start to 0 at the deadline.
/// Elapsed time outside `[0, round_duration_ms]` is clamped, so a correct
/// answer at (or past) the deadline is still accepted with score 0.
pub fn score_for_elapsed(elapsed_ms: i64, round_duration_ms: i64) -> i64 {
    let clamped = elapsed_ms.clamp(0, round_duration_ms);
    let remaining_ratio = 1.0 - clamped as f64 / round_duration_ms as f64;
    ((MAX_SCORE as f64 * remaining_ratio).round() as i64).max(0)
}

/// Award for a correct answer, at most once per player per round. A duplicate
/// is accepted with zero score whether it was caught by the precheck
/// (`previously_scored`) or by losing the scored-row insert race
/// (`insert_won` false).
pub fn settle_award(previously_scored: bool, insert_won: bool, score: i64) -> i64 {
    if previously_scored || !insert_won {
        0
    } else {
        score
    }
}
