// src/progress/ledger.rs

use super::{
    retry::{RetryError, RetryPolicy},
    store::{AnswerLedger, StoreError},
};
use crate::models::answer_result::{AnswerResult, NewAnswerResult};

/// Terminal failure of a ledger append.
pub type WriteError = RetryError<StoreError>;

/// Appends one grading attempt to the answer log.
///
/// Transient failures are retried under `policy`; anything else fails on the
/// first attempt. Duplicate rows from an at-least-once retry are harmless
/// because XP is gated separately by the award claim.
pub async fn record_attempt<L>(
    ledger: &L,
    policy: &RetryPolicy,
    exercise_id: i64,
    user_id: i64,
    is_correct: bool,
) -> Result<AnswerResult, WriteError>
where
    L: AnswerLedger + ?Sized,
{
    let attempt = NewAnswerResult {
        exercise_id,
        user_id,
        is_correct,
    };

    let result = policy
        .run(move || ledger.append_answer(attempt), StoreError::is_transient)
        .await;

    match &result {
        Ok(row) => tracing::debug!(
            "Recorded answer {} (exercise {}, user {}, correct: {})",
            row.id,
            exercise_id,
            user_id,
            is_correct
        ),
        Err(e) => tracing::error!(
            "Failed to record answer for exercise {} by user {}: {}",
            exercise_id,
            user_id,
            e
        ),
    }

    result
}
