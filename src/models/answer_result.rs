// src/models/answer_result.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::user::UserProgress;

/// Represents the 'answer_results' table in the database.
/// One immutable row per graded attempt.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AnswerResult {
    pub id: i64,
    pub exercise_id: i64,
    pub user_id: i64,
    pub is_correct: bool,
    /// Assigned by the database clock.
    pub answered_at: chrono::DateTime<chrono::Utc>,
}

/// An attempt about to be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAnswerResult {
    pub exercise_id: i64,
    pub user_id: i64,
    pub is_correct: bool,
}

/// DTO for submitting an answer to an exercise.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    /// Indices of the selected options.
    #[validate(length(
        min = 1,
        max = 5,
        message = "Select at least one option."
    ))]
    pub selected: Vec<usize>,
}

/// Response to an answer submission.
///
/// The grading result stands on its own; `xp_error` reports a failed XP
/// update without hiding whether the answer was right.
#[derive(Debug, Serialize)]
pub struct AnswerOutcome {
    pub answer_id: i64,
    pub is_correct: bool,
    pub answered_at: chrono::DateTime<chrono::Utc>,
    pub xp_awarded: i64,
    pub leveled_up: bool,
    pub progress: Option<UserProgress>,
    pub xp_error: Option<String>,
}

/// Joined row for the current user's answer history.
#[derive(Debug, Serialize, FromRow)]
pub struct AnswerHistoryEntry {
    pub id: i64,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub is_correct: bool,
    pub answered_at: chrono::DateTime<chrono::Utc>,
}
