// src/models/exercise.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::config::{MAX_OPTIONS, MIN_OPTIONS, XP_VALUES};

/// Represents the 'exercises' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,

    pub name: String,

    /// Question body. Plain text mixed with delimited math markup.
    pub question: String,

    /// Ordered answer options, stored as a JSON array.
    pub options: Json<Vec<String>>,

    /// Parallel to `options`: `true` marks a correct option.
    pub correct_options: Json<Vec<bool>>,

    pub hint: Option<String>,

    /// XP granted for the first correct answer.
    pub xp_value: i32,

    pub created_at: chrono::DateTime<chrono::Utc>,

    /// Author. `None` once the author's account is removed.
    pub created_by: Option<i64>,
}

/// DTO for sending an exercise to the client.
///
/// Carries nothing derived from the answer key, not even how many options
/// are correct.
#[derive(Debug, Serialize)]
pub struct PublicExercise {
    pub id: i64,
    pub name: String,
    pub question: String,
    pub options: Vec<String>,
    pub hint: Option<String>,
    pub xp_value: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub created_by: Option<i64>,
}

impl From<Exercise> for PublicExercise {
    fn from(exercise: Exercise) -> Self {
        Self {
            id: exercise.id,
            name: exercise.name,
            question: exercise.question,
            options: exercise.options.0,
            hint: exercise.hint,
            xp_value: exercise.xp_value,
            created_at: exercise.created_at,
            created_by: exercise.created_by,
        }
    }
}

/// Query parameters for listing exercises.
#[derive(Debug, Deserialize)]
pub struct ExerciseListParams {
    pub created_by: Option<i64>,
    pub limit: Option<i64>,
}

/// DTO for publishing a new exercise.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_answer_key))]
pub struct CreateExerciseRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    pub correct_options: Vec<bool>,
    #[validate(length(max = 500))]
    pub hint: Option<String>,
    pub xp_value: i32,
}

/// Checks the structural invariants of an answer key.
pub fn check_answer_key(options_len: usize, correct_options: &[bool]) -> Result<(), &'static str> {
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options_len) {
        return Err("option_count_out_of_range");
    }
    if correct_options.len() != options_len {
        return Err("correct_options_length_mismatch");
    }
    if !correct_options.iter().any(|&c| c) {
        return Err("no_correct_option");
    }
    Ok(())
}

fn validate_answer_key(req: &CreateExerciseRequest) -> Result<(), validator::ValidationError> {
    check_answer_key(req.options.len(), &req.correct_options)
        .map_err(validator::ValidationError::new)?;

    if !XP_VALUES.contains(&req.xp_value) {
        return Err(validator::ValidationError::new("invalid_xp_value"));
    }
    Ok(())
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < MIN_OPTIONS || options.len() > MAX_OPTIONS {
        return Err(validator::ValidationError::new("option_count_out_of_range"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_blank"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
