// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::progress::LevelTier;

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_TEACHER: &str = "teacher";

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'student' or 'teacher'.
    pub role: String,

    /// Cumulative experience points.
    pub xp: i64,

    /// Level derived from `xp`.
    pub level: i32,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// The XP/level pair stored on a user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserProgress {
    pub xp: i64,
    pub level: i32,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self { xp: 0, level: 1 }
    }
}

/// Profile data for the current user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub xp: i64,
    pub level: i32,
    /// Highest level the current table defines.
    pub max_level: i32,
    /// `None` once the top level is reached.
    pub next_level: Option<LevelTier>,
    pub xp_to_next_level: Option<i64>,
    pub answers_count: i64,
    pub correct_answers_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Row of the XP leaderboard.
#[derive(Debug, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub username: String,
    pub xp: i64,
    pub level: i32,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    /// 'student' (default) or 'teacher'.
    #[validate(custom(function = validate_role))]
    pub role: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

fn validate_role(role: &str) -> Result<(), validator::ValidationError> {
    if role == ROLE_STUDENT || role == ROLE_TEACHER {
        Ok(())
    } else {
        Err(validator::ValidationError::new("unknown_role"))
    }
}
